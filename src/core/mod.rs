pub mod languages;
pub mod verdict;
