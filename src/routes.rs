//! HTTP API routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::RunnerConfig;
use crate::core::languages::LanguageRegistry;
use crate::error::{ErrorBody, RequestError};
use crate::jobs::{process_run_job, RunJob};
use crate::runner::Runner;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RunnerConfig>,
    pub languages: Arc<LanguageRegistry>,
    pub runner: Arc<dyn Runner>,
}

impl AppState {
    pub fn new(config: RunnerConfig, languages: LanguageRegistry, runner: Arc<dyn Runner>) -> Self {
        Self {
            config: Arc::new(config),
            languages: Arc::new(languages),
            runner,
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/languages", get(list_languages))
        .route("/run/{lang}", post(run_code))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "code-runner",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_languages(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.languages.supported())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    source: Option<String>,
    #[serde(default)]
    stdin: Option<String>,
    /// Accepted for the caller's bookkeeping; not used for execution
    #[serde(default)]
    problem_id: Option<String>,
}

async fn run_code(
    State(state): State<AppState>,
    Path(lang): Path<String>,
    body: Result<Json<RunRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return RequestError::InvalidBody(rejection.body_text()).into_response(),
    };

    let job = RunJob {
        source: request.source.unwrap_or_default(),
        stdin: request.stdin.unwrap_or_default(),
    };
    if let Err(e) = job.validate(&state.config) {
        return e.into_response();
    }

    let Some(lang_config) = state.languages.get(&lang).cloned() else {
        return RequestError::UnsupportedLanguage(lang).into_response();
    };

    info!(
        "Run request: language={}, problem_id={}",
        lang_config.name,
        request.problem_id.as_deref().unwrap_or("-")
    );

    let config = Arc::clone(&state.config);
    let runner = Arc::clone(&state.runner);
    let handle = tokio::spawn(async move {
        process_run_job(&job, &lang_config, &config, runner.as_ref()).await
    });

    match handle.await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!("Run task aborted: {}", e);
            let body = ErrorBody {
                error: "Failed to execute code".to_string(),
                details: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
