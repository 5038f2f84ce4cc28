//! Local runner implementation
//!
//! Executes a program directly on the host. Isolation is limited to a
//! dedicated working directory, a wall-clock timeout, a combined output cap
//! and the POSIX resource limits in [`ResourceLimits`](super::ResourceLimits).

use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::limits::apply as apply_rlimits;
use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// How long to wait for output pipes to close after the process is gone
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Runner that executes programs as host child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a program to completion, timeout or output overflow
    pub async fn execute(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin_content: Option<&str>,
    ) -> Result<RunOutcome> {
        debug!(
            "Running {:?} in {:?} (time limit {}ms, output cap {} bytes)",
            cmd.to_vec(),
            cmd.work_dir,
            limits.time_ms,
            limits.output_bytes
        );

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(if stdin_content.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        let rlimits = limits.resources.rlimits();
        if !rlimits.is_empty() {
            // SAFETY: the hook only issues setrlimit syscalls on memory captured
            // before fork; it does not allocate or take locks.
            unsafe {
                command.pre_exec(move || apply_rlimits(&rlimits));
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", cmd.program, e);
                return Ok(RunOutcome::spawn_failed(&cmd.program, &e));
            }
        };
        let pid = child.id();

        if let (Some(input), Some(mut stdin)) = (stdin_content, child.stdin.take()) {
            let input = input.to_owned();
            tokio::spawn(async move {
                // The child may exit without reading its input.
                let _ = stdin.write_all(input.as_bytes()).await;
            });
        }

        let budget = Arc::new(OutputBudget::new(limits.output_bytes));
        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));

        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(drain(out, stdout_buf.clone(), budget.clone())));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(drain(err, stderr_buf.clone(), budget.clone())));

        let termination = tokio::select! {
            result = child.wait() => Termination::Exited(result),
            _ = tokio::time::sleep(Duration::from_millis(limits.time_ms)) => Termination::TimedOut,
            _ = budget.exhausted() => Termination::OutputOverflow,
        };

        let status = match termination {
            Termination::Exited(Ok(status)) => {
                // Background children would otherwise outlive the run and hold the pipes open
                kill_group(pid);
                status_from_exit(status)
            }
            Termination::Exited(Err(e)) => {
                terminate(&mut child, pid).await;
                return Err(e).with_context(|| format!("Failed to wait for {}", cmd.program));
            }
            Termination::TimedOut => {
                debug!("{} exceeded {}ms, killing", cmd.program, limits.time_ms);
                terminate(&mut child, pid).await;
                RunStatus::TimedOut
            }
            Termination::OutputOverflow => {
                debug!("{} exceeded output cap, killing", cmd.program);
                terminate(&mut child, pid).await;
                RunStatus::OutputLimitExceeded
            }
        };

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            finish_drain(task).await;
        }

        // Output still buffered in the pipes can overflow after the exit.
        let status = match status {
            RunStatus::Exited(_) | RunStatus::Signaled(_) if budget.is_exhausted() => {
                debug!("{} exited after overflowing its output cap", cmd.program);
                RunStatus::OutputLimitExceeded
            }
            other => other,
        };

        let stdout = take_output(&stdout_buf);
        let mut stderr = take_output(&stderr_buf);

        if status == RunStatus::OutputLimitExceeded {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!(
                "Output limit exceeded ({} bytes)",
                limits.output_bytes
            ));
        }

        Ok(RunOutcome {
            stdout,
            stderr,
            status,
        })
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome> {
        self.execute(cmd, limits, stdin).await
    }
}

enum Termination {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    OutputOverflow,
}

/// Byte budget shared by stdout and stderr of one process
struct OutputBudget {
    remaining: AtomicUsize,
    exhausted: AtomicBool,
    notify: Notify,
}

impl OutputBudget {
    fn new(limit: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(limit),
            exhausted: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Reserve up to `wanted` bytes; returns how many may be kept
    fn take(&self, wanted: usize) -> usize {
        let mut current = self.remaining.load(Ordering::Acquire);
        loop {
            let granted = current.min(wanted);
            match self.remaining.compare_exchange_weak(
                current,
                current - granted,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if granted < wanted {
                        self.exhausted.store(true, Ordering::Release);
                        self.notify.notify_one();
                    }
                    return granted;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }

    async fn exhausted(&self) {
        self.notify.notified().await
    }
}

/// Copy a pipe into `sink` until EOF or until the budget runs out
async fn drain<R>(mut reader: R, sink: Arc<Mutex<Vec<u8>>>, budget: Arc<OutputBudget>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 8192];
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };

        let granted = budget.take(n);
        if granted > 0 {
            sink.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .extend_from_slice(&chunk[..granted]);
        }
        if granted < n {
            return;
        }
    }
}

async fn finish_drain(mut task: JoinHandle<()>) {
    if tokio::time::timeout(PIPE_GRACE, &mut task).await.is_err() {
        warn!("Output pipe still open after the process ended; keeping partial output");
        task.abort();
    }
}

fn take_output(buf: &Mutex<Vec<u8>>) -> String {
    let bytes = std::mem::take(&mut *buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
    String::from_utf8_lossy(&bytes).into_owned()
}

/// SIGKILL every process left in the child's group
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => debug!("killpg({}) failed: {}", pid, e),
    }
}

/// Kill the whole process group, then reap the child
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    let _ = child.start_kill();
    let _ = child.wait().await;
}

fn status_from_exit(status: ExitStatus) -> RunStatus {
    match (status.code(), status.signal()) {
        (Some(code), _) => RunStatus::Exited(code),
        (None, Some(sig)) => RunStatus::Signaled(sig),
        (None, None) => RunStatus::Exited(-1),
    }
}
