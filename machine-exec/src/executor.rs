use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::args;
use crate::parse::ResponseParser;
use crate::response::{CommandResponse, ExecError};
use crate::types::{ExecutionRequest, RawOutput};

/// Runs one [`ExecutionRequest`] and routes its output through a parser.
///
/// The underlying process is spawned exactly once, with no retry. Each
/// invocation owns its own child and buffers; callers issuing operations
/// concurrently build an independent executor per call.
pub struct ProcessExecutor<P> {
    request: ExecutionRequest,
    parser: P,
}

impl<P: ResponseParser> ProcessExecutor<P> {
    pub fn new(request: ExecutionRequest, parser: P) -> Self {
        Self { request, parser }
    }

    /// Run the child to completion (or deadline) and envelope the outcome.
    ///
    /// Every kind of failure — tokenization, spawn, nonzero exit, timeout,
    /// parse — surfaces through the envelope; this method itself never
    /// fails and never panics on tool misbehavior.
    pub async fn execute(self) -> CommandResponse<P::Output> {
        let raw = match run(&self.request).await {
            Ok(raw) => raw,
            Err(failure) => return CommandResponse::fail(failure.raw, failure.error),
        };

        if raw.exit_code != 0 {
            let code = raw.exit_code;
            let error_text = raw.error_text().to_owned();
            return CommandResponse::fail(raw.stdout, ExecError::Exit { code, error_text });
        }

        match self.parser.parse(&raw) {
            Ok(payload) => CommandResponse::ok(raw.stdout, payload),
            Err(error) => CommandResponse::fail(raw.stdout, ExecError::Parse(error)),
        }
    }
}

/// A run that produced no [`RawOutput`], with whatever stdout was
/// captured before things fell over.
struct RunFailure {
    raw: String,
    error: ExecError,
}

async fn run(request: &ExecutionRequest) -> Result<RawOutput, RunFailure> {
    let program = request.program.display().to_string();

    let Some(argv) = args::split(&request.args) else {
        return Err(RunFailure {
            raw: String::new(),
            error: ExecError::Arguments {
                line: request.args.clone(),
            },
        });
    };

    trace!(program = %program, args = %request.args, "exec");

    let mut command = Command::new(&request.program);
    command
        .args(argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &request.working_dir {
        command.current_dir(dir);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(source) => {
            return Err(RunFailure {
                raw: String::new(),
                error: ExecError::Spawn { program, source },
            });
        }
    };

    // The drains run as their own tasks over shared buffers: a chatty
    // child can never block on a full pipe, and a deadline can stop
    // waiting mid-read without losing what already arrived.
    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = tokio::spawn(drain(child.stdout.take(), Arc::clone(&stdout_buf)));
    let stderr_task = tokio::spawn(drain(child.stderr.take(), Arc::clone(&stderr_buf)));

    let status = match request.timeout {
        None => complete(&mut child, stdout_task, stderr_task).await,
        Some(limit) => {
            let bounded =
                tokio::time::timeout(limit, complete(&mut child, stdout_task, stderr_task));
            match bounded.await {
                Ok(status) => status,
                Err(_elapsed) => {
                    // Kill and reap; descendants that inherited the pipes
                    // are left to the detached drain tasks. Whatever was
                    // captured before expiry rides along in the failure.
                    warn!(program = %program, ?limit, "exec deadline passed, child killed");
                    if let Err(error) = child.kill().await {
                        warn!(error = %error, "failed to kill timed-out child");
                    }
                    return Err(RunFailure {
                        raw: take_text(&stdout_buf),
                        error: ExecError::Timeout { limit },
                    });
                }
            }
        }
    };

    let stdout = take_text(&stdout_buf);
    let stderr = take_text(&stderr_buf);

    match status {
        Ok(status) => {
            let exit_code = match status.code() {
                Some(code) => code,
                None => {
                    #[cfg(unix)]
                    {
                        if let Some(signal) =
                            std::os::unix::process::ExitStatusExt::signal(&status)
                        {
                            warn!(program = %program, signal, "child terminated by signal");
                        }
                    }
                    -1
                }
            };
            debug!(program = %program, exit_code, "exec finished");
            Ok(RawOutput {
                exit_code,
                stdout,
                stderr,
            })
        }
        Err(source) => Err(RunFailure {
            raw: stdout,
            error: ExecError::Wait { program, source },
        }),
    }
}

/// Resolves once the child has exited and both pipes have hit EOF.
///
/// Descendants that inherited the pipes keep this pending past the
/// tool's own exit; a configured deadline bounds the wait.
async fn complete(
    child: &mut Child,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
) -> std::io::Result<std::process::ExitStatus> {
    let status = child.wait().await;
    let _ = stdout_task.await;
    let _ = stderr_task.await;
    status
}

async fn drain<R>(pipe: Option<R>, buf: Arc<Mutex<Vec<u8>>>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else { return };
    let mut chunk = vec![0_u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if let Some(data) = chunk.get(..n) {
                    buf.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(data);
                }
            }
            Err(error) => {
                warn!(error = %error, "draining child pipe failed, output truncated");
                break;
            }
        }
    }
}

fn take_text(buf: &Mutex<Vec<u8>>) -> String {
    let bytes = buf.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::parse::{EnvLines, LogText, SingleLine};

    #[tokio::test]
    async fn echo_round_trip() {
        let request = ExecutionRequest::new("echo", "hello world");
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(resp.success());
        assert_eq!(resp.payload().map(String::as_str), Some("hello world\n"));
        assert_eq!(resp.raw(), "hello world\n");
    }

    #[tokio::test]
    async fn quoted_arguments_are_grouped() {
        let request = ExecutionRequest::new("echo", "--virtualbox-memory \"2048\" m1");
        let resp = ProcessExecutor::new(request, SingleLine).execute().await;
        assert_eq!(
            resp.payload().map(String::as_str),
            Some("--virtualbox-memory 2048 m1")
        );
    }

    #[tokio::test]
    async fn nonzero_exit_fails_with_stderr_text() {
        let request = ExecutionRequest::new("bash", "-c \"echo oops >&2; exit 3\"");
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(!resp.success());
        match resp.failure() {
            Some(ExecError::Exit { code, error_text }) => {
                assert_eq!(*code, 3);
                assert_eq!(error_text, "oops");
            }
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_falls_back_to_stdout_text() {
        let request = ExecutionRequest::new("bash", "-c \"echo fail note; exit 1\"");
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        match resp.failure() {
            Some(ExecError::Exit { error_text, .. }) => assert_eq!(error_text, "fail note"),
            other => panic!("expected exit failure, got {other:?}"),
        }
        // The envelope still carries the captured stdout.
        assert_eq!(resp.raw(), "fail note\n");
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_failure() {
        let request = ExecutionRequest::new("/does/not/exist/machine-tool", "ls");
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Spawn { .. })));
        assert_eq!(resp.raw(), "");
    }

    #[tokio::test]
    async fn unterminated_quote_is_an_argument_failure() {
        let request = ExecutionRequest::new("echo", "create --label \"broken");
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Arguments { .. })));
    }

    #[tokio::test]
    async fn deadline_kills_the_child() {
        let request =
            ExecutionRequest::new("sleep", "5").timeout(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn deadline_bounds_orphans_of_a_killed_child() {
        // Killing the shell at the deadline leaves its forked sleep
        // holding the pipes; the call must still return on time.
        let request = ExecutionRequest::new("bash", "-c \"sleep 5; true\"")
            .timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn deadline_bounds_descendants_left_after_exit() {
        // The tool exits zero immediately, but a backgrounded descendant
        // inherits the pipes and keeps them open long past the deadline.
        let request = ExecutionRequest::new("bash", "-c \"( sleep 5; echo late ) & exit 0\"")
            .timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn timed_out_envelope_keeps_partial_stdout() {
        let request = ExecutionRequest::new("bash", "-c \"echo progress; sleep 5; true\"")
            .timeout(Duration::from_millis(300));
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Timeout { .. })));
        assert_eq!(resp.raw(), "progress\n");
    }

    #[tokio::test]
    async fn signal_death_maps_to_a_nonzero_exit() {
        let request = ExecutionRequest::new("bash", "-c \"kill -9 $$\"");
        let resp = ProcessExecutor::new(request, LogText).execute().await;
        match resp.failure() {
            Some(ExecError::Exit { code, .. }) => assert_eq!(*code, -1),
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_output_fails_single_line_parse() {
        let request = ExecutionRequest::new("true", "");
        let resp = ProcessExecutor::new(request, SingleLine).execute().await;
        assert!(matches!(resp.failure(), Some(ExecError::Parse(_))));
    }

    #[tokio::test]
    async fn env_dump_parses_through_the_pipeline() {
        let request =
            ExecutionRequest::new("bash", "-c \"echo export A=1; echo export B=2\"");
        let resp = ProcessExecutor::new(request, EnvLines).execute().await;
        let vars = resp.into_result().unwrap();
        assert_eq!(vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(vars.get("B").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn working_dir_applies_to_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().canonicalize().unwrap();
        let request = ExecutionRequest::new("pwd", "").working_dir(dir.path());
        let resp = ProcessExecutor::new(request, SingleLine).execute().await;
        assert_eq!(
            resp.payload().map(String::as_str),
            Some(expected.to_string_lossy().as_ref())
        );
    }
}
