use std::path::PathBuf;
use std::time::Duration;

/// One subprocess invocation: which binary to run, with which argument
/// line, where, and for how long. Fixed at construction; executing the
/// same request twice runs two independent child processes.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub program: PathBuf,
    pub args: String,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ExecutionRequest {
    pub fn new(program: impl Into<PathBuf>, args: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: args.into(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Fail the invocation unless the child has exited and its output has
    /// been captured within `limit`. The child is killed on expiry.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

/// Captured output of one finished child process.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    /// Stdout as an ordered sequence of lines.
    pub fn stdout_lines(&self) -> std::str::Lines<'_> {
        self.stdout.lines()
    }

    /// Error text for a failed run: stderr, or stdout when stderr is blank.
    pub fn error_text(&self) -> &str {
        let err = self.stderr.trim();
        if err.is_empty() { self.stdout.trim() } else { err }
    }
}
