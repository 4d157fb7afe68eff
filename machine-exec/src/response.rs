use std::time::Duration;

use crate::parse::ParseError;

/// Why a command invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The child process could not be launched at all.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The argument line could not be tokenized into argv.
    #[error("malformed argument line: {line}")]
    Arguments { line: String },

    /// The tool ran and reported failure through its exit code.
    #[error("exited with code {code}: {error_text}")]
    Exit { code: i32, error_text: String },

    /// The deadline passed before the run finished; the child was killed.
    /// Carries whatever stdout had been captured by then in the envelope.
    #[error("timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// Waiting on the spawned child failed.
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited zero but its output did not match the expected shape.
    #[error("unparseable output: {0}")]
    Parse(#[from] ParseError),
}

/// Uniform outcome of one command invocation: the raw stdout text as
/// captured, plus either the parsed payload or the failure.
///
/// A fresh envelope is produced per call and never mutated afterwards.
/// Failed envelopes cannot expose a payload; [`payload`](Self::payload)
/// is `None` whenever [`success`](Self::success) is false.
#[derive(Debug)]
pub struct CommandResponse<T> {
    raw: String,
    outcome: Result<T, ExecError>,
}

impl<T> CommandResponse<T> {
    /// Successful envelope carrying a parsed payload.
    pub fn ok(raw: impl Into<String>, payload: T) -> Self {
        Self {
            raw: raw.into(),
            outcome: Ok(payload),
        }
    }

    /// Failed envelope; `raw` keeps whatever stdout was captured before
    /// the failure, possibly nothing.
    pub fn fail(raw: impl Into<String>, error: ExecError) -> Self {
        Self {
            raw: raw.into(),
            outcome: Err(error),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Raw stdout text exactly as captured, untouched by any parser.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn payload(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&ExecError> {
        self.outcome.as_ref().err()
    }

    /// Rendered failure description; empty for a successful envelope.
    pub fn error_text(&self) -> String {
        self.failure().map(ToString::to_string).unwrap_or_default()
    }

    pub fn into_result(self) -> Result<T, ExecError> {
        self.outcome
    }
}
