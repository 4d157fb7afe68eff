use serde::Serialize;

/// Closed liveness classification for a machine.
///
/// [`classify`](Self::classify) is total: any text that is not exactly
/// `Running` or `Stopped` — including words introduced by future tool
/// versions, like `Saved` or `Paused` — maps to `Unknown` instead of
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningState {
    Running,
    Stopped,
    Unknown,
}

impl RunningState {
    pub fn classify(text: &str) -> Self {
        match text.trim() {
            "Running" => Self::Running,
            "Stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for RunningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Stopped => f.write_str("stopped"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
