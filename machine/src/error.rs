use machine_exec::ExecError;

pub type Result<T> = std::result::Result<T, MachineError>;

#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    #[error("command failed: {0}")]
    Exec(#[from] ExecError),

    #[error("malformed machine url {text:?}: {source}")]
    InvalidUrl {
        text: String,
        source: url::ParseError,
    },
}
