use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("empty query")]
    EmptyQuery,

    #[error("cannot plan multiple statements, got: {0}")]
    MultipleStatements(usize),

    #[error("result writer already attached to job")]
    WriterAlreadyAttached,

    #[error("job not finalized")]
    NotFinalized,

    #[error("job already ran")]
    AlreadyRan,

    #[error("job closed")]
    JobClosed,

    #[error("worker node '{0}' is unavailable")]
    WorkerUnavailable(String),

    #[error("unexpected output for {writer}: {output}")]
    UnexpectedOutput {
        writer: &'static str,
        output: &'static str,
    },

    #[error("missing table: {0}")]
    MissingTable(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error(transparent)]
    Parse(#[from] sqlparser::parser::ParserError),

    #[error(transparent)]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = ExecError> = std::result::Result<T, E>;

macro_rules! internal {
    ($($arg:tt)*) => {
        crate::errors::ExecError::Internal(std::format!($($arg)*))
    };
}
pub(crate) use internal;
