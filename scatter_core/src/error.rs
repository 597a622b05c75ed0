use std::io;

/// All failure kinds are fatal: the pipeline aborts at the point of
/// detection and the caller maps the error to a nonzero exit code.
#[derive(thiserror::Error, Debug)]
pub enum ScatterError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("format error: {0}")]
    Format(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ScatterError>;
