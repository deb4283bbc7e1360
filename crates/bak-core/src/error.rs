use thiserror::Error;

pub type BakResult<T> = Result<T, BakError>;

#[derive(Debug, Error)]
pub enum BakError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
