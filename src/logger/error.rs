use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open log file: {0}")]
    LogFile(#[from] fsutil::FileOpenError),
}

pub type Result<T> = std::result::Result<T, Error>;
