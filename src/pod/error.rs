#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid pod phase: {0}")]
    InvalidPhase(String),
}

pub type Result<T> = std::result::Result<T, Error>;
