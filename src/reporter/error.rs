use crate::{cluster, logger};

/// Errors that abort a single logging pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to enumerate pods: {0}")]
    Enumerate(#[from] cluster::Error),
    #[error(transparent)]
    Log(#[from] logger::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
