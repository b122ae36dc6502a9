#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid leader election config: {0}")]
    InvalidConfig(String),
    #[error("lease lock identity must not be empty")]
    EmptyIdentity,
    #[error("failed to access lease `{lease}`: {source}")]
    Lease {
        lease: String,
        #[source]
        source: kube::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
