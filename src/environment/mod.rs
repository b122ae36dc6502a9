//! Environment detection module.
//!
//! Determines whether the program is running inside a Kubernetes cluster or locally.
mod checks;
mod detect;
mod error;

pub use detect::{RuntimeEnvironment, SERVICE_ACCOUNT_DIR, detect_runtime_environment};
pub use error::{Error, Result};
