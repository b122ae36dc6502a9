use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens the file at the given path for appending, creating it if it does not exist.
///
/// New files are created with mode `0644` on unix.
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened or created.
pub async fn open_append_file(path: impl AsRef<Path>) -> Result<File, FileOpenError> {
    let path = path.as_ref();
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    options.mode(0o644);

    options.open(path).await.map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn test_open_append_file_creates_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("pod_status.log");
        let file = open_append_file(&path).await.expect("should create file");
        let metadata = file.metadata().await.unwrap();
        assert!(metadata.is_file());
        assert_eq!(metadata.len(), 0);
    }

    #[tokio::test]
    async fn test_open_append_file_keeps_existing_content() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("pod_status.log");
        std::fs::write(&path, "first\n").unwrap();

        let mut file = open_append_file(&path).await.unwrap();
        file.write_all(b"second\n").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_open_append_file_error() {
        let result = open_append_file("/definitely/does/not/exist/pod_status.log").await;
        let err = result.unwrap_err();
        assert_eq!(
            err.path,
            PathBuf::from("/definitely/does/not/exist/pod_status.log")
        );
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
