//! Concurrent pod status logging.
//!
//! A logging pass turns a list of pods into one status line per pod. Every pod is
//! handled by its own task; the tasks append to a shared log file under a mutex and
//! publish their line on a result channel sized to the number of pods. A separate
//! task waits for all workers and then closes the channel, which is the only signal
//! the draining side waits for.
//!
//! A failed write is reported as a warning. The line is still published on the
//! channel, so the number of delivered lines always equals the number of pods.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use crate::fsutil;
use crate::pod::{PodSnapshot, PodState};

mod error;

pub use error::{Error, Result};

/// Default name of the log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "pod_status.log";

/// Formats the log entry for a single pod.
///
/// # Examples
///
/// ```
/// # use pod_status_logger::logger::format_status;
/// # use pod_status_logger::pod::{PodPhase, PodSnapshot, PodState};
/// let snapshot = PodSnapshot::new(PodState::new("b", "", PodPhase::Pending));
/// assert_eq!(format_status(&snapshot), "Pod Name: b, Node: , Phase: Pending");
/// ```
pub fn format_status(snapshot: &PodSnapshot) -> String {
    let state = snapshot.state();
    format!(
        "Pod Name: {}, Node: {}, Phase: {}",
        state.name, state.node_name, state.phase
    )
}

/// Outcome of a single logging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Every line received on the result channel, in arrival order.
    pub lines: Vec<String>,
    /// Number of lines whose file write failed.
    pub failed_writes: usize,
}

impl PassReport {
    pub fn delivered(&self) -> usize {
        self.lines.len()
    }

    pub fn written(&self) -> usize {
        self.lines.len().saturating_sub(self.failed_writes)
    }
}

/// Appends pod status lines to a log file, one worker per pod.
#[derive(Debug, Clone)]
pub struct ConcurrentLogger {
    path: PathBuf,
}

impl ConcurrentLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs one logging pass over `pods`.
    ///
    /// The log file is opened in append mode for the duration of the pass and closed
    /// once every worker has finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogFile`] if the log file cannot be opened. Failures to write
    /// individual lines do not fail the pass; they are counted in
    /// [`PassReport::failed_writes`].
    pub async fn log_pods(&self, pods: Vec<PodState>) -> Result<PassReport> {
        let file = fsutil::open_append_file(&self.path).await?;
        log::debug!(
            "Logging {} pods to `{}`",
            pods.len(),
            self.path.display()
        );
        Ok(log_to_writer(file, pods).await)
    }
}

/// Runs one logging pass against an arbitrary writer.
///
/// Each line is written with a single `write_all` followed by a flush while the
/// writer lock is held, so lines from different workers never interleave.
pub async fn log_to_writer<W>(writer: W, pods: Vec<PodState>) -> PassReport
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = Arc::new(Mutex::new(writer));
    // Capacity equals the number of producers, so no worker ever waits on `send`.
    let (tx, mut rx) = mpsc::channel::<String>(pods.len().max(1));

    let mut workers = JoinSet::new();
    for pod in pods {
        workers.spawn(log_pod(pod, Arc::clone(&writer), tx.clone()));
    }

    let coordinator = tokio::spawn(async move {
        let mut failed_writes = 0;
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(true) => {}
                Ok(false) => failed_writes += 1,
                Err(err) => log::error!("pod logging worker did not complete: {}", err),
            }
        }
        drop(tx);
        failed_writes
    });

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        println!("{line}");
        lines.push(line);
    }

    let failed_writes = coordinator.await.unwrap_or_else(|err| {
        log::error!("pod logging coordinator did not complete: {}", err);
        0
    });

    if let Err(err) = writer.lock().await.shutdown().await {
        log::warn!("failed to close log file: {}", err);
    }

    PassReport {
        lines,
        failed_writes,
    }
}

/// Logs a single pod and returns whether its line reached the writer.
async fn log_pod<W>(pod: PodState, writer: Arc<Mutex<W>>, tx: mpsc::Sender<String>) -> bool
where
    W: AsyncWrite + Unpin + Send,
{
    let snapshot = PodSnapshot::new(pod);
    let status = format_status(&snapshot);

    let written = {
        let mut writer = writer.lock().await;
        match write_line(&mut *writer, &status).await {
            Ok(()) => {
                log::info!("Logged: {}", status);
                true
            }
            Err(err) => {
                log::warn!(
                    "failed to write status of pod `{}` to log file: {}",
                    snapshot.name(),
                    err
                );
                false
            }
        }
    };

    if tx.send(status).await.is_err() {
        log::error!("status channel closed before pod `{}` was reported", snapshot.name());
    }

    written
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    writer.write_all(buf.as_bytes()).await?;
    writer.flush().await
}
