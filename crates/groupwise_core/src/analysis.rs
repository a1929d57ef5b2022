//! Directory analysis
//!
//! Lists the image files of a directory and tokenizes them off the calling
//! task. Only the newest request may publish: starting a new analysis
//! cancels the previous one, and a run whose sequence number is no longer
//! current never overwrites the published status.

use crate::cancel::{CancellationToken, Cancelled};
use crate::extension::has_image_extension;
use crate::settings::SAMPLE_FILE_CEILING;
use crate::tokenizer::{FilenameTokenizer, TokenAnalysis};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Analysis cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<Cancelled> for AnalysisError {
    fn from(_: Cancelled) -> Self {
        AnalysisError::Cancelled
    }
}

/// Published state of the newest analysis request
#[derive(Debug, Clone)]
pub enum AnalysisStatus {
    Idle,
    Running { request: u64, directory: PathBuf },
    Ready { request: u64, analysis: Arc<TokenAnalysis> },
    Failed { request: u64, message: String },
}

/// Image filenames directly inside `dir`, sorted, at most `limit`.
///
/// Non-recursive. `cancel` is checked once per directory entry.
pub fn list_image_files(
    dir: &Path,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let metadata = std::fs::metadata(dir).map_err(|source| AnalysisError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(AnalysisError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        cancel.checkpoint()?;
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory walk failed"));
                return Err(AnalysisError::Unreadable {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(err) => {
                // Unreadable single entries are skipped
                warn!(error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if has_image_extension(&name) {
            files.push(name);
        }
    }

    files.sort();
    files.truncate(limit);
    debug!(dir = %dir.display(), count = files.len(), "Listed image files");
    Ok(files)
}

/// List and tokenize `dir` on the current thread
pub fn analyze_directory(
    dir: &Path,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<TokenAnalysis> {
    let files = list_image_files(dir, limit, cancel)?;
    FilenameTokenizer::new()
        .analyze_with_cancel(&files, cancel)
        .ok_or(AnalysisError::Cancelled)
}

/// Cancellable, sequence-guarded background analysis
pub struct AnalysisService {
    sequence: Arc<AtomicU64>,
    current: Mutex<CancellationToken>,
    status_tx: Arc<watch::Sender<AnalysisStatus>>,
    sample_limit: usize,
}

impl AnalysisService {
    pub fn new(sample_limit: usize) -> Self {
        let (status_tx, _) = watch::channel(AnalysisStatus::Idle);
        Self {
            sequence: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(CancellationToken::new()),
            status_tx: Arc::new(status_tx),
            sample_limit: sample_limit.clamp(1, SAMPLE_FILE_CEILING),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status_tx.borrow().clone()
    }

    /// Sequence number of the newest request (0 before the first)
    pub fn current_request(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Cancel whatever is in flight and return to `Idle`
    pub fn cancel(&self) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        self.replace_token(CancellationToken::new()).cancel();
        self.status_tx.send_replace(AnalysisStatus::Idle);
    }

    fn replace_token(&self, next: CancellationToken) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *current, next)
    }

    /// Start analysing `dir`, superseding any earlier request.
    ///
    /// Must be called within a tokio runtime. The handle resolves to the
    /// analysis, or `Cancelled` if a newer request superseded this one.
    pub fn start(&self, dir: impl Into<PathBuf>) -> JoinHandle<Result<Arc<TokenAnalysis>>> {
        let dir = dir.into();
        let request = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let cancel = CancellationToken::new();
        self.replace_token(cancel.clone()).cancel();

        info!(request, dir = %dir.display(), "Starting directory analysis");
        self.status_tx.send_replace(AnalysisStatus::Running {
            request,
            directory: dir.clone(),
        });

        let sequence = self.sequence.clone();
        let status_tx = self.status_tx.clone();
        let limit = self.sample_limit;

        tokio::spawn(async move {
            let worker_cancel = cancel.clone();
            let worker_dir = dir.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                analyze_directory(&worker_dir, limit, &worker_cancel)
            })
            .await
            .unwrap_or_else(|err| {
                Err(AnalysisError::Unreadable {
                    path: dir,
                    source: io::Error::other(err.to_string()),
                })
            });

            if cancel.is_cancelled() {
                debug!(request, "Discarding cancelled analysis");
                return Err(AnalysisError::Cancelled);
            }
            if let Err(err) = &outcome {
                warn!(request, error = %err, "Directory analysis failed");
            }

            let outcome = outcome.map(Arc::new);
            // Compare and publish under the channel lock
            let published = status_tx.send_if_modified(|status| {
                if sequence.load(Ordering::SeqCst) != request {
                    return false;
                }
                *status = match &outcome {
                    Ok(analysis) => AnalysisStatus::Ready {
                        request,
                        analysis: analysis.clone(),
                    },
                    Err(err) => AnalysisStatus::Failed {
                        request,
                        message: err.to_string(),
                    },
                };
                true
            });

            if !published {
                debug!(request, "Discarding superseded analysis");
                return Err(AnalysisError::Cancelled);
            }
            outcome
        })
    }
}

impl Default for AnalysisService {
    fn default() -> Self {
        Self::new(SAMPLE_FILE_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_list_filters_sorts_and_caps() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["b_002_front.jpg", "a_001_rear.PNG", "notes.txt", "c_003_ov.webp"]);
        std::fs::create_dir(temp.path().join("nested.jpg")).unwrap();

        let files = list_image_files(temp.path(), 500, &CancellationToken::new()).unwrap();
        assert_eq!(files, vec!["a_001_rear.PNG", "b_002_front.jpg", "c_003_ov.webp"]);

        let capped = list_image_files(temp.path(), 2, &CancellationToken::new()).unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn test_list_errors() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("one.jpg");
        std::fs::write(&file, b"").unwrap();

        assert!(matches!(
            list_image_files(&file, 10, &CancellationToken::new()),
            Err(AnalysisError::NotADirectory(_))
        ));
        assert!(matches!(
            list_image_files(&temp.path().join("missing"), 10, &CancellationToken::new()),
            Err(AnalysisError::Unreadable { .. })
        ));

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            list_image_files(temp.path(), 10, &cancel),
            Err(AnalysisError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_service_publishes_ready() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["vehicle_001_front.jpg", "vehicle_002_rear.jpg"]);

        let service = AnalysisService::default();
        let analysis = service.start(temp.path()).await.unwrap().unwrap();
        assert_eq!(analysis.file_count(), 2);
        assert!(matches!(service.status(), AnalysisStatus::Ready { request: 1, .. }));
    }

    #[tokio::test]
    async fn test_newer_request_supersedes() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(first.path(), &["a_001_front.jpg"]);
        touch(second.path(), &["b_001_front.jpg", "b_002_front.jpg"]);

        let service = AnalysisService::default();
        let stale = service.start(first.path());
        let fresh = service.start(second.path());

        assert!(matches!(stale.await.unwrap(), Err(AnalysisError::Cancelled)));
        let analysis = fresh.await.unwrap().unwrap();
        assert_eq!(analysis.file_count(), 2);
        match service.status() {
            AnalysisStatus::Ready { request, analysis } => {
                assert_eq!(request, 2);
                assert_eq!(analysis.file_count(), 2);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_is_published() {
        let temp = TempDir::new().unwrap();
        let service = AnalysisService::new(10);
        let result = service.start(temp.path().join("missing")).await.unwrap();
        assert!(matches!(result, Err(AnalysisError::Unreadable { .. })));
        assert!(matches!(service.status(), AnalysisStatus::Failed { request: 1, .. }));
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["a_001_front.jpg"]);

        let service = AnalysisService::default();
        let handle = service.start(temp.path());
        service.cancel();

        assert!(matches!(handle.await.unwrap(), Err(AnalysisError::Cancelled)));
        assert!(matches!(service.status(), AnalysisStatus::Idle));
    }
}
