use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

/// Name of the control-plane marker file inside the run's output directory.
/// Its presence (within the freshness window) is the out-of-process stop
/// signal.
pub const STOP_MARKER: &str = ".stop_scan";

const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5);

/// Shared, monotonic stop flag. Settable from a signal handler or by an
/// external process touching the marker file; polled by the scheduler and by
/// every process wait loop.
#[derive(Clone)]
pub struct CancellationController {
    inner: Arc<Inner>,
}

struct Inner {
    stopped: AtomicBool,
    marker: PathBuf,
    freshness: Duration,
}

impl CancellationController {
    pub fn new(out_dir: &Path) -> Self {
        Self::with_freshness(out_dir, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(out_dir: &Path, freshness: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                stopped: AtomicBool::new(false),
                marker: out_dir.join(STOP_MARKER),
                freshness,
            }),
        }
    }

    pub fn marker_path(&self) -> &Path {
        &self.inner.marker
    }

    /// Set the flag and best-effort create the marker so a separate control
    /// surface can observe the stop. Safe to call concurrently with readers.
    pub fn request_stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _ = fs::File::create(&self.inner.marker);
    }

    /// Flag check plus a marker-file freshness check. A stale marker (left
    /// over from a previous run) is deleted and ignored; a fresh one latches
    /// the in-memory flag so later checks short-circuit.
    pub fn is_stopped(&self) -> bool {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return true;
        }
        let meta = match fs::metadata(&self.inner.marker) {
            Ok(meta) => meta,
            Err(_) => return false,
        };
        match meta.modified() {
            Ok(mtime) => {
                let age = SystemTime::now()
                    .duration_since(mtime)
                    .unwrap_or(Duration::ZERO);
                if age < self.inner.freshness {
                    tracing::warn!("stop marker detected, stopping scan");
                    self.inner.stopped.store(true, Ordering::SeqCst);
                    true
                } else {
                    tracing::debug!("removing stale stop marker (age {:.1}s)", age.as_secs_f64());
                    let _ = fs::remove_file(&self.inner.marker);
                    false
                }
            }
            // Cannot check age: honor the marker rather than race a real stop.
            Err(_) => {
                tracing::warn!("stop marker detected (age unknown), stopping scan");
                self.inner.stopped.store(true, Ordering::SeqCst);
                true
            }
        }
    }

    /// Called exactly once, at the very start of a run, before any stage.
    pub fn reset(&self) {
        self.inner.stopped.store(false, Ordering::SeqCst);
        if self.inner.marker.exists() {
            tracing::info!("clearing stop marker left by a previous scan");
            let _ = fs::remove_file(&self.inner.marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn age_marker(path: &Path, seconds_ago: u64) {
        let past = SystemTime::now() - Duration::from_secs(seconds_ago);
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(past).unwrap();
    }

    #[test]
    fn request_stop_latches_and_creates_marker() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        assert!(!cancel.is_stopped());
        cancel.request_stop();
        assert!(cancel.is_stopped());
        assert!(cancel.marker_path().exists());
    }

    #[test]
    fn fresh_marker_triggers_stop() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        File::create(cancel.marker_path()).unwrap();
        age_marker(cancel.marker_path(), 1);
        assert!(cancel.is_stopped());
        // latched: a second check stays true even after marker removal
        std::fs::remove_file(cancel.marker_path()).unwrap();
        assert!(cancel.is_stopped());
    }

    #[test]
    fn stale_marker_is_ignored_and_removed() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        File::create(cancel.marker_path()).unwrap();
        age_marker(cancel.marker_path(), 10);
        assert!(!cancel.is_stopped());
        assert!(!cancel.marker_path().exists());
    }

    #[test]
    fn reset_clears_flag_and_marker() {
        let dir = tempdir().unwrap();
        let cancel = CancellationController::new(dir.path());
        cancel.request_stop();
        cancel.reset();
        assert!(!cancel.marker_path().exists());
        assert!(!cancel.is_stopped());
    }
}
