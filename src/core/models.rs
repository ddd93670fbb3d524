use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::cancel::CancellationController;
use crate::utils::time::sanitize_component;

/// What to scan. Exactly one of the two forms; immutable once the run starts.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    Domain(String),
    DomainList(PathBuf),
}

impl TargetSpec {
    /// Filesystem-safe identifier seeding every artifact filename.
    pub fn base_name(&self) -> String {
        match self {
            TargetSpec::Domain(d) => sanitize_component(&d.replace('.', "_")),
            TargetSpec::DomainList(p) => {
                let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("domains");
                sanitize_component(stem)
            }
        }
    }

    pub fn domain(&self) -> Option<&str> {
        match self {
            TargetSpec::Domain(d) => Some(d),
            TargetSpec::DomainList(_) => None,
        }
    }

    pub fn domain_list(&self) -> Option<&Path> {
        match self {
            TargetSpec::Domain(_) => None,
            TargetSpec::DomainList(p) => Some(p),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Domain(d) => write!(f, "{}", d),
            TargetSpec::DomainList(p) => write!(f, "{}", p.display()),
        }
    }
}

/// The artifact slots a stage may consume, normalized to one shape for every
/// adapter even though individual adapters use different subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    MergedSubdomains,
    AliveUrls,
    AliveSubdomains,
    Urls,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::MergedSubdomains => "merged subdomains",
            ArtifactKind::AliveUrls => "alive URLs",
            ArtifactKind::AliveSubdomains => "alive subdomains",
            ArtifactKind::Urls => "extracted URLs",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    pub merged_subdomains: Option<PathBuf>,
    pub alive_urls: Option<PathBuf>,
    pub alive_subdomains: Option<PathBuf>,
    pub urls: Option<PathBuf>,
}

impl ArtifactSet {
    pub fn get(&self, kind: ArtifactKind) -> Option<&Path> {
        match kind {
            ArtifactKind::MergedSubdomains => self.merged_subdomains.as_deref(),
            ArtifactKind::AliveUrls => self.alive_urls.as_deref(),
            ArtifactKind::AliveSubdomains => self.alive_subdomains.as_deref(),
            ArtifactKind::Urls => self.urls.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Skipped,
    Failed,
    Cancelled,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Completed => "completed",
            StageStatus::Skipped => "skipped",
            StageStatus::Failed => "failed",
            StageStatus::Cancelled => "cancelled",
        }
    }
}

/// One stage invocation's outcome. A `None` artifact means the stage produced
/// nothing usable.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub tool: String,
    pub artifact: Option<PathBuf>,
    pub elapsed: Duration,
    pub status: StageStatus,
    pub detail: Option<String>,
}

impl StageResult {
    pub fn completed(tool: &str, artifact: PathBuf) -> Self {
        Self {
            tool: tool.to_string(),
            artifact: Some(artifact),
            elapsed: Duration::ZERO,
            status: StageStatus::Completed,
            detail: None,
        }
    }

    pub fn failed(tool: &str, detail: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            artifact: None,
            elapsed: Duration::ZERO,
            status: StageStatus::Failed,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(tool: &str, detail: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            artifact: None,
            elapsed: Duration::ZERO,
            status: StageStatus::Skipped,
            detail: Some(detail.into()),
        }
    }

    pub fn cancelled(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            artifact: None,
            elapsed: Duration::ZERO,
            status: StageStatus::Cancelled,
            detail: Some("scan stopped".to_string()),
        }
    }
}

/// Per-run context replacing the source's process-wide registry of in-flight
/// subprocesses. Scoped to one `PipelineScheduler::run()` invocation.
#[derive(Clone)]
pub struct RunContext {
    pub target: TargetSpec,
    pub out_dir: PathBuf,
    pub base_name: String,
    pub cancel: CancellationController,
    // pgid -> tool name for every live external process
    procs: Arc<Mutex<HashMap<u32, String>>>,
}

impl RunContext {
    pub fn new(target: TargetSpec, out_dir: PathBuf, cancel: CancellationController) -> Self {
        let base_name = target.base_name();
        Self {
            target,
            out_dir,
            base_name,
            cancel,
            procs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Canonical `{stage}_{base_name}.txt` path inside the run directory.
    pub fn artifact_path(&self, stage: &str) -> PathBuf {
        self.out_dir.join(format!("{}_{}.txt", stage, self.base_name))
    }

    pub fn register_process(&self, pgid: u32, tool: &str) {
        if let Ok(mut procs) = self.procs.lock() {
            procs.insert(pgid, tool.to_string());
        }
    }

    pub fn unregister_process(&self, pgid: u32) {
        if let Ok(mut procs) = self.procs.lock() {
            procs.remove(&pgid);
        }
    }

    /// SIGTERM every registered process group. Tools may spawn their own
    /// children, so the whole group is signalled, not just the direct child.
    pub fn terminate_all(&self) {
        let procs: Vec<(u32, String)> = match self.procs.lock() {
            Ok(p) => p.iter().map(|(k, v)| (*k, v.clone())).collect(),
            Err(_) => return,
        };
        for (pgid, tool) in procs {
            tracing::warn!("[{}] terminating process group {}", tool, pgid);
            terminate_group(pgid);
        }
    }
}

#[cfg(unix)]
pub fn terminate_group(pgid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;
    let _ = killpg(Pid::from_raw(pgid as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
pub fn terminate_group(_pgid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_from_domain_replaces_dots() {
        let target = TargetSpec::Domain("sub.example.com".to_string());
        assert_eq!(target.base_name(), "sub_example_com");
    }

    #[test]
    fn base_name_from_list_uses_file_stem() {
        let target = TargetSpec::DomainList(PathBuf::from("/tmp/scope targets.txt"));
        assert_eq!(target.base_name(), "scope_targets");
    }

    #[test]
    fn artifact_path_is_deterministic() {
        let cancel = CancellationController::new(Path::new("/tmp"));
        let ctx = RunContext::new(
            TargetSpec::Domain("example.com".to_string()),
            PathBuf::from("/tmp/run"),
            cancel,
        );
        assert_eq!(
            ctx.artifact_path("subdomains_merged"),
            PathBuf::from("/tmp/run/subdomains_merged_example_com.txt")
        );
    }
}
