use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;

use crate::config::GlobalConfig;
use crate::config::types::{ExecutionPolicy, GateStrictness, ToolId};
use crate::core::errors::ReconError;
use crate::core::extract::{extract_alive_hosts, extract_urls};
use crate::core::gate::{self, GateOutcome, artifact_usable};
use crate::core::group::{GroupTask, run_group};
use crate::core::merge::{self, normalize_host};
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult, StageStatus};
use crate::core::report::RunReport;
use crate::plugins::registry::AdapterRegistry;
use crate::plugins::types::Adapter;
use crate::utils::fs::count_lines;

pub const STAGE_DISCOVERY: &str = "discovery";
pub const STAGE_LIVENESS: &str = "liveness";
pub const STAGE_CONTENT: &str = "content";
pub const STAGE_ARCHIVE: &str = "archive";
pub const STAGE_CLOUD: &str = "cloud";
pub const STAGE_VULN: &str = "vuln";

/// Drives the whole run: discovery, merge, liveness filtering, then the
/// dependent scan stages under the configured execution policy. One scheduler
/// per run; the report survives the run whatever its outcome.
pub struct PipelineScheduler {
    ctx: RunContext,
    config: GlobalConfig,
    registry: AdapterRegistry,
    artifacts: ArtifactSet,
    report: RunReport,
}

impl PipelineScheduler {
    pub fn new(ctx: RunContext, config: GlobalConfig, registry: AdapterRegistry) -> Self {
        let report = RunReport::new(ctx.target.to_string());
        Self {
            ctx,
            config,
            registry,
            artifacts: ArtifactSet::default(),
            report,
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Run the pipeline to completion, cancellation, or a fatal error. The
    /// report is filled in either way; fatal errors carry their own exit
    /// codes.
    pub async fn run(&mut self) -> Result<(), ReconError> {
        // a marker left behind by an earlier run must not kill this one
        self.ctx.cancel.reset();
        let started = Instant::now();
        tracing::info!("starting recon against {}", self.ctx.target);

        let outcome = self.run_stages().await;

        self.report.total_elapsed = started.elapsed();
        if self.ctx.cancel.is_stopped() {
            self.report.partial = true;
        }
        outcome
    }

    async fn run_stages(&mut self) -> Result<(), ReconError> {
        self.run_discovery().await?;
        if self.stopped() {
            return Ok(());
        }

        self.run_liveness().await;
        if self.stopped() {
            return Ok(());
        }

        if self.config.execution.gate == GateStrictness::Strict
            && !artifact_usable(self.artifacts.alive_subdomains.as_deref())
        {
            self.skip_remaining("no alive subdomains to scan");
            return Err(ReconError::MissingPrerequisite {
                stage: STAGE_CONTENT,
                artifact: ArtifactKind::AliveSubdomains,
            });
        }

        match self.config.execution.policy {
            ExecutionPolicy::Sequential => self.run_scans_sequential().await,
            ExecutionPolicy::Parallel => self.run_scans_parallel().await,
        }
        Ok(())
    }

    // -- stage 1: subdomain discovery -----------------------------------

    async fn run_discovery(&mut self) -> Result<(), ReconError> {
        tracing::info!("=== stage 1/3: subdomain discovery (no upstream dependency) ===");

        let enabled: Vec<Arc<dyn Adapter>> = self
            .registry
            .discovery
            .iter()
            .filter(|a| self.config.tools.enabled(a.id()))
            .map(Arc::clone)
            .collect();
        if enabled.is_empty() {
            return Err(ReconError::NoDiscoverySource);
        }
        for adapter in &self.registry.discovery {
            if !self.config.tools.enabled(adapter.id()) {
                self.report.record_skip(
                    STAGE_DISCOVERY,
                    adapter.id().as_str(),
                    "disabled in configuration",
                );
            }
        }

        let mut sources = Vec::new();
        for adapter in enabled {
            if self.stopped() {
                self.report
                    .record(STAGE_DISCOVERY, StageResult::cancelled(adapter.id().as_str()));
                continue;
            }
            let result = self.run_adapter(STAGE_DISCOVERY, &adapter).await;
            if let Some(artifact) = result.artifact {
                tracing::info!(
                    "[{}] {} subdomains collected",
                    result.tool,
                    count_lines(&artifact)
                );
                sources.push(artifact);
            }
        }

        let merged = self.ctx.artifact_path("subdomains_merged");
        let merge_report = merge::merge(&sources, &merged, normalize_host)
            .map_err(|err| std::io::Error::other(format!("{:#}", err)))?;
        for (source, count) in &merge_report.per_source {
            tracing::info!("  {} contributed {} entries", source, count);
        }
        tracing::info!(
            "merged {} unique subdomains ({} duplicates removed)",
            merge_report.total_after,
            merge_report.duplicates_removed
        );

        if merge_report.total_after == 0 && !self.ctx.cancel.is_stopped() {
            self.skip_remaining("no subdomains discovered");
            return Err(ReconError::NoSubdomains {
                target: self.ctx.target.to_string(),
            });
        }
        self.artifacts.merged_subdomains = Some(merged);
        Ok(())
    }

    // -- stage 2: liveness filtering ------------------------------------

    async fn run_liveness(&mut self) {
        tracing::info!("=== stage 2/3: liveness filtering (requires merged subdomains) ===");
        let liveness = Arc::clone(&self.registry.liveness);

        if self.config.tools.enabled(liveness.id()) {
            let result = self.run_adapter(STAGE_LIVENESS, &liveness).await;
            if let Some(alive) = result.artifact {
                self.artifacts.alive_urls = Some(alive.clone());
                self.derive_from_alive(&alive);
                return;
            }
            if self.config.execution.gate == GateStrictness::Strict {
                // leave alive_subdomains unset; the hard gate reports it
                tracing::warn!("[{}] produced no alive hosts", liveness.id());
                return;
            }
            tracing::warn!(
                "[{}] produced no alive hosts; falling back to the merged set",
                liveness.id()
            );
        } else {
            self.report.record_skip(
                STAGE_LIVENESS,
                liveness.id().as_str(),
                "disabled in configuration",
            );
            tracing::warn!(
                "liveness filtering disabled; scanning the unfiltered merged set"
            );
        }

        // Degraded mode: every merged subdomain is treated as alive. URL
        // artifacts stay absent, so URL-consuming stages soft-skip.
        self.artifacts.alive_subdomains = self.artifacts.merged_subdomains.clone();
    }

    fn derive_from_alive(&mut self, alive: &std::path::Path) {
        let urls = self.ctx.artifact_path("urls");
        match extract_urls(alive, &urls) {
            Ok(count) => {
                tracing::info!("extracted {} URLs from alive hosts", count);
                self.artifacts.urls = Some(urls);
            }
            Err(err) => tracing::error!("URL extraction failed: {:#}", err),
        }

        let hosts = self.ctx.artifact_path("subdomain_alive");
        match extract_alive_hosts(alive, &hosts) {
            Ok(count) => {
                tracing::info!("{} alive subdomains", count);
                self.artifacts.alive_subdomains = Some(hosts);
            }
            Err(err) => tracing::error!("alive-host extraction failed: {:#}", err),
        }
    }

    // -- stage 3: dependent scans ---------------------------------------

    fn scan_plan(&self) -> Vec<(&'static str, Arc<dyn Adapter>)> {
        let mut plan: Vec<(&'static str, Arc<dyn Adapter>)> = Vec::new();
        for adapter in &self.registry.content {
            plan.push((STAGE_CONTENT, Arc::clone(adapter)));
        }
        for adapter in &self.registry.archive {
            plan.push((STAGE_ARCHIVE, Arc::clone(adapter)));
        }
        plan.push((STAGE_CLOUD, Arc::clone(&self.registry.cloud)));
        plan.push((STAGE_VULN, Arc::clone(&self.registry.vuln)));
        plan
    }

    async fn run_scans_sequential(&mut self) {
        tracing::info!("=== stage 3/3: scanning, sequential (requires alive subdomains/URLs) ===");
        let plan = self.scan_plan();
        let total = plan.len();
        let mut completed = 0usize;
        let mut stage_elapsed = Duration::ZERO;
        for (idx, (stage, adapter)) in plan.into_iter().enumerate() {
            if self.stopped() {
                self.report
                    .record(stage, StageResult::cancelled(adapter.id().as_str()));
                continue;
            }
            tracing::info!("[{}/{}] {}", idx + 1, total, adapter.id());
            if let Some(result) = self.run_gated(stage, &adapter).await {
                stage_elapsed += result.elapsed;
                if result.status == StageStatus::Completed {
                    completed += 1;
                }
            }
        }
        tracing::info!(
            "sequential scans done: {}/{} tools completed in {:.1}s",
            completed,
            total,
            stage_elapsed.as_secs_f64()
        );
    }

    async fn run_scans_parallel(&mut self) {
        tracing::info!("=== stage 3/3: scanning, parallel (requires alive subdomains/URLs) ===");

        // phase 1: content discovery, cloud enumeration, vulnerability scan
        let mut phase_one: Vec<(&'static str, Arc<dyn Adapter>)> = self
            .registry
            .content
            .iter()
            .map(|a| (STAGE_CONTENT, Arc::clone(a)))
            .collect();
        phase_one.push((STAGE_CLOUD, Arc::clone(&self.registry.cloud)));
        phase_one.push((STAGE_VULN, Arc::clone(&self.registry.vuln)));
        self.run_phase(phase_one, self.config.concurrency.content_group)
            .await;
        if self.stopped() {
            return;
        }

        // phase 2: archive harvesting, separately bounded to be polite to
        // the archive services
        let phase_two: Vec<(&'static str, Arc<dyn Adapter>)> = self
            .registry
            .archive
            .iter()
            .map(|a| (STAGE_ARCHIVE, Arc::clone(a)))
            .collect();
        let archive_results = self
            .run_phase(phase_two, self.config.concurrency.archive_group)
            .await;
        if self.stopped() {
            return;
        }

        // phase 3: optional re-scan against the target set enlarged by the
        // archive harvest
        if self.config.tools.nuclei.rescan_after_archive
            && self
                .report
                .status_of(ToolId::Nuclei.as_str())
                .is_some_and(|s| s == StageStatus::Completed)
        {
            let harvested: Vec<PathBuf> = archive_results
                .iter()
                .filter_map(|r| r.artifact.clone())
                .collect();
            if self.enlarge_rescan_targets(&harvested) {
                tracing::info!("re-running {} after archive harvest", ToolId::Nuclei);
                let vuln = Arc::clone(&self.registry.vuln);
                self.run_gated(STAGE_VULN, &vuln).await;
            } else {
                tracing::info!("archive harvest surfaced no targets; skipping re-scan");
            }
        }
    }

    /// Union the archive-harvested hosts into the alive-subdomain artifact
    /// so the re-scan covers targets the archives surfaced, not just the
    /// original set.
    fn enlarge_rescan_targets(&mut self, harvested: &[PathBuf]) -> bool {
        if harvested.is_empty() {
            return false;
        }
        let Some(alive) = self.artifacts.alive_subdomains.clone() else {
            return false;
        };
        let mut sources = vec![alive];
        sources.extend(harvested.iter().cloned());

        let dest = self.ctx.artifact_path("rescan_targets");
        match merge::merge(&sources, &dest, normalize_host) {
            Ok(report) if report.total_after > 0 => {
                tracing::info!(
                    "re-scan target set: {} hosts ({} from archives and liveness combined)",
                    report.total_after,
                    report.total_before
                );
                self.artifacts.alive_subdomains = Some(dest);
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::error!("could not build re-scan target set: {:#}", err);
                false
            }
        }
    }

    async fn run_phase(
        &mut self,
        members: Vec<(&'static str, Arc<dyn Adapter>)>,
        bound: usize,
    ) -> Vec<StageResult> {
        let mut tasks = Vec::new();
        let mut stage_of = std::collections::HashMap::new();
        for (stage, adapter) in members {
            let id = adapter.id();
            if !self.config.tools.enabled(id) {
                self.report
                    .record_skip(stage, id.as_str(), "disabled in configuration");
                continue;
            }
            if let GateOutcome::Blocked { missing } = gate::check(&self.artifacts, adapter.requires()) {
                self.report
                    .record_skip(stage, id.as_str(), self.gate_detail(missing));
                continue;
            }
            stage_of.insert(id.as_str().to_string(), stage);
            let inputs = self.artifacts.clone();
            let ctx = self.ctx.clone();
            let config = self.config.clone();
            tasks.push(GroupTask::new(
                id.as_str(),
                async move { adapter.run(&inputs, &ctx, &config).await }.boxed(),
            ));
        }
        if tasks.is_empty() {
            return Vec::new();
        }

        let outcome = run_group(tasks, bound, &self.ctx.cancel).await;
        tracing::info!("scan group finished in {:.1}s", outcome.elapsed.as_secs_f64());
        let mut results = Vec::new();
        for (name, result) in outcome.results {
            let stage = stage_of.get(&name).copied().unwrap_or(STAGE_CONTENT);
            results.push(result.clone());
            self.report.record(stage, result);
        }
        results
    }

    // -- helpers --------------------------------------------------------

    /// Run one enabled adapter behind its soft gate, recording either the
    /// result or a skip naming the missing prerequisite. Returns `None` when
    /// the adapter never ran.
    async fn run_gated(
        &mut self,
        stage: &'static str,
        adapter: &Arc<dyn Adapter>,
    ) -> Option<StageResult> {
        let id = adapter.id();
        if !self.config.tools.enabled(id) {
            self.report
                .record_skip(stage, id.as_str(), "disabled in configuration");
            return None;
        }
        if let GateOutcome::Blocked { missing } = gate::check(&self.artifacts, adapter.requires()) {
            let detail = self.gate_detail(missing);
            tracing::warn!("[{}] skipped: {}", id, detail);
            self.report.record_skip(stage, id.as_str(), detail);
            return None;
        }
        Some(self.run_adapter(stage, adapter).await)
    }

    /// Run an adapter, time it, record the outcome, and hand back a copy for
    /// callers that chain on the artifact.
    async fn run_adapter(&mut self, stage: &'static str, adapter: &Arc<dyn Adapter>) -> StageResult {
        let start = Instant::now();
        let mut result = adapter.run(&self.artifacts, &self.ctx, &self.config).await;
        result.elapsed = start.elapsed();
        if let Some(detail) = &result.detail {
            tracing::warn!("[{}] {}: {}", result.tool, result.status.label(), detail);
        } else {
            tracing::info!(
                "[{}] {} in {:.1}s",
                result.tool,
                result.status.label(),
                result.elapsed.as_secs_f64()
            );
        }
        self.report.record(stage, result.clone());
        result
    }

    /// Explain a blocked gate: a prerequisite can be missing because its
    /// producer was disabled or because the producer ran and found nothing.
    fn gate_detail(&self, missing: ArtifactKind) -> String {
        let producer = match missing {
            ArtifactKind::MergedSubdomains => None,
            ArtifactKind::AliveUrls | ArtifactKind::AliveSubdomains | ArtifactKind::Urls => {
                Some(self.registry.liveness.id())
            }
        };
        match producer {
            Some(tool) if !self.config.tools.enabled(tool) => format!(
                "required artifact ({}) unavailable: {} is disabled",
                missing, tool
            ),
            Some(tool) => format!(
                "required artifact ({}) unavailable: {} produced no usable output",
                missing, tool
            ),
            None => format!("required artifact ({}) is missing or empty", missing),
        }
    }

    /// Record a skip for every still-enabled dependent scan stage; used when
    /// a hard gate aborts before stage 3.
    fn skip_remaining(&mut self, reason: &str) {
        if self.config.tools.enabled(self.registry.liveness.id())
            && self.report.status_of(self.registry.liveness.id().as_str()).is_none()
        {
            self.report
                .record_skip(STAGE_LIVENESS, self.registry.liveness.id().as_str(), reason);
        }
        for (stage, adapter) in self.scan_plan() {
            if self.config.tools.enabled(adapter.id()) {
                self.report.record_skip(stage, adapter.id().as_str(), reason);
            }
        }
    }

    /// Check for cancellation at a stage boundary, reaping live processes
    /// the first time it fires.
    fn stopped(&mut self) -> bool {
        if self.ctx.cancel.is_stopped() {
            if !self.report.partial {
                tracing::warn!("stop requested; terminating running tools");
                self.ctx.terminate_all();
                self.report.partial = true;
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancel::CancellationController;
    use crate::core::models::TargetSpec;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct FakeTool {
        id: ToolId,
        requires: &'static [ArtifactKind],
        lines: Vec<&'static str>,
        stage_name: &'static str,
        stop_after: bool,
    }

    impl FakeTool {
        fn new(
            id: ToolId,
            requires: &'static [ArtifactKind],
            lines: Vec<&'static str>,
            stage_name: &'static str,
        ) -> Self {
            Self { id, requires, lines, stage_name, stop_after: false }
        }
    }

    #[async_trait]
    impl Adapter for FakeTool {
        fn id(&self) -> ToolId {
            self.id
        }

        fn requires(&self) -> &'static [ArtifactKind] {
            self.requires
        }

        async fn run(
            &self,
            _inputs: &ArtifactSet,
            ctx: &RunContext,
            _config: &GlobalConfig,
        ) -> StageResult {
            if self.stop_after {
                ctx.cancel.request_stop();
            }
            if self.lines.is_empty() {
                return StageResult::failed(self.id.as_str(), "produced no usable output");
            }
            let out = ctx.artifact_path(self.stage_name);
            let body = self.lines.join("\n") + "\n";
            std::fs::write(&out, body).unwrap();
            StageResult::completed(self.id.as_str(), out)
        }
    }

    /// Captures the alive-subdomain input it was handed on every invocation.
    struct RecordingTool {
        id: ToolId,
        stage_name: &'static str,
        seen: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Adapter for RecordingTool {
        fn id(&self) -> ToolId {
            self.id
        }

        fn requires(&self) -> &'static [ArtifactKind] {
            &[ArtifactKind::AliveSubdomains]
        }

        async fn run(
            &self,
            inputs: &ArtifactSet,
            ctx: &RunContext,
            _config: &GlobalConfig,
        ) -> StageResult {
            let targets = inputs
                .get(ArtifactKind::AliveSubdomains)
                .and_then(|p| std::fs::read_to_string(p).ok())
                .unwrap_or_default();
            self.seen.lock().unwrap().push(targets);
            let out = ctx.artifact_path(self.stage_name);
            std::fs::write(&out, "finding\n").unwrap();
            StageResult::completed(self.id.as_str(), out)
        }
    }

    fn test_registry(
        discovery_lines: Vec<&'static str>,
        alive_lines: Vec<&'static str>,
    ) -> AdapterRegistry {
        AdapterRegistry {
            discovery: vec![Arc::new(FakeTool::new(
                ToolId::Subfinder,
                &[],
                discovery_lines,
                "subfinder",
            ))],
            liveness: Arc::new(FakeTool::new(
                ToolId::Httpx,
                &[ArtifactKind::MergedSubdomains],
                alive_lines,
                "httpx_alive",
            )),
            content: vec![Arc::new(FakeTool::new(
                ToolId::Dirsearch,
                &[ArtifactKind::Urls],
                vec!["https://a.example.com/admin"],
                "dirsearch",
            ))],
            archive: vec![],
            cloud: Arc::new(FakeTool::new(
                ToolId::Cloudenum,
                &[ArtifactKind::AliveSubdomains],
                vec!["bucket"],
                "cloud_enum",
            )),
            vuln: Arc::new(FakeTool::new(
                ToolId::Nuclei,
                &[ArtifactKind::AliveSubdomains],
                vec!["finding"],
                "nuclei",
            )),
        }
    }

    fn scheduler_in(dir: &std::path::Path, registry: AdapterRegistry) -> PipelineScheduler {
        let cancel = CancellationController::new(dir);
        let ctx = RunContext::new(
            TargetSpec::Domain("example.com".to_string()),
            dir.to_path_buf(),
            cancel,
        );
        let mut config = GlobalConfig::default();
        config.tools.amass.enabled = false;
        config.tools.sublist3r.enabled = false;
        config.tools.katana.enabled = false;
        config.tools.urlfinder.enabled = false;
        config.tools.waybackurls.enabled = false;
        config.tools.waymore.enabled = false;
        PipelineScheduler::new(ctx, config, registry)
    }

    #[tokio::test]
    async fn liveness_filters_the_merged_set() {
        let dir = tempdir().unwrap();
        let registry = test_registry(
            vec!["a.example.com", "b.example.com"],
            vec!["https://a.example.com 200"],
        );
        let mut scheduler = scheduler_in(dir.path(), registry);
        scheduler.run().await.unwrap();

        let alive = scheduler.artifacts().alive_subdomains.clone().unwrap();
        let body = std::fs::read_to_string(alive).unwrap();
        assert_eq!(body, "a.example.com\n");
        assert_eq!(
            scheduler.report().status_of("dirsearch"),
            Some(StageStatus::Completed)
        );
        assert_eq!(
            scheduler.report().status_of("nuclei"),
            Some(StageStatus::Completed)
        );
        assert!(!scheduler.report().partial);
    }

    #[tokio::test]
    async fn empty_discovery_aborts_with_no_subdomains() {
        let dir = tempdir().unwrap();
        let registry = test_registry(vec![], vec!["https://a.example.com 200"]);
        let mut scheduler = scheduler_in(dir.path(), registry);
        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(err, ReconError::NoSubdomains { .. }));
        assert_eq!(err.exit_code(), 3);

        // downstream stages were skipped, never marked failed
        assert_eq!(scheduler.report().status_of("httpx"), Some(StageStatus::Skipped));
        assert_eq!(
            scheduler.report().status_of("dirsearch"),
            Some(StageStatus::Skipped)
        );
        assert_eq!(scheduler.report().status_of("nuclei"), Some(StageStatus::Skipped));
    }

    #[tokio::test]
    async fn strict_gate_aborts_when_nothing_is_alive() {
        let dir = tempdir().unwrap();
        let registry = test_registry(vec!["a.example.com"], vec![]);
        let mut scheduler = scheduler_in(dir.path(), registry);
        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingPrerequisite {
                artifact: ArtifactKind::AliveSubdomains,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            scheduler.report().status_of("dirsearch"),
            Some(StageStatus::Skipped)
        );
    }

    #[tokio::test]
    async fn lenient_gate_degrades_to_merged_set() {
        let dir = tempdir().unwrap();
        let registry = test_registry(vec!["a.example.com"], vec![]);
        let mut scheduler = scheduler_in(dir.path(), registry);
        scheduler.config.execution.gate = GateStrictness::Lenient;
        scheduler.run().await.unwrap();

        // liveness failed, so the merged set stands in for alive subdomains
        assert_eq!(
            scheduler.artifacts().alive_subdomains,
            scheduler.artifacts().merged_subdomains
        );
        // URL-consuming stages skip, host-consuming stages still run
        assert_eq!(
            scheduler.report().status_of("dirsearch"),
            Some(StageStatus::Skipped)
        );
        assert_eq!(scheduler.report().status_of("nuclei"), Some(StageStatus::Completed));
    }

    #[tokio::test]
    async fn no_discovery_source_is_fatal() {
        let dir = tempdir().unwrap();
        let registry = test_registry(vec!["a.example.com"], vec![]);
        let mut scheduler = scheduler_in(dir.path(), registry);
        scheduler.config.tools.subfinder.enabled = false;
        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(err, ReconError::NoDiscoverySource));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn parallel_policy_runs_the_same_plan() {
        let dir = tempdir().unwrap();
        let registry = test_registry(
            vec!["a.example.com"],
            vec!["https://a.example.com 200"],
        );
        let mut scheduler = scheduler_in(dir.path(), registry);
        scheduler.config.execution.policy = ExecutionPolicy::Parallel;
        scheduler.run().await.unwrap();
        assert_eq!(
            scheduler.report().status_of("dirsearch"),
            Some(StageStatus::Completed)
        );
        assert_eq!(scheduler.report().status_of("nuclei"), Some(StageStatus::Completed));
        assert_eq!(scheduler.report().status_of("cloudenum"), Some(StageStatus::Completed));
    }

    #[tokio::test]
    async fn archive_rescan_targets_include_harvested_hosts() {
        let dir = tempdir().unwrap();
        let mut registry = test_registry(
            vec!["a.example.com"],
            vec!["https://a.example.com 200"],
        );
        registry.archive = vec![Arc::new(FakeTool::new(
            ToolId::Waybackurls,
            &[ArtifactKind::Urls],
            vec!["https://new-host.example.com/leaked"],
            "waybackurls",
        ))];
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        registry.vuln = Arc::new(RecordingTool {
            id: ToolId::Nuclei,
            stage_name: "nuclei",
            seen: Arc::clone(&seen),
        });

        let mut scheduler = scheduler_in(dir.path(), registry);
        scheduler.config.tools.waybackurls.enabled = true;
        scheduler.config.execution.policy = ExecutionPolicy::Parallel;
        scheduler.config.tools.nuclei.rescan_after_archive = true;
        scheduler.run().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2, "base scan plus one re-scan");
        assert_eq!(seen[0], "a.example.com\n");
        // the re-scan sees the union of the alive set and the archive hosts
        assert_eq!(seen[1], "a.example.com\nnew-host.example.com\n");
    }

    #[tokio::test]
    async fn stop_during_discovery_yields_a_partial_report() {
        let dir = tempdir().unwrap();
        let mut registry = test_registry(
            vec!["a.example.com"],
            vec!["https://a.example.com 200"],
        );
        let mut stopping = FakeTool::new(
            ToolId::Subfinder,
            &[],
            vec!["a.example.com"],
            "subfinder",
        );
        stopping.stop_after = true;
        registry.discovery = vec![Arc::new(stopping)];

        let mut scheduler = scheduler_in(dir.path(), registry);
        scheduler.run().await.unwrap();

        assert!(scheduler.report().partial);
        assert_eq!(
            scheduler.report().status_of("subfinder"),
            Some(StageStatus::Completed)
        );
        // nothing downstream started
        assert_eq!(scheduler.report().status_of("httpx"), None);
        assert_eq!(scheduler.report().status_of("dirsearch"), None);
    }
}
