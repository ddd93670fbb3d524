use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::gate::artifact_usable;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};

/// One external tool at the orchestrator's boundary. Idempotent per scheduler
/// invocation and total: never unwinds past its own boundary; every outcome
/// is a `StageResult`.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn id(&self) -> ToolId;

    /// Upstream artifacts this adapter consumes; the scheduler gates on them
    /// so no tool-specific knowledge leaks into the core.
    fn requires(&self) -> &'static [ArtifactKind];

    async fn run(&self, inputs: &ArtifactSet, ctx: &RunContext, config: &GlobalConfig)
    -> StageResult;
}

/// Shared post-run verdict: the artifact decides. A non-zero exit with a
/// non-empty artifact still counts as usable output.
pub fn conclude(tool: ToolId, ran_ok: bool, artifact: PathBuf) -> StageResult {
    if artifact_usable(Some(&artifact)) {
        if !ran_ok {
            tracing::warn!("[{}] completed with warnings, output kept", tool);
        }
        StageResult::completed(tool.as_str(), artifact)
    } else if ran_ok {
        StageResult::failed(tool.as_str(), "produced no usable output")
    } else {
        StageResult::failed(tool.as_str(), "command failed and produced no usable output")
    }
}
