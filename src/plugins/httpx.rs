use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

/// HTTP liveness prober. Produces the raw alive output the scheduler derives
/// the URL and alive-subdomain artifacts from.
pub struct Httpx;

#[async_trait]
impl Adapter for Httpx {
    fn id(&self) -> ToolId {
        ToolId::Httpx
    }

    fn requires(&self) -> &'static [ArtifactKind] {
        &[ArtifactKind::MergedSubdomains]
    }

    async fn run(
        &self,
        inputs: &ArtifactSet,
        ctx: &RunContext,
        _config: &GlobalConfig,
    ) -> StageResult {
        let Some(merged) = inputs.get(ArtifactKind::MergedSubdomains) else {
            return StageResult::failed(self.id().as_str(), "merged subdomain artifact missing");
        };
        let output = ctx.artifact_path("httpx_alive");
        let argv = vec![
            "httpx".to_string(),
            "-l".to_string(),
            merged.display().to_string(),
            "-silent".to_string(),
        ];

        let runner = ProcessRunner::new(ctx.clone());
        let ok = runner.run_to_file(self.id().as_str(), &argv, &output, false, false).await;
        conclude(self.id(), ok, output)
    }
}
