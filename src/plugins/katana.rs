use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Katana;

#[async_trait]
impl Adapter for Katana {
    fn id(&self) -> ToolId {
        ToolId::Katana
    }

    fn requires(&self) -> &'static [ArtifactKind] {
        &[ArtifactKind::Urls]
    }

    async fn run(
        &self,
        inputs: &ArtifactSet,
        ctx: &RunContext,
        config: &GlobalConfig,
    ) -> StageResult {
        let Some(urls) = inputs.get(ArtifactKind::Urls) else {
            return StageResult::failed(self.id().as_str(), "URL artifact missing");
        };
        let cfg = &config.tools.katana;
        let output = ctx.artifact_path("katana");

        let argv = vec![
            "katana".to_string(),
            "-list".to_string(),
            urls.display().to_string(),
            "-d".to_string(),
            cfg.depth.to_string(),
            "-rl".to_string(),
            cfg.rate_limit.to_string(),
            "-jc".to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];

        let runner = ProcessRunner::new(ctx.clone());
        let result = runner.run_captured(self.id().as_str(), &argv, None).await;
        conclude(self.id(), result.succeeded, output)
    }
}
