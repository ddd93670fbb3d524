use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Dirsearch;

#[async_trait]
impl Adapter for Dirsearch {
    fn id(&self) -> ToolId {
        ToolId::Dirsearch
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
        let cfg = &config.tools.dirsearch;
        let output = ctx.artifact_path("dirsearch");

        let mut argv = vec![
            "dirsearch".to_string(),
            "-l".to_string(),
            urls.display().to_string(),
            "-e".to_string(),
            cfg.extensions.clone(),
            "-t".to_string(),
            cfg.threads.to_string(),
            "-i".to_string(),
            cfg.match_codes.clone(),
            "-o".to_string(),
            output.display().to_string(),
        ];
        if let Some(wordlist) = &cfg.wordlist {
            argv.extend(["-w".to_string(), wordlist.display().to_string()]);
        }
        if let Some(max_rate) = cfg.max_rate {
            argv.extend(["--max-rate".to_string(), max_rate.to_string()]);
        }

        // dirsearch writes the artifact itself via -o
        let runner = ProcessRunner::new(ctx.clone());
        let result = runner.run_captured(self.id().as_str(), &argv, None).await;
        conclude(self.id(), result.succeeded, output)
    }
}
