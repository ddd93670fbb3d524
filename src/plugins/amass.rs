use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Amass;

#[async_trait]
impl Adapter for Amass {
    fn id(&self) -> ToolId {
        ToolId::Amass
    }

    fn requires(&self) -> &'static [ArtifactKind] {
        &[]
    }

    async fn run(
        &self,
        _inputs: &ArtifactSet,
        ctx: &RunContext,
        config: &GlobalConfig,
    ) -> StageResult {
        let cfg = &config.tools.amass;
        let output = ctx.artifact_path("amass");
        let mut argv = vec!["amass".to_string(), "enum".to_string()];

        if let Some(config_file) = &cfg.config_file {
            if config_file.exists() {
                argv.extend(["-config".to_string(), config_file.display().to_string()]);
            } else {
                tracing::warn!("[amass] config file not found: {}", config_file.display());
            }
        }

        match (ctx.target.domain(), ctx.target.domain_list()) {
            (Some(domain), _) => argv.extend(["-d".to_string(), domain.to_string()]),
            (_, Some(list)) => argv.extend(["-df".to_string(), list.display().to_string()]),
            _ => return StageResult::failed(self.id().as_str(), "no domain or domain list"),
        }

        if cfg.passive {
            argv.push("-passive".to_string());
        }
        if cfg.bruteforce {
            argv.push("-brute".to_string());
            match &cfg.wordlist {
                Some(wordlist) if wordlist.exists() => {
                    argv.extend(["-w".to_string(), wordlist.display().to_string()]);
                }
                Some(wordlist) => {
                    tracing::warn!("[amass] bruteforce wordlist not found: {}", wordlist.display());
                }
                None => {}
            }
        }

        argv.extend(["-o".to_string(), output.display().to_string()]);

        // amass writes its artifact itself via -o; stdout is progress noise
        let runner = ProcessRunner::new(ctx.clone());
        let result = runner.run_captured(self.id().as_str(), &argv, None).await;
        conclude(self.id(), result.succeeded, output)
    }
}
