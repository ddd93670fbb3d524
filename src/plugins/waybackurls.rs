use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};
use crate::utils::fs::atomic_write;

/// Archive harvester fed over stdin, the `cat list | waybackurls` shape.
pub struct Waybackurls;

#[async_trait]
impl Adapter for Waybackurls {
    fn id(&self) -> ToolId {
        ToolId::Waybackurls
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
        let output = ctx.artifact_path("waybackurls");

        let body = match std::fs::read_to_string(urls) {
            Ok(body) => body,
            Err(err) => return StageResult::failed(self.id().as_str(), format!("{}", err)),
        };
        let domains: BTreeSet<String> = body
            .lines()
            .filter_map(|line| {
                let host = line
                    .trim()
                    .trim_start_matches("http://")
                    .trim_start_matches("https://")
                    .split('/')
                    .next()
                    .unwrap_or("")
                    .to_string();
                if host.is_empty() { None } else { Some(host) }
            })
            .collect();
        if domains.is_empty() {
            return StageResult::failed(self.id().as_str(), "no domains extracted from URLs");
        }

        let max = config.tools.waybackurls.max_domains;
        let mut stdin_body = String::new();
        for domain in domains.iter().take(max) {
            stdin_body.push_str(domain);
            stdin_body.push('\n');
        }
        tracing::info!("[waybackurls] processing {} domains", domains.len().min(max));

        let runner = ProcessRunner::new(ctx.clone());
        let argv = vec!["waybackurls".to_string()];
        let result = runner.run_captured(self.id().as_str(), &argv, Some(&stdin_body)).await;

        if let Err(err) = atomic_write(&output, result.stdout.as_bytes()) {
            return StageResult::failed(self.id().as_str(), format!("{:#}", err));
        }
        conclude(self.id(), result.succeeded, output)
    }
}
