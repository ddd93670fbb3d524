use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};
use crate::utils::fs::atomic_write;

pub struct Urlfinder;

#[async_trait]
impl Adapter for Urlfinder {
    fn id(&self) -> ToolId {
        ToolId::Urlfinder
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
        let output = ctx.artifact_path("urlfinder");

        let domains = match domains_from_urls(urls) {
            Ok(domains) if !domains.is_empty() => domains,
            Ok(_) => return StageResult::failed(self.id().as_str(), "no domains in URL artifact"),
            Err(err) => return StageResult::failed(self.id().as_str(), format!("{:#}", err)),
        };
        tracing::info!("[urlfinder] processing {} unique domain(s)", domains.len());

        // scratch list file for -list, owned here and removed when done
        let scratch = ctx.out_dir.join(format!("urlfinder_input_{}.tmp", ctx.base_name));
        let mut body = String::new();
        for domain in &domains {
            body.push_str(domain);
            body.push('\n');
        }
        if let Err(err) = atomic_write(&scratch, body.as_bytes()) {
            return StageResult::failed(self.id().as_str(), format!("{:#}", err));
        }

        let argv = vec![
            "urlfinder".to_string(),
            "-list".to_string(),
            scratch.display().to_string(),
            "-all".to_string(),
            "-rl".to_string(),
            config.tools.urlfinder.rate_limit.to_string(),
        ];

        let runner = ProcessRunner::new(ctx.clone());
        let ok = runner.run_to_file(self.id().as_str(), &argv, &output, false, false).await;
        let _ = std::fs::remove_file(&scratch);
        conclude(self.id(), ok, output)
    }
}

fn domains_from_urls(urls: &std::path::Path) -> anyhow::Result<BTreeSet<String>> {
    let body = std::fs::read_to_string(urls)?;
    Ok(body
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
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn domains_are_extracted_and_deduplicated() {
        let dir = tempdir().unwrap();
        let urls = dir.path().join("urls.txt");
        std::fs::write(&urls, "https://a.example.com/x\nhttp://a.example.com\nhttps://b.example.com\n").unwrap();
        let domains = domains_from_urls(&urls).unwrap();
        assert_eq!(
            domains.into_iter().collect::<Vec<_>>(),
            vec!["a.example.com".to_string(), "b.example.com".to_string()]
        );
    }
}
