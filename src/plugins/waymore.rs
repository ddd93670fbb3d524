use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Waymore;

#[async_trait]
impl Adapter for Waymore {
    fn id(&self) -> ToolId {
        ToolId::Waymore
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
        let cfg = &config.tools.waymore;
        let output = ctx.artifact_path("waymore");

        let roots = match root_domains(urls) {
            Ok(roots) if !roots.is_empty() => roots,
            Ok(_) => return StageResult::failed(self.id().as_str(), "no root domains in URLs"),
            Err(err) => return StageResult::failed(self.id().as_str(), format!("{}", err)),
        };
        let roots: Vec<_> = roots.into_iter().take(cfg.max_domains).collect();
        tracing::info!("[waymore] processing {} root domains", roots.len());

        let runner = ProcessRunner::new(ctx.clone());
        let scratch = ctx.out_dir.join(format!("waymore_single_{}.tmp", ctx.base_name));
        let mut all_ok = true;
        let mut combined = String::new();
        for (idx, root) in roots.iter().enumerate() {
            if ctx.cancel.is_stopped() {
                break;
            }
            tracing::info!("[waymore] root domain {}/{}: {}", idx + 1, roots.len(), root);
            let argv = vec![
                "waymore".to_string(),
                "-i".to_string(),
                root.clone(),
                "-mode".to_string(),
                cfg.mode.clone(),
                "-l".to_string(),
                cfg.limit.to_string(),
                "-oU".to_string(),
                scratch.display().to_string(),
            ];
            let result = runner.run_captured(self.id().as_str(), &argv, None).await;
            all_ok &= result.succeeded;
            if let Ok(body) = std::fs::read_to_string(&scratch) {
                combined.push_str(&body);
                if !body.ends_with('\n') {
                    combined.push('\n');
                }
            }
        }
        let _ = std::fs::remove_file(&scratch);
        if let Err(err) = crate::utils::fs::atomic_write(&output, combined.as_bytes()) {
            return StageResult::failed(self.id().as_str(), format!("{:#}", err));
        }
        conclude(self.id(), all_ok, output)
    }
}

/// Last two labels of each host, the registrable-domain approximation the
/// archive lookup keys on.
fn root_domains(urls: &Path) -> std::io::Result<BTreeSet<String>> {
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
                .unwrap_or("");
            let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
            if labels.len() >= 2 {
                Some(labels[labels.len() - 2..].join("."))
            } else {
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roots_collapse_to_registrable_domain() {
        let dir = tempdir().unwrap();
        let urls = dir.path().join("urls.txt");
        std::fs::write(&urls, "https://a.b.example.com/x\nhttps://example.com\nhttps://c.other.org\n")
            .unwrap();
        let roots = root_domains(&urls).unwrap();
        assert_eq!(
            roots.into_iter().collect::<Vec<_>>(),
            vec!["example.com".to_string(), "other.org".to_string()]
        );
    }
}
