use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Cloudenum;

#[async_trait]
impl Adapter for Cloudenum {
    fn id(&self) -> ToolId {
        ToolId::Cloudenum
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
        let Some(subdomains) = inputs.get(ArtifactKind::AliveSubdomains) else {
            return StageResult::failed(self.id().as_str(), "alive-subdomain artifact missing");
        };
        let output = ctx.artifact_path("cloudenum");

        let roots = match root_domains(subdomains) {
            Ok(roots) if !roots.is_empty() => roots,
            Ok(_) => {
                return StageResult::failed(self.id().as_str(), "no domains for cloud enumeration");
            }
            Err(err) => return StageResult::failed(self.id().as_str(), format!("{}", err)),
        };
        tracing::info!("[cloudenum] processing {} root domains", roots.len());

        let runner = ProcessRunner::new(ctx.clone());
        let mut all_ok = true;
        for (idx, root) in roots.iter().enumerate() {
            if ctx.cancel.is_stopped() {
                break;
            }
            let keyword = root.split('.').next().unwrap_or(root);
            if keyword.is_empty() {
                tracing::warn!("[cloudenum] skipping '{}' - empty keyword", root);
                continue;
            }
            tracing::info!(
                "[cloudenum] checking cloud resources {}/{}: {} (keyword: {})",
                idx + 1,
                roots.len(),
                root,
                keyword
            );
            let argv = vec!["cloud_enum".to_string(), "-k".to_string(), keyword.to_string()];
            all_ok &= runner
                .run_to_file(self.id().as_str(), &argv, &output, idx > 0, false)
                .await;
        }

        conclude(self.id(), all_ok, output)
    }
}

fn root_domains(subdomains: &Path) -> std::io::Result<BTreeSet<String>> {
    let body = std::fs::read_to_string(subdomains)?;
    Ok(body
        .lines()
        .filter_map(|line| {
            let labels: Vec<&str> = line.trim().split('.').filter(|l| !l.is_empty()).collect();
            if labels.len() >= 2 {
                Some(labels[labels.len() - 2..].join("."))
            } else {
                None
            }
        })
        .collect())
}
