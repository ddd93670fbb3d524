use std::path::Path;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Sublist3r;

impl Sublist3r {
    fn argv_for(&self, domain: &str, output: &Path, config: &GlobalConfig) -> Vec<String> {
        let cfg = &config.tools.sublist3r;
        let mut argv = vec![
            "sublist3r".to_string(),
            "-d".to_string(),
            domain.to_string(),
            "-n".to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];
        if cfg.bruteforce {
            argv.push("-b".to_string());
        }
        if let Some(threads) = cfg.threads {
            argv.extend(["-t".to_string(), threads.to_string()]);
        }
        if let Some(engines) = &cfg.engines {
            argv.extend(["-e".to_string(), engines.clone()]);
        }
        argv
    }
}

#[async_trait]
impl Adapter for Sublist3r {
    fn id(&self) -> ToolId {
        ToolId::Sublist3r
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
        let output = ctx.artifact_path("sublist3r");
        let runner = ProcessRunner::new(ctx.clone());

        match (ctx.target.domain(), ctx.target.domain_list()) {
            (Some(domain), _) => {
                // sublist3r writes via -o; stdout is banner noise
                let argv = self.argv_for(domain, &output, config);
                let result = runner.run_captured(self.id().as_str(), &argv, None).await;
                conclude(self.id(), result.succeeded, output)
            }
            (_, Some(list)) => {
                let domains = match std::fs::read_to_string(list) {
                    Ok(body) => body,
                    Err(err) => {
                        return StageResult::failed(
                            self.id().as_str(),
                            format!("cannot read domain list: {}", err),
                        );
                    }
                };

                // One pass per domain into a scratch file, concatenated into
                // the canonical artifact. The scratch file is owned here and
                // removed when done.
                let scratch = ctx.out_dir.join(format!("sublist3r_single_{}.tmp", ctx.base_name));
                let mut all_ok = true;
                let mut combined = String::new();
                for domain in domains.lines().map(str::trim).filter(|d| !d.is_empty()) {
                    if ctx.cancel.is_stopped() {
                        break;
                    }
                    let argv = self.argv_for(domain, &scratch, config);
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
            _ => StageResult::failed(self.id().as_str(), "no domain or domain list"),
        }
    }
}
