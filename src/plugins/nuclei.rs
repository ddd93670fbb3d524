use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::gate::artifact_usable;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};
use crate::utils::fs::atomic_write;

/// Vulnerability scanner keyed off the alive-subdomain artifact. Prepares
/// sanitized target and URL lists, then runs the base scan plus an exposure
/// scan, plus an optional custom-wordlist scan.
pub struct Nuclei;

#[async_trait]
impl Adapter for Nuclei {
    fn id(&self) -> ToolId {
        ToolId::Nuclei
    }

    fn requires(&self) -> &'static [ArtifactKind] {
        &[ArtifactKind::AliveSubdomains]
    }

    async fn run(
        &self,
        inputs: &ArtifactSet,
        ctx: &RunContext,
        config: &GlobalConfig,
    ) -> StageResult {
        let Some(subdomains) = inputs.get(ArtifactKind::AliveSubdomains) else {
            return StageResult::failed(self.id().as_str(), "alive-subdomain artifact missing");
        };
        let cfg = &config.tools.nuclei;

        let (hosts, urls) = match sanitize_targets(subdomains) {
            Ok(pair) => pair,
            Err(err) => return StageResult::failed(self.id().as_str(), format!("{}", err)),
        };
        if hosts.is_empty() {
            return StageResult::failed(self.id().as_str(), "no valid targets after sanitization");
        }

        let targets_file = ctx.artifact_path("nuclei_targets");
        let urls_file = ctx.artifact_path("nuclei_urls");
        if let Err(err) = atomic_write(&targets_file, joined(&hosts).as_bytes())
            .and_then(|_| atomic_write(&urls_file, joined(&urls).as_bytes()))
        {
            return StageResult::failed(self.id().as_str(), format!("{:#}", err));
        }
        tracing::info!("[nuclei] prepared {} targets from alive subdomains", hosts.len());

        let runner = ProcessRunner::new(ctx.clone());
        let output = ctx.artifact_path("nuclei");
        let argv = vec![
            "nuclei".to_string(),
            "-l".to_string(),
            targets_file.display().to_string(),
            "-c".to_string(),
            cfg.concurrency.to_string(),
            "-rl".to_string(),
            cfg.rate_limit.to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];
        let base = runner.run_captured(self.id().as_str(), &argv, None).await;

        if ctx.cancel.is_stopped() {
            return conclude(self.id(), base.succeeded, output);
        }

        // exposure templates against the derived URL list
        let exposures = ctx.artifact_path("nuclei_exposures");
        let argv = vec![
            "nuclei".to_string(),
            "-l".to_string(),
            urls_file.display().to_string(),
            "-c".to_string(),
            cfg.concurrency.to_string(),
            "-t".to_string(),
            "http/exposures/".to_string(),
            "-o".to_string(),
            exposures.display().to_string(),
        ];
        let exposure = runner.run_captured(self.id().as_str(), &argv, None).await;
        if exposure.succeeded && artifact_usable(Some(&exposures)) {
            tracing::info!("[nuclei] exposure findings saved to {}", exposures.display());
        }

        if let Some(wordlist) = &cfg.wordlist_file {
            if artifact_usable(Some(wordlist)) && !ctx.cancel.is_stopped() {
                tracing::info!("[nuclei] scanning custom wordlist {}", wordlist.display());
                let wordlist_out = ctx.artifact_path("nuclei_wordlist");
                let argv = vec![
                    "nuclei".to_string(),
                    "-l".to_string(),
                    wordlist.display().to_string(),
                    "-c".to_string(),
                    cfg.concurrency.to_string(),
                    "-rl".to_string(),
                    cfg.rate_limit.to_string(),
                    "-o".to_string(),
                    wordlist_out.display().to_string(),
                ];
                let _ = runner.run_captured(self.id().as_str(), &argv, None).await;
            }
        }

        conclude(self.id(), base.succeeded, output)
    }
}

fn sanitize_targets(subdomains: &Path) -> std::io::Result<(BTreeSet<String>, BTreeSet<String>)> {
    let body = std::fs::read_to_string(subdomains)?;
    let mut hosts = BTreeSet::new();
    let mut urls = BTreeSet::new();
    for line in body.lines() {
        let mut host = line.trim().to_lowercase();
        if let Some(rest) = host.split_once("://").map(|(_, rest)| rest.to_string()) {
            host = rest;
        }
        host = host.split('/').next().unwrap_or("").to_string();
        if !host.is_empty() && host.contains('.') {
            urls.insert(format!("https://{}", host));
            hosts.insert(host);
        }
    }
    Ok((hosts, urls))
}

fn joined(set: &BTreeSet<String>) -> String {
    let mut body = String::new();
    for entry in set {
        body.push_str(entry);
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn targets_are_sanitized_and_paired_with_urls() {
        let dir = tempdir().unwrap();
        let subs = dir.path().join("subdomain_alive_t.txt");
        std::fs::write(&subs, "https://A.Example.com/login\nb.example.com\nnodot\n").unwrap();
        let (hosts, urls) = sanitize_targets(&subs).unwrap();
        assert_eq!(
            hosts.into_iter().collect::<Vec<_>>(),
            vec!["a.example.com".to_string(), "b.example.com".to_string()]
        );
        assert_eq!(
            urls.into_iter().collect::<Vec<_>>(),
            vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string()
            ]
        );
    }
}
