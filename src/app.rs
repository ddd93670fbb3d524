use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::cli::args::Cli;
use crate::config::ConfigLoader;
use crate::core::cancel::CancellationController;
use crate::core::models::{RunContext, TargetSpec};
use crate::core::scheduler::PipelineScheduler;
use crate::executors::toolchain::check_tools;
use crate::plugins::registry::AdapterRegistry;
use crate::ui::printer;
use crate::utils::{logging, time};

/// Wire the CLI to a scheduler run: resolve the target, prepare the run
/// directory and logging, layer the configuration, hook Ctrl-C, then drive
/// the pipeline and print the summary whatever the outcome.
pub async fn run(cli: Cli) -> Result<()> {
    let target = resolve_target(&cli)?;
    let out_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("recon_{}", target.base_name())));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let log_file = out_dir.join(time::run_log_name());
    let _log_guard = logging::init(logging::level_from_cli(&cli), &log_file)?;
    tracing::info!("logging to {}", log_file.display());

    let mut config = ConfigLoader::load(cli.mode);
    if let Some(policy) = cli.policy {
        config.execution.policy = policy;
    }
    if let Some(gate) = cli.gate {
        config.execution.gate = gate;
    }

    if cli.skip_checks {
        tracing::info!("skipping tool binary checks");
    } else {
        check_tools(&config.tools);
    }

    let cancel = CancellationController::new(&out_dir);
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; requesting stop");
            ctrl_c_cancel.request_stop();
        }
    });

    let ctx = RunContext::new(target, out_dir, cancel);
    let mut scheduler = PipelineScheduler::new(ctx, config, AdapterRegistry::default());
    let outcome = scheduler.run().await;

    printer::print_summary(scheduler.report());

    outcome?;
    Ok(())
}

fn resolve_target(cli: &Cli) -> Result<TargetSpec> {
    if let Some(domain) = &cli.domain {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() || !domain.contains('.') {
            bail!("'{}' does not look like a domain", domain);
        }
        return Ok(TargetSpec::Domain(domain));
    }
    if let Some(list) = &cli.domain_list {
        if !list.is_file() {
            bail!("domain list {} not found", list.display());
        }
        return Ok(TargetSpec::DomainList(list.clone()));
    }
    // clap enforces one of the two, so this is unreachable in practice
    bail!("either --domain or --domain-list is required");
}
