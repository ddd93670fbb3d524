use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::types::{ExecutionPolicy, GateStrictness, ScanMode};

#[derive(Parser, Debug, Clone)]
#[command(name = "reconpipe", version, about = "Staged reconnaissance pipeline orchestrator")]
pub struct Cli {
    /// Single domain to scan
    #[arg(short = 'd', long = "domain", conflicts_with = "domain_list", required_unless_present = "domain_list")]
    pub domain: Option<String>,

    /// File containing a newline-delimited list of domains
    #[arg(short = 'L', long = "domain-list")]
    pub domain_list: Option<PathBuf>,

    /// Output directory (default: recon_<domain> or recon_<list stem>)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Scan intensity preset
    #[arg(long = "mode", value_enum, default_value_t = ScanMode::Standard)]
    pub mode: ScanMode,

    /// Stage-3 scheduling policy
    #[arg(long = "policy", value_enum)]
    pub policy: Option<ExecutionPolicy>,

    /// Gate strictness before content discovery
    #[arg(long = "gate", value_enum)]
    pub gate: Option<GateStrictness>,

    /// Verbose human output
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Skip the preflight binary check
    #[arg(long = "skip-checks", action = ArgAction::SetTrue)]
    pub skip_checks: bool,
}
