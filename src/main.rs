mod app;
mod cli;
mod config;
mod core;
mod executors;
mod plugins;
mod ui;
mod utils;

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cli::args::Cli::parse();
    if let Err(err) = app::run(cli).await {
        eprintln!("fatal: {:#}", err);
        let code = err
            .downcast_ref::<crate::core::errors::ReconError>()
            .map(crate::core::errors::ReconError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
