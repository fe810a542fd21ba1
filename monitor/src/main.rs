//! ollama-monitor Entry Point

use clap::Parser;
use ollama_monitor::cli::{self, check::CheckArgs, Cli, Commands};
use ollama_monitor::logging;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env は存在しなくてもよい
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _log_guard = match logging::init(&cli.global.log_options()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Some(Commands::Check(args)) => cli::check::execute(&cli.global, args).await,
        Some(Commands::LoadTest(args)) => cli::load_test::execute(&cli.global, args).await,
        Some(Commands::Watch(args)) => cli::watch::execute(&cli.global, args).await,
        None => cli::check::execute(&cli.global, &CheckArgs::default()).await,
    };

    if let Err(e) = result {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
