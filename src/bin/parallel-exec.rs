use anyhow::Result;
use clap::Parser;
use parallel_exec::cli::Cli;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries progress output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting parallel-exec {}", parallel_exec::cli::VERSION);

    match cli.execute().await {
        Ok(code) => {
            info!("Run finished with exit code {}", code);
            std::process::exit(code);
        }
        Err(e) => {
            // Log the full error for debugging
            error!("Run failed before execution: {:?}", e);

            eprintln!("Error: {}", e.user_message());
            std::process::exit(e.exit_code());
        }
    }
}
