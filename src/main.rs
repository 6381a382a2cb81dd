//! `train_classifier` binary

use clap::Parser;
use disaster_triage::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout keeps the progress lines and reports
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disaster_triage=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)?;

    Ok(())
}
