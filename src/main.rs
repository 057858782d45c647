//! Loan Risk Explainer - Main Entry Point

use clap::Parser;
use loan_risk_explainer::cli::{cmd_build_background, cmd_explain, cmd_inspect, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_risk_explainer=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host, config } => {
            cmd_serve(host, port, config.as_deref()).await?;
        }
        Commands::Explain { config, record, json } => {
            cmd_explain(config.as_deref(), record.as_deref(), json)?;
        }
        Commands::BuildBackground { data, output, config } => {
            cmd_build_background(&data, &output, config.as_deref())?;
        }
        Commands::Inspect { config } => {
            cmd_inspect(config.as_deref())?;
        }
    }

    Ok(())
}
