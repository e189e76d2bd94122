mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{handle_ask, handle_index, handle_status, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone();

    match cli.command {
        Commands::Index { path } => {
            handle_index(path, config_path.as_deref()).await?;
        }
        Commands::Ask {
            question,
            filter,
            stream,
            collection,
        } => {
            handle_ask(question, filter, stream, collection, config_path.as_deref()).await?;
        }
        Commands::Status { collection } => {
            handle_status(collection, config_path.as_deref())?;
        }
    }

    Ok(())
}
