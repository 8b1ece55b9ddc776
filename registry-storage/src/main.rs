use std::io::Write;

use bytes::Bytes;
use clap::Parser;
use registry_storage::config::validate_config;
use registry_storage::storage::open;
use registry_storage::utils::cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = validate_config(&cli.storage)?;
    let storage = open(&config.storage)?;

    match cli.command {
        Command::Kind => println!("{}", storage.kind()),
        Command::Put { key, file } => {
            let content = tokio::fs::read(&file).await?;
            let stored = storage.set_item(&key, Bytes::from(content)).await?;
            println!("{stored}");
            if !stored {
                std::process::exit(1);
            }
        }
        Command::Has { key } => println!("{}", storage.has_item(&key).await?),
        Command::Get { key, output } => {
            let content = storage.get_item(&key).await?;
            match output {
                Some(path) => tokio::fs::write(path, &content).await?,
                None => std::io::stdout().lock().write_all(&content)?,
            }
        }
    }
    Ok(())
}
