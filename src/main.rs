use ai_news_tweet::{cli, config};
use anyhow::Result;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging (stderr, stdout carries the tweet)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ai_news_tweet=info".parse()?),
        )
        .init();

    let args = cli::Args::parse();

    info!("Starting tweet formatting");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    let outcome = cli::run(&args, &config).await?;
    println!("{}", cli::render(&outcome, args.json)?);

    Ok(())
}
