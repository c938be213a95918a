use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use release_watchbot::config;
use release_watchbot::discord::DiscordClient;
use release_watchbot::github::GithubClient;
use release_watchbot::poller::ReleasePoller;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let feed = GithubClient::new(cfg.github.token.clone());
    let sink = DiscordClient::new(cfg.discord.bot_token.clone());

    let poller = ReleasePoller::new(
        cfg.repo(),
        cfg.discord.channel_id.clone(),
        Duration::from_millis(cfg.app.poll_interval_ms),
    );

    info!(repo = %cfg.repo(), "starting release watchbot");
    poller.run(&feed, &sink).await;

    Ok(())
}
