mod cli;

use clap::Parser;
use cli::Cli;
use giveaway_engine::{load_banned_list, EligibilityFilter, GiveawayRun, KeyPool, SessionStore};
use reddit_client::{RedditAuthConfig, RedditPlatform};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let sessions = SessionStore::new(cli.session_file.clone());
    let config = match sessions.load()? {
        Some(session) if confirm_resume()? => {
            info!("Loading in data from {}", sessions.path().display());
            cli.config_from_session(&session, chrono::Utc::now())
        }
        _ => cli.to_config()?,
    };
    config.validate()?;

    let pool = KeyPool::load(&config.keyfile, true)?;
    let banned = load_banned_list(&cli.banned_list)?;
    let filter = EligibilityFilter::new(banned);

    let auth = RedditAuthConfig::from_env()?;
    let platform = Arc::new(RedditPlatform::new(auth));

    let summary = GiveawayRun::new(config, platform, pool, filter, sessions)
        .run()
        .await?;

    info!(
        "Prizes are all distributed: {} keys awarded over {} polls. Exiting.",
        summary.awarded, summary.polls
    );
    Ok(())
}

fn confirm_resume() -> io::Result<bool> {
    print!("Resume data detected. Resume previous giveaway? [Y/n]: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}
