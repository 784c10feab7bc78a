use anyhow::{Context, Result};
use fbscout::{combine, fetch, scrape};
use std::{env, fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,fbscout=info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();
    info!("startup");

    // ─── 2) parse arguments ──────────────────────────────────────────
    const USAGE: &str = "usage: fbscout <league> <league-url> <num-teams> <season>";
    let mut args = env::args().skip(1);
    let league = args.next().context(USAGE)?;
    let league_url = args.next().context(USAGE)?;
    let num_teams: usize = args
        .next()
        .context(USAGE)?
        .parse()
        .context("<num-teams> must be a number")?;
    let season = args.next().context(USAGE)?;

    // ─── 3) configure dirs ───────────────────────────────────────────
    let season_dir = PathBuf::from(&season);
    let league_dir = season_dir.join(&league);
    fs::create_dir_all(&league_dir)?;

    // ─── 4) scrape every team of the league ──────────────────────────
    let client = fetch::client()?;
    info!(league = %league, "scraping {} teams → {}", num_teams, league_dir.display());
    scrape::scrape_league(&client, &league_url, num_teams, &league_dir).await?;

    // ─── 5) combine per-team players files ───────────────────────────
    let combined = combine::run_single(&season_dir, &league)?;
    info!("combined players file at {}", combined.display());

    info!("all done");
    Ok(())
}
