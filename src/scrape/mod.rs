// src/scrape/mod.rs
use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::{extract, fetch, kinds::TableKind, normalize::normalize, store};

/// Concurrent team-page fetches per league run.
const MAX_CONCURRENT_TEAMS: usize = 5;

/// Derive a display name from a squad URL:
/// ".../squads/18bb7c10/Manchester-City-Stats" → "Manchester City".
pub fn team_name_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .unwrap_or_default()
        .split("-Stats")
        .next()
        .unwrap_or_default()
        .replace('-', " ")
}

/// Scrape one team page: extract its tables, normalize each against the
/// fixed kind list, and write one CSV per kind under `base_dir/<team>/`.
///
/// A table that fails to normalize is reported and skipped without
/// affecting the team's other tables.
#[instrument(level = "info", skip(client, base_dir))]
pub async fn scrape_team(client: &Client, team_url: &str, base_dir: &Path) -> Result<()> {
    let html = fetch::fetch_page(client, team_url).await?;
    let tables = extract::parse_tables(&html);
    if tables.is_empty() {
        warn!("no tables found at {}", team_url);
        return Ok(());
    }

    let team = team_name_from_url(team_url);
    let team_dir = base_dir.join(&team);
    fs::create_dir_all(&team_dir)
        .with_context(|| format!("creating team directory {:?}", team_dir))?;

    for (i, kind) in TableKind::ALL.iter().enumerate() {
        let Some(raw) = tables.get(i) else {
            warn!(team = %team, table = %kind, "table not found on page");
            continue;
        };
        match normalize(raw) {
            Ok(flat) => {
                kind.check_schema(&flat);
                store::write_table(team_dir.join(kind.file_name()), &flat)
                    .with_context(|| format!("saving {} for {}", kind, team))?;
            }
            Err(e) => warn!(team = %team, table = %kind, "skipping malformed table: {:#}", e),
        }
    }

    info!(team = %team, "data saved");
    Ok(())
}

/// Scrape every team of a league into `base_dir`, fetching team pages with
/// bounded concurrency. A failed team is reported and does not abort the
/// others.
pub async fn scrape_league(
    client: &Client,
    league_url: &str,
    num_teams: usize,
    base_dir: &Path,
) -> Result<()> {
    let team_urls = fetch::urls::fetch_team_urls(client, league_url, num_teams).await?;
    if team_urls.is_empty() {
        warn!("no team links found at {}", league_url);
        return Ok(());
    }
    info!("{} team pages to scrape", team_urls.len());

    let sem = Arc::new(Semaphore::new(MAX_CONCURRENT_TEAMS));
    let mut handles = Vec::with_capacity(team_urls.len());

    for url in team_urls {
        let client = client.clone();
        let base_dir = base_dir.to_path_buf();
        let sem = sem.clone();

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            if let Err(e) = scrape_team(&client, &url, &base_dir).await {
                error!("{} failed: {:#}", url, e);
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

/// Scrape the league summary table (the first table on the league page)
/// and write it as `<base_dir>/<league>/<league>_stats.csv`.
pub async fn save_league_stats(
    client: &Client,
    league: &str,
    league_url: &str,
    base_dir: &Path,
) -> Result<PathBuf> {
    let html = fetch::fetch_page(client, league_url).await?;
    let tables = extract::parse_tables(&html);
    let Some(first) = tables.first() else {
        bail!("no tables found at {}", league_url);
    };
    let flat = normalize(first)?;

    let path = base_dir
        .join(league)
        .join(format!("{}_stats.csv", league));
    store::write_table(&path, &flat)?;
    info!("league table saved to {}", path.display());
    Ok(path)
}
