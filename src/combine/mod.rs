// src/combine/mod.rs
use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};

use crate::kinds::TableKind;
use crate::normalize::FlatTable;
use crate::store;

/// Leagues covered by the full aggregation run, in output order.
pub const LEAGUES: &[&str] = &["EPL", "Serie A", "Bundesliga", "Ligue 1", "La Liga"];

pub const LEAGUE_FIELD: &str = "League";
pub const TEAM_FIELD: &str = "Team";

/// Subtotal rows published alongside real players. Matched case-insensitively
/// as substrings of the `Player` value.
const SUBTOTAL_MARKERS: &[&str] = &["squad total", "opponent total"];

/// True for subtotal rows that must not appear in combined output.
pub fn is_subtotal(player: &str) -> bool {
    let player = player.to_lowercase();
    SUBTOTAL_MARKERS.iter().any(|m| player.contains(m))
}

/// Append-only builder for the combined table. Columns are the union of all
/// source columns in first-seen order; rows already pushed are backfilled
/// with empty values when a later source introduces a new column.
struct CombinedBuilder {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CombinedBuilder {
    fn new() -> Self {
        CombinedBuilder {
            columns: Vec::new(),
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn width(&self) -> usize {
        self.columns.len()
    }

    fn column(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), i);
        for row in &mut self.rows {
            row.push(String::new());
        }
        i
    }

    fn into_table(self) -> FlatTable {
        FlatTable {
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Fold one team's table into the combined set: drop subtotal rows, map the
/// surviving rows onto the union column set, and stamp `League`/`Team`
/// provenance (overriding any same-named source columns).
fn append_source(out: &mut CombinedBuilder, league: &str, team: &str, table: &FlatTable) {
    let player_idx = table.column_index("Player");
    if player_idx.is_none() && !table.rows.is_empty() {
        warn!(team, "source has no Player column; keeping all rows");
    }

    let mapping: Vec<Option<usize>> = table
        .columns
        .iter()
        .map(|c| {
            if c == LEAGUE_FIELD || c == TEAM_FIELD {
                None
            } else {
                Some(out.column(c))
            }
        })
        .collect();
    let league_col = out.column(LEAGUE_FIELD);
    let team_col = out.column(TEAM_FIELD);

    for row in &table.rows {
        if let Some(i) = player_idx {
            if row.get(i).is_some_and(|p| is_subtotal(p)) {
                continue;
            }
        }
        let mut rec = vec![String::new(); out.width()];
        for (value, target) in row.iter().zip(&mapping) {
            if let Some(i) = target {
                rec[*i] = value.clone();
            }
        }
        rec[league_col] = league.to_string();
        rec[team_col] = team.to_string();
        out.rows.push(rec);
    }
}

/// Combine in-memory per-team tables for one league, in the given order.
pub fn combine_records(sources: &[(String, FlatTable)], league: &str) -> FlatTable {
    let mut out = CombinedBuilder::new();
    for (team, table) in sources {
        append_source(&mut out, league, team, table);
    }
    out.into_table()
}

/// List the team directories under a league directory, sorted by name so
/// aggregation order does not depend on filesystem iteration order.
pub fn team_dirs(league_dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(league_dir)
        .with_context(|| format!("listing league directory {:?}", league_dir))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Read each team's players file under `base_dir/league` and fold it into
/// `out`. Missing files are skipped; unreadable files are reported and
/// skipped. Neither aborts the run.
fn append_league(out: &mut CombinedBuilder, base_dir: &Path, league: &str, teams: &[String]) {
    for team in teams {
        let path = base_dir
            .join(league)
            .join(team)
            .join(TableKind::Players.file_name());
        if !path.is_file() {
            debug!(league, team = %team, "no players file; skipping");
            continue;
        }
        match store::read_table(&path) {
            Ok(table) => append_source(out, league, team, &table),
            Err(e) => error!("error reading {}: {:#}", path.display(), e),
        }
    }
}

/// Combine the players files of the given teams in one league, in the given
/// team order.
pub fn combine_league(base_dir: &Path, league: &str, teams: &[String]) -> FlatTable {
    let mut out = CombinedBuilder::new();
    append_league(&mut out, base_dir, league, teams);
    out.into_table()
}

/// Combine the players files of every team across the given leagues, in the
/// given league order. A missing league directory is reported and skipped.
pub fn combine_leagues(base_dir: &Path, leagues: &[&str]) -> FlatTable {
    let mut out = CombinedBuilder::new();
    for &league in leagues {
        let league_dir = base_dir.join(league);
        if !league_dir.is_dir() {
            warn!(league, "league directory does not exist; skipping");
            continue;
        }
        match team_dirs(&league_dir) {
            Ok(teams) => append_league(&mut out, base_dir, league, &teams),
            Err(e) => error!("error listing {}: {:#}", league_dir.display(), e),
        }
    }
    out.into_table()
}

/// Combine one league and write `combined_players_stats_<league>.csv` into
/// its directory. Returns the output path.
pub fn run_single(base_dir: &Path, league: &str) -> Result<PathBuf> {
    let league_dir = base_dir.join(league);
    let teams = if league_dir.is_dir() {
        team_dirs(&league_dir)?
    } else {
        warn!(league, "league directory does not exist");
        Vec::new()
    };

    let combined = combine_league(base_dir, league, &teams);
    let path = league_dir.join(format!("combined_players_stats_{}.csv", league));
    store::write_table(&path, &combined)?;
    info!(
        rows = combined.rows.len(),
        "combined data saved to {}",
        path.display()
    );
    Ok(path)
}

/// Combine every league under `base_dir` and write
/// `combined_players_stats.csv` at its root. Returns the output path.
pub fn run_all(base_dir: &Path, leagues: &[&str]) -> Result<PathBuf> {
    let combined = combine_leagues(base_dir, leagues);
    let path = base_dir.join("combined_players_stats.csv");
    store::write_table(&path, &combined)?;
    info!(
        rows = combined.rows.len(),
        "combined data saved to {}",
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ColumnHeader, RawTable};
    use crate::normalize::normalize;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,fbscout::combine=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn players(rows: &[&[&str]]) -> FlatTable {
        FlatTable {
            columns: vec!["Player".into(), "Performance Gls".into()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn subtotal_markers_match_case_insensitively() {
        assert!(is_subtotal("Squad Total"));
        assert!(is_subtotal("SQUAD TOTAL"));
        assert!(is_subtotal("Opponent Total"));
        assert!(is_subtotal("17 opponent total rows"));
        assert!(!is_subtotal("Smith"));
        assert!(!is_subtotal(""));
    }

    #[test]
    fn normalized_table_through_aggregation() {
        // Two-level header straight off a squad page, then aggregation.
        init_test_logging();
        let raw = RawTable {
            header: vec![
                ColumnHeader {
                    levels: vec![None, Some("Player".into())],
                },
                ColumnHeader {
                    levels: vec![Some("Performance".into()), Some("Gls".into())],
                },
            ],
            rows: vec![
                vec![Some("Smith".into()), Some("5".into())],
                vec![Some("Squad Total".into()), Some("42".into())],
            ],
        };
        let flat = normalize(&raw).unwrap();
        assert_eq!(flat.columns, vec!["Player", "Performance Gls"]);
        assert_eq!(flat.rows.len(), 2);

        let combined = combine_records(&[("Arsenal".to_string(), flat)], "EPL");
        assert_eq!(
            combined.columns,
            vec!["Player", "Performance Gls", "League", "Team"]
        );
        assert_eq!(combined.rows, vec![vec!["Smith", "5", "EPL", "Arsenal"]]);
    }

    #[test]
    fn excludes_both_subtotal_kinds() {
        let table = players(&[
            &["Smith", "5"],
            &["Squad Total", "42"],
            &["opponent total", "38"],
            &["Jones", "1"],
        ]);
        let combined = combine_records(&[("Arsenal".to_string(), table)], "EPL");
        let names: Vec<&str> = combined.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["Smith", "Jones"]);
    }

    #[test]
    fn provenance_overrides_source_fields() {
        let table = FlatTable {
            columns: vec!["Player".into(), "League".into(), "Team".into()],
            rows: vec![vec!["Smith".into(), "stale".into(), "stale".into()]],
        };
        let combined = combine_records(&[("Arsenal".to_string(), table)], "EPL");
        assert_eq!(combined.columns, vec!["Player", "League", "Team"]);
        assert_eq!(combined.rows, vec![vec!["Smith", "EPL", "Arsenal"]]);
    }

    #[test]
    fn missing_player_column_keeps_all_rows() {
        init_test_logging();
        let table = FlatTable {
            columns: vec!["Squad".into()],
            rows: vec![vec!["Squad Total".into()]],
        };
        let combined = combine_records(&[("Arsenal".to_string(), table)], "EPL");
        assert_eq!(combined.rows.len(), 1);
        assert_eq!(combined.rows[0], vec!["Squad Total", "EPL", "Arsenal"]);
    }

    #[test]
    fn column_union_backfills_empty_values() {
        let a = players(&[&["Smith", "5"]]);
        let b = FlatTable {
            columns: vec!["Player".into(), "Expected xG".into()],
            rows: vec![vec!["Jones".into(), "0.7".into()]],
        };
        let combined = combine_records(
            &[("Arsenal".to_string(), a), ("Chelsea".to_string(), b)],
            "EPL",
        );
        assert_eq!(
            combined.columns,
            vec!["Player", "Performance Gls", "League", "Team", "Expected xG"]
        );
        // Smith predates the xG column; Jones never had Gls.
        assert_eq!(combined.rows[0], vec!["Smith", "5", "EPL", "Arsenal", ""]);
        assert_eq!(combined.rows[1], vec!["Jones", "", "EPL", "Chelsea", "0.7"]);
    }

    #[test]
    fn missing_team_file_is_skipped() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let base = dir.path();

        store::write_table(
            base.join("EPL/TeamA/players.csv"),
            &players(&[&["Smith", "5"], &["Squad Total", "42"]]),
        )?;
        fs::create_dir_all(base.join("EPL/TeamB"))?;

        let combined = combine_league(
            base,
            "EPL",
            &["TeamA".to_string(), "TeamB".to_string()],
        );
        assert_eq!(combined.rows.len(), 1);
        assert_eq!(combined.rows[0][0], "Smith");
        assert_eq!(combined.rows[0][3], "TeamA");
        Ok(())
    }

    #[test]
    fn unreadable_team_file_is_skipped() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let base = dir.path();

        store::write_table(
            base.join("EPL/TeamA/players.csv"),
            &players(&[&["Smith", "5"]]),
        )?;
        // Ragged row: more fields than the header, so the CSV reader rejects it.
        fs::create_dir_all(base.join("EPL/TeamB"))?;
        fs::write(
            base.join("EPL/TeamB/players.csv"),
            "Player,Performance Gls\nJones,1,EXTRA,EXTRA\n",
        )?;

        let combined = combine_league(
            base,
            "EPL",
            &["TeamA".to_string(), "TeamB".to_string()],
        );
        assert_eq!(combined.rows.len(), 1);
        assert_eq!(combined.rows[0][0], "Smith");
        assert_eq!(combined.rows[0][3], "TeamA");
        Ok(())
    }

    #[test]
    fn zero_sources_yield_empty_output_file() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path();
        fs::create_dir_all(base.join("EPL"))?;

        let path = run_single(base, "EPL")?;
        assert!(path.is_file());
        assert_eq!(fs::read_to_string(&path)?, "");
        Ok(())
    }

    #[test]
    fn leagues_concatenate_in_given_order() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path();

        store::write_table(
            base.join("Serie A/Milan/players.csv"),
            &players(&[&["Rossi", "3"]]),
        )?;
        store::write_table(
            base.join("EPL/Arsenal/players.csv"),
            &players(&[&["Smith", "5"]]),
        )?;

        let combined = combine_leagues(base, &["EPL", "Serie A", "Ligue 1"]);
        assert_eq!(combined.rows.len(), 2);
        assert_eq!(combined.rows[0][2..4], ["EPL", "Arsenal"]);
        assert_eq!(combined.rows[1][2..4], ["Serie A", "Milan"]);
        Ok(())
    }

    #[test]
    fn run_all_writes_combined_file() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path();
        store::write_table(
            base.join("EPL/Arsenal/players.csv"),
            &players(&[&["Smith", "5"], &["Squad Total", "42"]]),
        )?;

        let path = run_all(base, &["EPL"])?;
        let written = store::read_table(&path)?;
        assert_eq!(written.columns, vec!["Player", "Performance Gls", "League", "Team"]);
        assert_eq!(written.rows, vec![vec!["Smith", "5", "EPL", "Arsenal"]]);
        Ok(())
    }

    #[test]
    fn run_all_skips_absent_default_leagues() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path();
        store::write_table(
            base.join("EPL/Arsenal/players.csv"),
            &players(&[&["Smith", "5"]]),
        )?;
        store::write_table(
            base.join("La Liga/Barcelona/players.csv"),
            &players(&[&["Pedri", "4"]]),
        )?;

        // Only two of the default leagues exist; the rest are skipped.
        let path = run_all(base, LEAGUES)?;
        let written = store::read_table(&path)?;
        assert_eq!(written.rows.len(), 2);
        assert_eq!(written.rows[0][2..4], ["EPL", "Arsenal"]);
        assert_eq!(written.rows[1][2..4], ["La Liga", "Barcelona"]);
        Ok(())
    }

    #[test]
    fn team_dirs_are_sorted() -> Result<()> {
        let dir = tempdir()?;
        for team in ["Wolves", "Arsenal", "Chelsea"] {
            fs::create_dir_all(dir.path().join(team))?;
        }
        fs::write(dir.path().join("stray.csv"), "not a team")?;
        assert_eq!(team_dirs(dir.path())?, vec!["Arsenal", "Chelsea", "Wolves"]);
        Ok(())
    }
}
