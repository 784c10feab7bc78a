// src/kinds.rs
use std::fmt;

use crate::normalize::FlatTable;
use tracing::warn;

/// The statistics tables published on a squad page, in page order.
///
/// The position of a table on the page is what binds it to a kind; the enum
/// makes that binding, the output file names, and the per-kind key field
/// explicit instead of relying on bare list indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Players,
    Matches,
    Goalkeepers,
    AdvancedGoalkeeping,
    Shooting,
    Passing,
    PassTypes,
    GoalShotCreation,
    DefensiveActions,
    Possession,
    PlayingTime,
    MiscellaneousStats,
}

impl TableKind {
    /// Page order on a squad statistics page.
    pub const ALL: [TableKind; 12] = [
        TableKind::Players,
        TableKind::Matches,
        TableKind::Goalkeepers,
        TableKind::AdvancedGoalkeeping,
        TableKind::Shooting,
        TableKind::Passing,
        TableKind::PassTypes,
        TableKind::GoalShotCreation,
        TableKind::DefensiveActions,
        TableKind::Possession,
        TableKind::PlayingTime,
        TableKind::MiscellaneousStats,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::Players => "players.csv",
            TableKind::Matches => "matches.csv",
            TableKind::Goalkeepers => "goalkeepers.csv",
            TableKind::AdvancedGoalkeeping => "advanced_goalkeeping.csv",
            TableKind::Shooting => "shooting.csv",
            TableKind::Passing => "passing.csv",
            TableKind::PassTypes => "pass_types.csv",
            TableKind::GoalShotCreation => "g_e_s_creation.csv",
            TableKind::DefensiveActions => "defensive_actions.csv",
            TableKind::Possession => "possession.csv",
            TableKind::PlayingTime => "playing_time.csv",
            TableKind::MiscellaneousStats => "miscellaneous_stats.csv",
        }
    }

    /// The column that identifies individual entities in this kind of table,
    /// if the aggregation step consumes it. Only player tables carry one.
    pub fn key_field(self) -> Option<&'static str> {
        match self {
            TableKind::Players => Some("Player"),
            _ => None,
        }
    }

    /// Check a normalized table against this kind's expected key field.
    /// A mismatch is reported but never fatal.
    pub fn check_schema(self, table: &FlatTable) -> bool {
        match self.key_field() {
            Some(key) if table.column_index(key).is_none() => {
                warn!(kind = %self, key, "normalized table is missing its key field");
                false
            }
            _ => true,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stem = self
            .file_name()
            .strip_suffix(".csv")
            .unwrap_or_else(|| self.file_name());
        f.write_str(stem)
    }
}
