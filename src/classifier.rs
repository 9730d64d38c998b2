use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Table;

/// Canonical per-game header names every stats table must carry.
const STATS_REQUIRED: [&str; 3] = ["Player", "G", "PTS"];

/// Headers that make a per-game table look more like one; they only rank
/// candidates that already pass the required set.
const STATS_SECONDARY: [&str; 17] = [
    "GS", "MP", "FG", "FGA", "FG%", "3P", "3PA", "3P%", "FT", "FTA", "FT%", "TRB", "AST", "STL",
    "BLK", "TOV", "PF",
];

/// Roster signature groups, matched case-insensitively. A group counts once.
const ROSTER_IDENTITY: &[&str] = &["class", "pos", "position", "ht", "hgt", "height"];
const ROSTER_GROUPS: &[&[&str]] = &[
    &["class"],
    &["pos", "position"],
    &["ht", "hgt", "height"],
    &["wt", "weight"],
    &["#"],
    &["hometown"],
];

/// Aggregate rows injected by the source format.
const FOOTER_LABELS: [&str; 4] = ["Team", "Team Totals", "Opponents", "Opponent"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Stats,
    Roster,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Stats => f.write_str("per-game stats"),
            TableKind::Roster => f.write_str("roster"),
        }
    }
}

/// One individual's per-game line, tagged with where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedStatsRow {
    pub team_slug: String,
    pub season: i64,
    pub player: String,
    pub games: Option<i64>,
    pub games_started: Option<i64>,
    pub minutes: Option<f64>,
    pub points: Option<f64>,
    pub rebounds: Option<f64>,
    pub assists: Option<f64>,
    pub steals: Option<f64>,
    pub blocks: Option<f64>,
    pub fga: Option<f64>,
    pub fta: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    pub team_slug: String,
    pub season: i64,
    pub player: String,
    pub class_year: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub position: Option<String>,
}

/// Best per-game stats table, or `None` when no table carries
/// `Player`, `G` and `PTS` (case-sensitive).
pub fn classify_stats_table(tables: &[Table]) -> Option<&Table> {
    best_by_score(tables, TableKind::Stats)
}

/// Best roster table, or `None` when no table has a `player` column plus one
/// of class / position / height (case-insensitive).
pub fn classify_roster_table(tables: &[Table]) -> Option<&Table> {
    best_by_score(tables, TableKind::Roster)
}

/// Signature score of a table for `kind`; `None` when the required headers are
/// missing.
pub fn score_table(table: &Table, kind: TableKind) -> Option<usize> {
    match kind {
        TableKind::Stats => {
            let has_required = STATS_REQUIRED.iter().all(|h| has_header(table, h));
            if !has_required {
                return None;
            }
            let secondary = STATS_SECONDARY
                .iter()
                .filter(|h| has_header(table, h))
                .count();
            Some(STATS_REQUIRED.len() + secondary)
        }
        TableKind::Roster => {
            let lower: Vec<String> = table
                .headers
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect();
            if !lower.iter().any(|h| h == "player") {
                return None;
            }
            if !lower.iter().any(|h| ROSTER_IDENTITY.contains(&h.as_str())) {
                return None;
            }
            let groups = ROSTER_GROUPS
                .iter()
                .filter(|group| lower.iter().any(|h| group.contains(&h.as_str())))
                .count();
            Some(1 + groups)
        }
    }
}

fn has_header(table: &Table, name: &str) -> bool {
    table.column_index(name).is_some()
}

/// Highest score wins; equal scores keep the earliest table.
fn best_by_score(tables: &[Table], kind: TableKind) -> Option<&Table> {
    let mut best: Option<(usize, &Table)> = None;
    for table in tables {
        let Some(score) = score_table(table, kind) else {
            continue;
        };
        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, table));
        }
    }
    best.map(|(_, t)| t)
}

pub fn is_footer_label(name: &str) -> bool {
    FOOTER_LABELS.contains(&name.trim())
}

/// Typed rows of a stats table, footer and blank-name rows removed.
pub fn stats_rows(table: &Table, team_slug: &str, season: i64) -> Vec<ClassifiedStatsRow> {
    table
        .rows
        .iter()
        .filter_map(|row| stats_row(table, row, team_slug, season))
        .collect()
}

pub fn stats_row(
    table: &Table,
    row: &[String],
    team_slug: &str,
    season: i64,
) -> Option<ClassifiedStatsRow> {
    let player = table.cell(row, "Player")?.trim();
    if player.is_empty() || is_footer_label(player) {
        return None;
    }
    let num = |name: &str| table.cell(row, name).and_then(parse_number);
    Some(ClassifiedStatsRow {
        team_slug: team_slug.to_string(),
        season,
        player: player.to_string(),
        games: num("G").map(|v| v.round() as i64),
        games_started: num("GS").map(|v| v.round() as i64),
        minutes: num("MP"),
        points: num("PTS"),
        rebounds: num("TRB"),
        assists: num("AST"),
        steals: num("STL"),
        blocks: num("BLK"),
        fga: num("FGA"),
        fta: num("FTA"),
        fg_pct: num("FG%"),
        three_pct: num("3P%"),
        ft_pct: num("FT%"),
    })
}

pub fn roster_rows(table: &Table, team_slug: &str, season: i64) -> Vec<RosterRow> {
    table
        .rows
        .iter()
        .filter_map(|row| roster_row(table, row, team_slug, season))
        .collect()
}

pub fn roster_row(table: &Table, row: &[String], team_slug: &str, season: i64) -> Option<RosterRow> {
    let text = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| table.column_index_ci(n))
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };
    let player = text(&["player"])?;
    if is_footer_label(&player) {
        return None;
    }
    Some(RosterRow {
        team_slug: team_slug.to_string(),
        season,
        player,
        class_year: text(&["class"]),
        height: text(&["ht", "hgt", "height"]),
        weight: text(&["wt", "weight"]),
        position: text(&["pos", "position"]),
    })
}

/// Lenient numeric parse; blanks and dashes are absent, not zero.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_end_matches('%').replace(',', "");
    if s.is_empty() || s == "-" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn stats_table_found_regardless_of_position() {
        let target = table(&["Player", "G", "PTS"], &[]);
        let other_a = table(&["Player", "Class"], &[]);
        let other_b = table(&["Rk", "School", "W"], &[]);

        for order in [
            vec![target.clone(), other_a.clone(), other_b.clone()],
            vec![other_a.clone(), target.clone(), other_b.clone()],
            vec![other_a.clone(), other_b.clone(), target.clone()],
        ] {
            assert_eq!(classify_stats_table(&order), Some(&target));
        }
    }

    #[test]
    fn stats_table_not_found_without_full_signature() {
        let tables = vec![
            table(&["Player", "G"], &[]),
            table(&["Player", "PTS"], &[]),
            table(&["player", "g", "pts"], &[]),
        ];
        assert!(classify_stats_table(&tables).is_none());
    }

    #[test]
    fn richer_signature_beats_document_order() {
        let thin = table(&["Player", "G", "PTS"], &[]);
        let rich = table(&["Player", "G", "GS", "MP", "FGA", "FG%", "PTS"], &[]);
        let tables = vec![thin, rich.clone()];
        assert_eq!(classify_stats_table(&tables), Some(&rich));
    }

    #[test]
    fn equal_scores_keep_document_order() {
        let first = table(&["Player", "G", "PTS", "TRB"], &[&["A", "1", "2", "3"]]);
        let second = table(&["Player", "G", "PTS", "AST"], &[&["B", "1", "2", "3"]]);
        let tables = vec![first.clone(), second];
        assert_eq!(classify_stats_table(&tables), Some(&first));
    }

    #[test]
    fn roster_table_is_case_insensitive() {
        let stats = table(&["Player", "G", "PTS"], &[]);
        let roster = table(&["PLAYER", "#", "Pos", "Ht", "Wt"], &[]);
        let tables = vec![stats, roster.clone()];
        assert_eq!(classify_roster_table(&tables), Some(&roster));

        let only_weight = vec![table(&["Player", "Wt"], &[])];
        assert!(classify_roster_table(&only_weight).is_none());
    }

    #[test]
    fn footer_and_blank_rows_are_dropped() {
        let t = table(
            &["Player", "G", "PTS", "FGA", "FTA", "3P%"],
            &[
                &["Jane Doe", "30", "18.5", "14.0", "5.0", ".381"],
                &["", "30", "1", "", "", ""],
                &["Team Totals", "30", "75.0", "", "", ""],
                &["Opponent", "30", "66.0", "", "", ""],
                &["John Roe", "12", "", "-", "", ""],
            ],
        );
        let rows = stats_rows(&t, "duke", 2025);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player, "Jane Doe");
        assert_eq!(rows[0].games, Some(30));
        assert_eq!(rows[0].three_pct, Some(0.381));
        assert_eq!(rows[1].points, None);
        assert_eq!(rows[1].fga, None);
        assert!(rows.iter().all(|r| r.team_slug == "duke" && r.season == 2025));
    }

    #[test]
    fn roster_row_reads_aliases() {
        let t = table(
            &["Player", "Class", "Position", "Height", "Weight"],
            &[&["Jane Doe", "SR", "G", "6-2", "180"], &["Team", "", "", "", ""]],
        );
        let rows = roster_rows(&t, "unc", 2024);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].class_year.as_deref(), Some("SR"));
        assert_eq!(rows[0].position.as_deref(), Some("G"));
        assert_eq!(rows[0].height.as_deref(), Some("6-2"));
        assert_eq!(rows[0].weight.as_deref(), Some("180"));
    }
}
