use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info, warn};

use crate::classifier::{ClassifiedStatsRow, RosterRow};
use crate::config::TeamRecord;
use crate::interchange;
use crate::model::{Player, SeasonStat, Team};
use crate::store::Store;

/// Free throws cost a fraction of a possession.
const FTA_POSSESSION_WEIGHT: f64 = 0.44;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonIngestSummary {
    pub season: i64,
    pub rows_seen: usize,
    pub players_inserted: usize,
    pub stats_inserted: usize,
    /// Rows whose team slug is not in the master list.
    pub rows_dropped: usize,
    pub unknown_teams: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub seasons: Vec<SeasonIngestSummary>,
    pub seasons_skipped: Vec<i64>,
}

/// `points / (2 * (fga + 0.44 * fta))`, 0 when there were no attempts.
pub fn true_shooting_pct(points: f64, fga: f64, fta: f64) -> f64 {
    let attempts = fga + FTA_POSSESSION_WEIGHT * fta;
    if attempts > 0.0 {
        points / (2.0 * attempts)
    } else {
        0.0
    }
}

/// Insert-or-ignore the master team list; returns how many were new.
pub fn upsert_teams(store: &mut Store, teams: &[TeamRecord]) -> Result<usize> {
    let tx = store
        .conn_mut()
        .transaction()
        .context("begin team transaction")?;
    let mut inserted = 0usize;
    for team in teams {
        inserted += tx
            .execute(
                "INSERT OR IGNORE INTO teams (slug, name, conference) VALUES (?1, ?2, ?3)",
                params![team.slug.trim(), team.name, team.conference],
            )
            .with_context(|| format!("insert team {}", team.slug))?;
    }
    tx.commit().context("commit team transaction")?;
    info!(inserted, total = teams.len(), "team master list loaded");
    Ok(inserted)
}

pub fn team_id_by_slug(conn: &Connection, slug: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT team_id FROM teams WHERE slug = ?1",
        params![slug],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("lookup team {slug}"))
}

/// Ingest one season's classified rows inside a single transaction.
///
/// Players are insert-or-ignore on `(full_name, team_id, season)` and a
/// player receives a stat line only if it has none for the season yet, so
/// re-running a season never duplicates rows.
pub fn ingest_season(
    store: &mut Store,
    season: i64,
    stats: &[ClassifiedStatsRow],
    roster: &[RosterRow],
) -> Result<SeasonIngestSummary> {
    let started_at = Utc::now().to_rfc3339();
    let roster_index: HashMap<(&str, &str), &RosterRow> = roster
        .iter()
        .fold(HashMap::new(), |mut acc, r| {
            acc.entry((r.team_slug.as_str(), r.player.as_str()))
                .or_insert(r);
            acc
        });

    let mut summary = SeasonIngestSummary {
        season,
        rows_seen: stats.len(),
        ..SeasonIngestSummary::default()
    };
    let mut team_cache: HashMap<String, Option<i64>> = HashMap::new();

    let tx = store
        .conn_mut()
        .transaction()
        .context("begin season transaction")?;

    for row in stats {
        let team_id = match team_cache.get(&row.team_slug) {
            Some(id) => *id,
            None => {
                let id = team_id_by_slug(&tx, &row.team_slug)?;
                team_cache.insert(row.team_slug.clone(), id);
                id
            }
        };
        let Some(team_id) = team_id else {
            summary.rows_dropped += 1;
            if !summary.unknown_teams.contains(&row.team_slug) {
                summary.unknown_teams.push(row.team_slug.clone());
            }
            continue;
        };

        let enrichment = roster_index
            .get(&(row.team_slug.as_str(), row.player.as_str()))
            .copied();
        summary.players_inserted += insert_player(&tx, row, team_id, season, enrichment)?;
        let player_id = player_id_for(&tx, &row.player, team_id, season)?;
        summary.stats_inserted += insert_season_stat(&tx, player_id, season, row)?;
    }

    tx.execute(
        "INSERT INTO ingest_runs(season, started_at, finished_at, rows_seen, players_inserted, stats_inserted, rows_dropped)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            season,
            started_at,
            Utc::now().to_rfc3339(),
            summary.rows_seen as i64,
            summary.players_inserted as i64,
            summary.stats_inserted as i64,
            summary.rows_dropped as i64,
        ],
    )
    .context("record ingest run")?;
    tx.commit().context("commit season transaction")?;

    if !summary.unknown_teams.is_empty() {
        debug!(season, teams = ?summary.unknown_teams, "rows for teams outside the master list dropped");
    }
    info!(
        season,
        rows = summary.rows_seen,
        players = summary.players_inserted,
        stats = summary.stats_inserted,
        dropped = summary.rows_dropped,
        "season ingested"
    );
    Ok(summary)
}

fn insert_player(
    tx: &Transaction<'_>,
    row: &ClassifiedStatsRow,
    team_id: i64,
    season: i64,
    roster: Option<&RosterRow>,
) -> Result<usize> {
    tx.execute(
        r#"
        INSERT OR IGNORE INTO players (full_name, team_id, season, class_year, height, weight, position)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            row.player,
            team_id,
            season,
            roster.and_then(|r| r.class_year.as_deref()),
            roster.and_then(|r| r.height.as_deref()),
            roster.and_then(|r| r.weight.as_deref()),
            roster.and_then(|r| r.position.as_deref()),
        ],
    )
    .with_context(|| format!("insert player {}", row.player))
}

fn player_id_for(tx: &Transaction<'_>, name: &str, team_id: i64, season: i64) -> Result<i64> {
    tx.query_row(
        "SELECT player_id FROM players WHERE full_name = ?1 AND team_id = ?2 AND season = ?3",
        params![name, team_id, season],
        |row| row.get(0),
    )
    .with_context(|| format!("resolve player id for {name}"))
}

fn insert_season_stat(
    tx: &Transaction<'_>,
    player_id: i64,
    season: i64,
    row: &ClassifiedStatsRow,
) -> Result<usize> {
    let ts_pct = true_shooting_pct(
        row.points.unwrap_or(0.0),
        row.fga.unwrap_or(0.0),
        row.fta.unwrap_or(0.0),
    );
    tx.execute(
        r#"
        INSERT INTO season_stats (
            player_id, season, games, games_started, minutes,
            points, rebounds, assists, steals, blocks,
            fg_pct, three_pct, ft_pct, true_shooting_pct
        )
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
        WHERE NOT EXISTS (
            SELECT 1 FROM season_stats WHERE player_id = ?1 AND season = ?2
        )
        "#,
        params![
            player_id,
            season,
            row.games,
            row.games_started,
            row.minutes,
            row.points,
            row.rebounds,
            row.assists,
            row.steals,
            row.blocks,
            row.fg_pct,
            row.three_pct,
            row.ft_pct,
            ts_pct,
        ],
    )
    .with_context(|| format!("insert season stats for player {player_id}"))
}

/// Load every season found in the interchange directory, oldest first.
///
/// Each season commits on its own; a season without a stats file is skipped.
pub fn load_interchange(
    store: &mut Store,
    dir: &Path,
    season: Option<i64>,
    limit: Option<usize>,
) -> Result<LoadSummary> {
    let seasons = match season {
        Some(s) => vec![s],
        None => interchange::available_seasons(dir)?,
    };
    let mut summary = LoadSummary::default();
    for season in seasons {
        let Some(mut stats) = interchange::read_stats_rows(dir, season)? else {
            warn!(season, "no per-game file; season skipped");
            summary.seasons_skipped.push(season);
            continue;
        };
        if let Some(limit) = limit {
            stats.truncate(limit);
        }
        let roster = interchange::read_roster_rows(dir, season)?;
        summary
            .seasons
            .push(ingest_season(store, season, &stats, &roster)?);
    }
    Ok(summary)
}

pub fn list_teams(store: &Store) -> Result<Vec<Team>> {
    let mut stmt = store
        .conn()
        .prepare("SELECT team_id, slug, name, conference FROM teams ORDER BY team_id")
        .context("prepare teams query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Team {
                team_id: row.get(0)?,
                slug: row.get(1)?,
                name: row.get(2)?,
                conference: row.get(3)?,
            })
        })
        .context("query teams")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode team row")?);
    }
    Ok(out)
}

pub fn players_for_season(store: &Store, season: i64) -> Result<Vec<Player>> {
    let mut stmt = store
        .conn()
        .prepare(
            r#"
            SELECT player_id, full_name, team_id, season, class_year, height, weight,
                   position, global_player_id
            FROM players
            WHERE season = ?1
            ORDER BY player_id
            "#,
        )
        .context("prepare players query")?;
    let rows = stmt
        .query_map(params![season], |row| {
            Ok(Player {
                player_id: row.get(0)?,
                full_name: row.get(1)?,
                team_id: row.get(2)?,
                season: row.get(3)?,
                class_year: row.get(4)?,
                height: row.get(5)?,
                weight: row.get(6)?,
                position: row.get(7)?,
                global_player_id: row.get(8)?,
            })
        })
        .context("query players")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player row")?);
    }
    Ok(out)
}

pub fn season_stats_for_player(store: &Store, player_id: i64) -> Result<Vec<SeasonStat>> {
    let mut stmt = store
        .conn()
        .prepare(
            r#"
            SELECT stat_id, player_id, season, games, games_started, minutes, points,
                   rebounds, assists, steals, blocks, fg_pct, three_pct, ft_pct,
                   true_shooting_pct
            FROM season_stats
            WHERE player_id = ?1
            ORDER BY stat_id
            "#,
        )
        .context("prepare season stats query")?;
    let rows = stmt
        .query_map(params![player_id], |row| {
            Ok(SeasonStat {
                stat_id: row.get(0)?,
                player_id: row.get(1)?,
                season: row.get(2)?,
                games: row.get(3)?,
                games_started: row.get(4)?,
                minutes: row.get(5)?,
                points: row.get(6)?,
                rebounds: row.get(7)?,
                assists: row.get(8)?,
                steals: row.get(9)?,
                blocks: row.get(10)?,
                fg_pct: row.get(11)?,
                three_pct: row.get(12)?,
                ft_pct: row.get(13)?,
                true_shooting_pct: row.get::<_, Option<f64>>(14)?.unwrap_or(0.0),
            })
        })
        .context("query season stats")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode season stat row")?);
    }
    Ok(out)
}
