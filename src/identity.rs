use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::{GlobalPlayerIdentity, PlayerBio};
use crate::store::{GLOBAL_PLAYERS, PLAYER_BIO, PLAYERS, Store};

pub const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BioRefreshSummary {
    pub upserted: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BirthdateSeedSummary {
    pub updated: usize,
    pub unknown_ids: Vec<String>,
    pub invalid_dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BirthdateEntry {
    pub global_player_id: String,
    pub birthdate: String,
}

/// Stamp `global_player_id = player_id` on rows that have none yet.
///
/// This is the local stand-in until an external identifier exists; rows that
/// already carry an id are left alone.
pub fn backfill_global_ids(store: &Store) -> Result<usize> {
    store.require_table(PLAYERS)?;
    let updated = store
        .conn()
        .execute(
            r#"
            UPDATE players
            SET global_player_id = CAST(player_id AS TEXT)
            WHERE global_player_id IS NULL OR global_player_id = ''
            "#,
            [],
        )
        .context("backfill global player ids")?;
    info!(updated, "global player ids backfilled");
    Ok(updated)
}

/// Add every global id stamped on players that the identity table lacks.
///
/// Set-difference insert; the canonical name is the one on the id's most
/// recent player row.
pub fn bootstrap_global_identities(store: &Store) -> Result<usize> {
    store.require_tables(&[PLAYERS, GLOBAL_PLAYERS])?;
    let inserted = store
        .conn()
        .execute(
            r#"
            INSERT INTO global_players (global_player_id, canonical_name)
            SELECT p.global_player_id,
                   (SELECT q.full_name FROM players q
                    WHERE q.global_player_id = p.global_player_id
                    ORDER BY q.season DESC, q.player_id DESC
                    LIMIT 1)
            FROM players p
            LEFT JOIN global_players g ON g.global_player_id = p.global_player_id
            WHERE p.global_player_id IS NOT NULL
              AND p.global_player_id != ''
              AND g.global_player_id IS NULL
            GROUP BY p.global_player_id
            "#,
            [],
        )
        .context("bootstrap global identities")?;
    let total = store.count_rows(GLOBAL_PLAYERS)?;
    info!(inserted, total, "global identity table updated");
    Ok(inserted)
}

/// Rebuild bio rows from each identity's latest player row.
///
/// Non-null values already on a bio row survive when the snapshot has a null
/// in that column, so seeded birthdates are never wiped by a refresh. Bio rows
/// whose identity no longer appears on any player are removed.
pub fn refresh_player_bio(store: &mut Store) -> Result<BioRefreshSummary> {
    store.require_tables(&[PLAYERS, GLOBAL_PLAYERS, PLAYER_BIO])?;
    let now = Utc::now().to_rfc3339();
    let tx = store
        .conn_mut()
        .transaction()
        .context("begin bio transaction")?;

    let removed = tx
        .execute(
            r#"
            DELETE FROM player_bio
            WHERE global_player_id NOT IN (
                SELECT global_player_id FROM players WHERE global_player_id IS NOT NULL
            )
            "#,
            [],
        )
        .context("remove orphaned bio rows")?;

    let upserted = tx
        .execute(
            r#"
            INSERT INTO player_bio (
                global_player_id, full_name, class_year, height, weight,
                primary_position, birthdate, updated_at
            )
            SELECT global_player_id, full_name, class_year, height, weight, position, NULL, ?1
            FROM (
                SELECT p.*,
                       ROW_NUMBER() OVER (
                           PARTITION BY p.global_player_id
                           ORDER BY p.season DESC, p.player_id DESC
                       ) AS rn
                FROM players p
                JOIN global_players g ON g.global_player_id = p.global_player_id
            )
            WHERE rn = 1
            ON CONFLICT(global_player_id) DO UPDATE SET
                full_name = excluded.full_name,
                class_year = COALESCE(excluded.class_year, player_bio.class_year),
                height = COALESCE(excluded.height, player_bio.height),
                weight = COALESCE(excluded.weight, player_bio.weight),
                primary_position = COALESCE(excluded.primary_position, player_bio.primary_position),
                birthdate = COALESCE(excluded.birthdate, player_bio.birthdate),
                updated_at = excluded.updated_at
            "#,
            params![now],
        )
        .context("upsert bio rows")?;

    tx.commit().context("commit bio transaction")?;
    info!(upserted, removed, "player bio refreshed");
    Ok(BioRefreshSummary { upserted, removed })
}

pub fn read_birthdates_csv(path: &Path) -> Result<Vec<BirthdateEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for entry in reader.deserialize::<BirthdateEntry>() {
        out.push(entry.with_context(|| format!("decode birthdate row in {}", path.display()))?);
    }
    Ok(out)
}

/// Write known birthdates onto existing bio rows.
pub fn seed_birthdates(store: &mut Store, entries: &[BirthdateEntry]) -> Result<BirthdateSeedSummary> {
    store.require_table(PLAYER_BIO)?;
    let now = Utc::now().to_rfc3339();
    let mut summary = BirthdateSeedSummary::default();
    let tx = store
        .conn_mut()
        .transaction()
        .context("begin birthdate transaction")?;
    for entry in entries {
        let Some(date) = parse_birthdate(&entry.birthdate) else {
            summary.invalid_dates.push(entry.global_player_id.clone());
            continue;
        };
        let changed = tx
            .execute(
                "UPDATE player_bio SET birthdate = ?1, updated_at = ?2 WHERE global_player_id = ?3",
                params![date.format(BIRTHDATE_FORMAT).to_string(), now, entry.global_player_id],
            )
            .with_context(|| format!("set birthdate for {}", entry.global_player_id))?;
        if changed == 0 {
            summary.unknown_ids.push(entry.global_player_id.clone());
        } else {
            summary.updated += changed;
        }
    }
    tx.commit().context("commit birthdate transaction")?;
    if !summary.unknown_ids.is_empty() || !summary.invalid_dates.is_empty() {
        warn!(
            unknown = summary.unknown_ids.len(),
            invalid = summary.invalid_dates.len(),
            "some birthdates were not applied"
        );
    }
    info!(updated = summary.updated, "birthdates seeded");
    Ok(summary)
}

pub fn parse_birthdate(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BIRTHDATE_FORMAT).ok()
}

pub fn list_identities(store: &Store) -> Result<Vec<GlobalPlayerIdentity>> {
    let mut stmt = store
        .conn()
        .prepare("SELECT global_player_id, canonical_name FROM global_players ORDER BY global_player_id")
        .context("prepare identities query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GlobalPlayerIdentity {
                global_player_id: row.get(0)?,
                canonical_name: row.get(1)?,
            })
        })
        .context("query identities")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode identity row")?);
    }
    Ok(out)
}

pub fn load_bio(store: &Store, global_player_id: &str) -> Result<Option<PlayerBio>> {
    store
        .conn()
        .query_row(
            r#"
            SELECT global_player_id, full_name, class_year, height, weight,
                   primary_position, birthdate, updated_at
            FROM player_bio
            WHERE global_player_id = ?1
            "#,
            params![global_player_id],
            |row| {
                Ok(PlayerBio {
                    global_player_id: row.get(0)?,
                    full_name: row.get(1)?,
                    class_year: row.get(2)?,
                    height: row.get(3)?,
                    weight: row.get(4)?,
                    primary_position: row.get(5)?,
                    birthdate: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            },
        )
        .optional()
        .with_context(|| format!("load bio {global_player_id}"))
}
