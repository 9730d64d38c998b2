use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::params;
use tracing::{info, warn};

use crate::features::PopulationStats;
use crate::identity::parse_birthdate;
use crate::model::AgeFeatureRecord;
use crate::store::{AGE_FEATURES, PLAYER_BIO, PLAYERS, Store};

/// z cutoffs for the young/old-for-level flags (inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeThresholds {
    pub young: f64,
    pub old: f64,
}

impl Default for AgeThresholds {
    fn default() -> Self {
        Self {
            young: -0.75,
            old: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonAgeSummary {
    pub season: i64,
    pub written: usize,
    pub mean_age: f64,
    pub std_dev: f64,
}

/// Fractional years between `birthdate` and July 1 of `season`.
pub fn age_at_season(birthdate: NaiveDate, season: i64) -> Option<f64> {
    let year = i32::try_from(season).ok()?;
    let reference = NaiveDate::from_ymd_opt(year, 7, 1)?;
    Some((reference - birthdate).num_days() as f64 / 365.25)
}

/// Age z-scores against one season's population.
///
/// Ages are keyed by global id so the output order is stable.
pub fn season_age_features(
    season: i64,
    ages: &BTreeMap<String, f64>,
    thresholds: AgeThresholds,
) -> (PopulationStats, Vec<AgeFeatureRecord>) {
    let values: Vec<f64> = ages.values().copied().collect();
    let stats = PopulationStats::of(&values);
    let records = ages
        .iter()
        .map(|(gid, age)| {
            let z = stats.zscore(*age);
            AgeFeatureRecord {
                global_player_id: gid.clone(),
                season,
                age_season: *age,
                age_zscore: z,
                is_young_for_level: z <= thresholds.young,
                is_old_for_level: z >= thresholds.old,
            }
        })
        .collect();
    (stats, records)
}

/// Compute and upsert age features for one season or every season on record.
///
/// Seasons without a single usable birthdate are skipped with a warning.
pub fn compute_age_features(
    store: &mut Store,
    season: Option<i64>,
    thresholds: AgeThresholds,
) -> Result<Vec<SeasonAgeSummary>> {
    store.require_tables(&[PLAYERS, PLAYER_BIO, AGE_FEATURES])?;
    let seasons = match season {
        Some(s) => vec![s],
        None => store.seasons()?,
    };

    let mut summaries = Vec::new();
    for season in seasons {
        let ages = season_ages(store, season)?;
        if ages.is_empty() {
            warn!(season, "no players with a usable birthdate; skipping season");
            continue;
        }
        let (stats, records) = season_age_features(season, &ages, thresholds);
        info!(
            season,
            n = stats.count,
            mean_age = stats.mean,
            std = stats.std_dev,
            "age population"
        );
        let written = upsert_age_features(store, &records)?;
        summaries.push(SeasonAgeSummary {
            season,
            written,
            mean_age: stats.mean,
            std_dev: stats.std_dev,
        });
    }
    Ok(summaries)
}

fn season_ages(store: &Store, season: i64) -> Result<BTreeMap<String, f64>> {
    let mut stmt = store
        .conn()
        .prepare(
            r#"
            SELECT DISTINCT p.global_player_id, b.birthdate
            FROM players p
            JOIN player_bio b ON b.global_player_id = p.global_player_id
            WHERE p.season = ?1
              AND b.birthdate IS NOT NULL
              AND b.birthdate != ''
            "#,
        )
        .context("prepare age population query")?;
    let rows = stmt
        .query_map(params![season], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .with_context(|| format!("query age population for {season}"))?;

    let mut ages = BTreeMap::new();
    for row in rows {
        let (gid, raw) = row.context("decode age population row")?;
        let Some(age) = parse_birthdate(&raw).and_then(|dob| age_at_season(dob, season)) else {
            warn!(season, global_player_id = %gid, birthdate = %raw, "unusable birthdate");
            continue;
        };
        ages.insert(gid, age);
    }
    Ok(ages)
}

/// Merge-on-conflict write; `created_at` is kept from the first run.
pub fn upsert_age_features(store: &mut Store, records: &[AgeFeatureRecord]) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let tx = store
        .conn_mut()
        .transaction()
        .context("begin age feature transaction")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO age_features (
                    global_player_id, season, age_season, age_zscore,
                    is_young_for_level, is_old_for_level, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                ON CONFLICT(global_player_id, season) DO UPDATE SET
                    age_season = excluded.age_season,
                    age_zscore = excluded.age_zscore,
                    is_young_for_level = excluded.is_young_for_level,
                    is_old_for_level = excluded.is_old_for_level,
                    updated_at = excluded.updated_at
                "#,
            )
            .context("prepare age feature upsert")?;
        for r in records {
            stmt.execute(params![
                r.global_player_id,
                r.season,
                r.age_season,
                r.age_zscore,
                r.is_young_for_level,
                r.is_old_for_level,
                now
            ])
            .with_context(|| format!("upsert age feature {} {}", r.global_player_id, r.season))?;
        }
    }
    tx.commit().context("commit age features")?;
    Ok(records.len())
}

pub fn load_age_features(store: &Store, season: i64) -> Result<Vec<AgeFeatureRecord>> {
    let mut stmt = store
        .conn()
        .prepare(
            r#"
            SELECT global_player_id, season, age_season, age_zscore,
                   is_young_for_level, is_old_for_level
            FROM age_features
            WHERE season = ?1
            ORDER BY global_player_id
            "#,
        )
        .context("prepare age feature query")?;
    let rows = stmt
        .query_map(params![season], |row| {
            Ok(AgeFeatureRecord {
                global_player_id: row.get(0)?,
                season: row.get(1)?,
                age_season: row.get(2)?,
                age_zscore: row.get(3)?,
                is_young_for_level: row.get(4)?,
                is_old_for_level: row.get(5)?,
            })
        })
        .context("query age features")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode age feature row")?);
    }
    Ok(out)
}
