use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{Row, ToSql, params_from_iter};

use crate::model::ProfileRow;
use crate::store::{PROFILE_VIEW, Store};

/// Which `profile_view` rows make up a population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileFilter {
    /// Rows need strictly more games than this (0 keeps `games > 0`).
    pub min_games: i64,
    pub season: Option<i64>,
    pub limit: Option<usize>,
}

impl ProfileFilter {
    /// The stricter population some reports use.
    pub fn regulars() -> Self {
        Self {
            min_games: 5,
            ..Self::default()
        }
    }
}

/// Rows ordered by `player_id`, so downstream passes see a stable order.
pub fn load_profiles(store: &Store, filter: &ProfileFilter) -> Result<Vec<ProfileRow>> {
    store.require_table(PROFILE_VIEW)?;

    let mut sql = String::from(
        r#"
        SELECT
            player_id, full_name, global_player_id, team_slug, team_name, conference,
            season, class_year, height, weight, position,
            games, games_started, minutes, points, rebounds, assists, steals, blocks,
            fg_pct, three_pct, ft_pct, true_shooting_pct
        FROM profile_view
        WHERE games > ?1
        "#,
    );
    let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(filter.min_games)];
    if let Some(season) = filter.season {
        sql.push_str(" AND season = ?2");
        args.push(Box::new(season));
    }
    sql.push_str(" ORDER BY player_id ASC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = store
        .conn()
        .prepare(&sql)
        .context("prepare profile query")?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            Ok(ProfileRow {
                player_id: row.get(0)?,
                full_name: row.get(1)?,
                global_player_id: row.get(2)?,
                team_slug: row.get(3)?,
                team_name: row.get(4)?,
                conference: row.get(5)?,
                season: row.get(6)?,
                class_year: row.get(7)?,
                height: row.get(8)?,
                weight: row.get(9)?,
                position: row.get(10)?,
                games: row.get(11)?,
                games_started: row.get(12)?,
                minutes: lenient_f64(row, 13)?,
                points: lenient_f64(row, 14)?,
                rebounds: lenient_f64(row, 15)?,
                assists: lenient_f64(row, 16)?,
                steals: lenient_f64(row, 17)?,
                blocks: lenient_f64(row, 18)?,
                fg_pct: lenient_f64(row, 19)?,
                three_pct: lenient_f64(row, 20)?,
                ft_pct: lenient_f64(row, 21)?,
                true_shooting_pct: lenient_f64(row, 22)?,
            })
        })
        .context("query profiles")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode profile row")?);
    }
    Ok(out)
}

/// Stat columns may hold scraped text; anything unparsable reads as absent.
fn lenient_f64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    let value = match row.get::<_, Value>(idx)? {
        Value::Real(v) => Some(v),
        Value::Integer(v) => Some(v as f64),
        Value::Text(raw) => raw.trim().parse::<f64>().ok(),
        Value::Null | Value::Blob(_) => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &Store) {
        let conn = store.conn();
        conn.execute_batch(
            r#"
            INSERT INTO teams (slug, name) VALUES ('duke', 'Duke');
            INSERT INTO players (full_name, team_id, season) VALUES ('A One', 1, 2024);
            INSERT INTO players (full_name, team_id, season) VALUES ('B Two', 1, 2025);
            INSERT INTO players (full_name, team_id, season) VALUES ('C Three', 1, 2025);
            INSERT INTO players (full_name, team_id, season) VALUES ('No Stats', 1, 2025);
            INSERT INTO season_stats (player_id, season, games, points, fg_pct)
                VALUES (1, 2024, 30, 18.0, 'n/a');
            INSERT INTO season_stats (player_id, season, games, points) VALUES (2, 2025, 4, 3.0);
            INSERT INTO season_stats (player_id, season, games, points) VALUES (3, 2025, 0, 0.0);
            "#,
        )
        .unwrap();
    }

    #[test]
    fn filter_applies_games_and_season() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);

        let all = load_profiles(&store, &ProfileFilter::default()).unwrap();
        assert_eq!(
            all.iter().map(|r| r.player_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(all[0].fg_pct, None);
        assert_eq!(all[0].points, Some(18.0));

        let regulars = load_profiles(&store, &ProfileFilter::regulars()).unwrap();
        assert_eq!(regulars.len(), 1);

        let season = ProfileFilter {
            season: Some(2025),
            ..ProfileFilter::default()
        };
        assert_eq!(load_profiles(&store, &season).unwrap().len(), 1);

        let limited = ProfileFilter {
            limit: Some(1),
            ..ProfileFilter::default()
        };
        assert_eq!(load_profiles(&store, &limited).unwrap().len(), 1);
    }
}
