use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::PipelineError;

pub const TEAMS: &str = "teams";
pub const PLAYERS: &str = "players";
pub const SEASON_STATS: &str = "season_stats";
pub const GLOBAL_PLAYERS: &str = "global_players";
pub const PLAYER_BIO: &str = "player_bio";
pub const AGE_FEATURES: &str = "age_features";
pub const PROFILE_VIEW: &str = "profile_view";

#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    team_id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    name TEXT,
    conference TEXT
);

CREATE TABLE IF NOT EXISTS players (
    player_id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    team_id INTEGER NOT NULL REFERENCES teams(team_id),
    season INTEGER NOT NULL,
    class_year TEXT NULL,
    height TEXT NULL,
    weight TEXT NULL,
    position TEXT NULL,
    global_player_id TEXT NULL,
    UNIQUE (full_name, team_id, season)
);
CREATE INDEX IF NOT EXISTS idx_players_season ON players(season);
CREATE INDEX IF NOT EXISTS idx_players_global ON players(global_player_id);

CREATE TABLE IF NOT EXISTS season_stats (
    stat_id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players(player_id),
    season INTEGER NOT NULL,
    games INTEGER NULL,
    games_started INTEGER NULL,
    minutes REAL NULL,
    points REAL NULL,
    rebounds REAL NULL,
    assists REAL NULL,
    steals REAL NULL,
    blocks REAL NULL,
    fg_pct REAL NULL,
    three_pct REAL NULL,
    ft_pct REAL NULL,
    true_shooting_pct REAL NULL
);
CREATE INDEX IF NOT EXISTS idx_season_stats_player ON season_stats(player_id);

CREATE TABLE IF NOT EXISTS ingest_runs (
    run_id INTEGER PRIMARY KEY AUTOINCREMENT,
    season INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NULL,
    rows_seen INTEGER NOT NULL,
    players_inserted INTEGER NOT NULL,
    stats_inserted INTEGER NOT NULL,
    rows_dropped INTEGER NOT NULL
);
"#;

const MIGRATION_002: &str = r#"
DROP VIEW IF EXISTS profile_view;
CREATE VIEW profile_view AS
SELECT
    p.player_id,
    p.full_name,
    p.global_player_id,
    t.slug AS team_slug,
    t.name AS team_name,
    t.conference,
    p.season,
    p.class_year,
    p.height,
    p.weight,
    p.position,
    s.games,
    s.games_started,
    s.minutes,
    s.points,
    s.rebounds,
    s.assists,
    s.steals,
    s.blocks,
    s.fg_pct,
    s.three_pct,
    s.ft_pct,
    s.true_shooting_pct
FROM players p
JOIN teams t ON t.team_id = p.team_id
LEFT JOIN season_stats s ON s.player_id = p.player_id;
"#;

const MIGRATION_003: &str = r#"
CREATE TABLE IF NOT EXISTS global_players (
    global_player_id TEXT PRIMARY KEY,
    canonical_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS player_bio (
    global_player_id TEXT PRIMARY KEY REFERENCES global_players(global_player_id),
    full_name TEXT NOT NULL,
    class_year TEXT NULL,
    height TEXT NULL,
    weight TEXT NULL,
    primary_position TEXT NULL,
    birthdate TEXT NULL,
    updated_at TEXT NOT NULL
);
"#;

const MIGRATION_004: &str = r#"
CREATE TABLE IF NOT EXISTS age_features (
    global_player_id TEXT NOT NULL REFERENCES global_players(global_player_id),
    season INTEGER NOT NULL,
    age_season REAL NOT NULL,
    age_zscore REAL NOT NULL,
    is_young_for_level INTEGER NOT NULL,
    is_old_for_level INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (global_player_id, season)
);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "core_tables",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "profile_view",
        sql: MIGRATION_002,
    },
    Migration {
        version: 3,
        name: "global_identity_and_bio",
        sql: MIGRATION_003,
    },
    Migration {
        version: 4,
        name: "age_features",
        sql: MIGRATION_004,
    },
];

/// Handle to the relational store. Every component takes one explicitly.
///
/// A single writer is assumed; nothing here coordinates concurrent processes.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) and bring the schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        let store = Self::from_connection(conn, true)?;
        store.migrate()?;
        Ok(store)
    }

    /// Open a store that must already exist; the schema is left untouched.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingStore(path.to_path_buf()).into());
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        Self::from_connection(conn, true)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite")?;
        let store = Self::from_connection(conn, false)?;
        store.migrate()?;
        Ok(store)
    }

    fn from_connection(conn: Connection, file_backed: bool) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("enable foreign keys")?;
        if file_backed {
            conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))
                .context("enable wal")?;
        }
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Apply pending migrations in version order. Re-running is a no-op.
    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    applied_at TEXT NOT NULL
                );
                "#,
            )
            .context("create schema_migrations")?;
        let current = self.schema_version()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            self.conn
                .execute_batch(migration.sql)
                .with_context(|| format!("apply migration {} ({})", migration.version, migration.name))?;
            self.conn
                .execute(
                    "INSERT INTO schema_migrations(version, name, applied_at) VALUES (?1, ?2, ?3)",
                    params![
                        migration.version,
                        migration.name,
                        chrono::Utc::now().to_rfc3339()
                    ],
                )
                .context("record migration")?;
            tracing::debug!(version = migration.version, name = migration.name, "applied migration");
        }
        Ok(())
    }

    pub fn schema_version(&self) -> Result<u32> {
        if !self.table_exists("schema_migrations")? {
            return Ok(0);
        }
        let version = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get::<_, Option<u32>>(0)
            })
            .context("query schema version")?;
        Ok(version.unwrap_or(0))
    }

    /// Tables and views both count.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("query sqlite_master")?;
        Ok(found.is_some())
    }

    pub fn require_table(&self, name: &'static str) -> Result<()> {
        if self.table_exists(name)? {
            Ok(())
        } else {
            Err(PipelineError::MissingTable(name).into())
        }
    }

    pub fn require_tables(&self, names: &[&'static str]) -> Result<()> {
        for name in names {
            self.require_table(name)?;
        }
        Ok(())
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .with_context(|| format!("count rows in {table}"))
    }

    pub fn seasons(&self) -> Result<Vec<i64>> {
        self.require_table(PLAYERS)?;
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT season FROM players ORDER BY season")
            .context("prepare seasons query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .context("query seasons")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode season")?);
        }
        Ok(out)
    }
}
