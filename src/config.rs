use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

const DATA_DIR: &str = "d1_scout";
const DB_FILE: &str = "ncaa_d1_master.sqlite";

pub const DB_ENV: &str = "D1_SCOUT_DB";
pub const RAW_DIR_ENV: &str = "D1_SCOUT_RAW_DIR";
pub const INTER_DIR_ENV: &str = "D1_SCOUT_INTER_DIR";
pub const TEAMS_ENV: &str = "D1_SCOUT_TEAMS";

/// An entry of the team master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub conference: Option<String>,
}

pub fn load_team_list(path: &Path) -> Result<Vec<TeamRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read team list {}", path.display()))?;
    parse_team_list(&raw).with_context(|| format!("parse team list {}", path.display()))
}

pub fn parse_team_list(raw: &str) -> Result<Vec<TeamRecord>> {
    let teams: Vec<TeamRecord> = serde_json::from_str(raw).context("invalid team list json")?;
    if let Some(bad) = teams.iter().find(|t| t.slug.trim().is_empty()) {
        return Err(anyhow!("team `{}` has an empty slug", bad.name));
    }
    Ok(teams)
}

/// `D1_SCOUT_DB`, else the per-user data dir.
pub fn default_db_path() -> Option<PathBuf> {
    if let Some(path) = env_path(DB_ENV) {
        return Some(path);
    }
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn default_raw_dir() -> PathBuf {
    env_path(RAW_DIR_ENV).unwrap_or_else(|| PathBuf::from("data_raw"))
}

pub fn default_intermediate_dir() -> PathBuf {
    env_path(INTER_DIR_ENV).unwrap_or_else(|| PathBuf::from("data_intermediate"))
}

pub fn default_team_list() -> PathBuf {
    env_path(TEAMS_ENV).unwrap_or_else(|| PathBuf::from("configs/d1_teams_master.json"))
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(DATA_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR),
    )
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}
