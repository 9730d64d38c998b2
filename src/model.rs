use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub slug: String,
    pub name: Option<String>,
    pub conference: Option<String>,
}

/// Season-scoped player row. The same person on the same team in two
/// seasons is two rows; `global_player_id` ties them together once known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: i64,
    pub full_name: String,
    pub team_id: i64,
    pub season: i64,
    pub class_year: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub position: Option<String>,
    pub global_player_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStat {
    pub stat_id: i64,
    pub player_id: i64,
    pub season: i64,
    pub games: Option<i64>,
    pub games_started: Option<i64>,
    pub minutes: Option<f64>,
    pub points: Option<f64>,
    pub rebounds: Option<f64>,
    pub assists: Option<f64>,
    pub steals: Option<f64>,
    pub blocks: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub true_shooting_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPlayerIdentity {
    pub global_player_id: String,
    pub canonical_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBio {
    pub global_player_id: String,
    pub full_name: String,
    pub class_year: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub primary_position: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub birthdate: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeFeatureRecord {
    pub global_player_id: String,
    pub season: i64,
    pub age_season: f64,
    pub age_zscore: f64,
    pub is_young_for_level: bool,
    pub is_old_for_level: bool,
}

/// One row of `profile_view`: team, player and (optional) season line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub player_id: i64,
    pub full_name: String,
    pub global_player_id: Option<String>,
    pub team_slug: String,
    pub team_name: Option<String>,
    pub conference: Option<String>,
    pub season: i64,
    pub class_year: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub position: Option<String>,
    pub games: Option<i64>,
    pub games_started: Option<i64>,
    pub minutes: Option<f64>,
    pub points: Option<f64>,
    pub rebounds: Option<f64>,
    pub assists: Option<f64>,
    pub steals: Option<f64>,
    pub blocks: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub true_shooting_pct: Option<f64>,
}
