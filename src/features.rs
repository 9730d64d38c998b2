use std::collections::HashMap;

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::ProfileRow;
use crate::profile::{ProfileFilter, load_profiles};
use crate::store::Store;

/// Spreads below this are treated as zero.
const STD_EPSILON: f64 = 1e-12;

pub const FEATURE_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    FgPct,
    ThreePct,
    TrueShootingPct,
}

pub const FEATURES: [Feature; FEATURE_COUNT] = [
    Feature::Points,
    Feature::Rebounds,
    Feature::Assists,
    Feature::Steals,
    Feature::Blocks,
    Feature::FgPct,
    Feature::ThreePct,
    Feature::TrueShootingPct,
];

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Points => "points",
            Feature::Rebounds => "rebounds",
            Feature::Assists => "assists",
            Feature::Steals => "steals",
            Feature::Blocks => "blocks",
            Feature::FgPct => "fg_pct",
            Feature::ThreePct => "three_pct",
            Feature::TrueShootingPct => "true_shooting_pct",
        }
    }

    /// Raw value with absent or non-finite input coerced to 0.
    pub fn value(self, row: &ProfileRow) -> f64 {
        let raw = match self {
            Feature::Points => row.points,
            Feature::Rebounds => row.rebounds,
            Feature::Assists => row.assists,
            Feature::Steals => row.steals,
            Feature::Blocks => row.blocks,
            Feature::FgPct => row.fg_pct,
            Feature::ThreePct => row.three_pct,
            Feature::TrueShootingPct => row.true_shooting_pct,
        };
        raw.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

/// Population mean and standard deviation (N denominator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl PopulationStats {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self {
            mean,
            std_dev: var.sqrt(),
            count: values.len(),
        }
    }

    /// 0 for a zero-variance population.
    pub fn zscore(&self, value: f64) -> f64 {
        if self.std_dev <= STD_EPSILON {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

pub fn zscores(values: &[f64]) -> Vec<f64> {
    let stats = PopulationStats::of(values);
    values.iter().map(|v| stats.zscore(*v)).collect()
}

/// Average-rank percentile on a 0–100 scale.
///
/// The largest untied value gets 100; tied values share the mean of the
/// ranks they span.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![0.0; n];
    if n == 0 {
        return out;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));

    let mut start = 0usize;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1 ..= end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let pct = avg_rank / n as f64 * 100.0;
        for idx in &order[start..end] {
            out[*idx] = pct;
        }
        start = end;
    }
    out
}

/// One population row with raw, z-scored and percentile features, indexed
/// in `FEATURES` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureVector {
    pub player_id: i64,
    pub global_player_id: Option<String>,
    pub full_name: String,
    pub team_slug: String,
    pub season: i64,
    pub raw: [f64; FEATURE_COUNT],
    pub z: [f64; FEATURE_COUNT],
    pub percentile: [f64; FEATURE_COUNT],
}

impl NormalizedFeatureVector {
    pub fn z_of(&self, feature: Feature) -> f64 {
        self.z[feature_index(feature)]
    }

    pub fn percentile_of(&self, feature: Feature) -> f64 {
        self.percentile[feature_index(feature)]
    }
}

pub fn feature_index(feature: Feature) -> usize {
    FEATURES
        .iter()
        .position(|f| *f == feature)
        .unwrap_or_default()
}

/// Normalised features for a whole population, all seasons on one scale.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub rows: Vec<NormalizedFeatureVector>,
    pub stats: [PopulationStats; FEATURE_COUNT],
    by_player: HashMap<i64, usize>,
}

impl FeatureMatrix {
    pub fn from_profiles(profiles: &[ProfileRow]) -> Self {
        let columns: Vec<(PopulationStats, Vec<f64>, Vec<f64>)> = FEATURES
            .par_iter()
            .map(|feature| {
                let values: Vec<f64> = profiles.iter().map(|p| feature.value(p)).collect();
                let stats = PopulationStats::of(&values);
                let z = values.iter().map(|v| stats.zscore(*v)).collect();
                (stats, z, percentile_ranks(&values))
            })
            .collect();

        let mut stats = [PopulationStats::default(); FEATURE_COUNT];
        for (i, (s, _, _)) in columns.iter().enumerate() {
            stats[i] = *s;
        }

        let rows: Vec<NormalizedFeatureVector> = profiles
            .iter()
            .enumerate()
            .map(|(r, p)| {
                let mut raw = [0.0; FEATURE_COUNT];
                let mut z = [0.0; FEATURE_COUNT];
                let mut percentile = [0.0; FEATURE_COUNT];
                for (i, feature) in FEATURES.iter().enumerate() {
                    raw[i] = feature.value(p);
                    z[i] = columns[i].1[r];
                    percentile[i] = columns[i].2[r];
                }
                NormalizedFeatureVector {
                    player_id: p.player_id,
                    global_player_id: p.global_player_id.clone(),
                    full_name: p.full_name.clone(),
                    team_slug: p.team_slug.clone(),
                    season: p.season,
                    raw,
                    z,
                    percentile,
                }
            })
            .collect();

        let by_player = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.player_id, i))
            .collect();
        Self {
            rows,
            stats,
            by_player,
        }
    }

    pub fn get(&self, player_id: i64) -> Option<&NormalizedFeatureVector> {
        self.by_player.get(&player_id).map(|i| &self.rows[*i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load the population selected by `filter` and normalise it.
pub fn build_feature_matrix(store: &Store, filter: &ProfileFilter) -> Result<FeatureMatrix> {
    let profiles = load_profiles(store, filter)?;
    let matrix = FeatureMatrix::from_profiles(&profiles);
    tracing::info!(rows = matrix.len(), "feature matrix built");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn profile(player_id: i64, points: Option<f64>, fg_pct: Option<f64>) -> ProfileRow {
        ProfileRow {
            player_id,
            full_name: format!("P{player_id}"),
            global_player_id: None,
            team_slug: "duke".into(),
            team_name: None,
            conference: None,
            season: 2025,
            class_year: None,
            height: None,
            weight: None,
            position: None,
            games: Some(10),
            games_started: None,
            minutes: None,
            points,
            rebounds: Some(5.0),
            assists: None,
            steals: None,
            blocks: None,
            fg_pct,
            three_pct: None,
            ft_pct: None,
            true_shooting_pct: None,
        }
    }

    #[test]
    fn zscores_have_zero_mean_unit_spread() {
        let values = [3.0, 7.5, 12.0, 18.25, 21.0, 4.4];
        let z = zscores(&values);
        let stats = PopulationStats::of(&z);
        assert!(close(stats.mean, 0.0));
        assert!(close(stats.std_dev, 1.0));
    }

    #[test]
    fn zero_variance_gives_exact_zero() {
        let z = zscores(&[0.1, 0.1, 0.1]);
        assert!(z.iter().all(|v| *v == 0.0));
        assert!(zscores(&[]).is_empty());
    }

    #[test]
    fn percentile_is_monotone_and_tops_at_100() {
        let values = [5.0, 1.0, 3.0, 9.0, 7.0];
        let pct = percentile_ranks(&values);
        assert!(close(pct[3], 100.0));
        assert!(close(pct[1], 20.0));
        let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(pct).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn ties_share_average_rank() {
        let pct = percentile_ranks(&[2.0, 2.0, 1.0, 4.0]);
        // ranks: 1.0 -> 1, the two 2.0 -> 2.5, 4.0 -> 4
        assert!(close(pct[0], 62.5));
        assert!(close(pct[1], 62.5));
        assert!(close(pct[2], 25.0));
        assert!(close(pct[3], 100.0));
    }

    #[test]
    fn matrix_coerces_missing_values_to_zero() {
        let profiles = vec![
            profile(1, Some(20.0), Some(0.5)),
            profile(2, None, Some(0.4)),
            profile(3, Some(10.0), None),
        ];
        let matrix = FeatureMatrix::from_profiles(&profiles);
        assert_eq!(matrix.len(), 3);
        let p2 = matrix.get(2).unwrap();
        assert_eq!(p2.raw[feature_index(Feature::Points)], 0.0);
        assert!(close(matrix.stats[feature_index(Feature::Points)].mean, 10.0));
        // rebounds identical for everyone
        assert!(matrix.rows.iter().all(|r| r.z_of(Feature::Rebounds) == 0.0));
        assert!(close(matrix.get(1).unwrap().percentile_of(Feature::Points), 100.0));
        assert!(matrix.get(99).is_none());
    }
}
