use std::cmp::Ordering;

use crate::error::PipelineError;
use crate::features::{Feature, FeatureMatrix, NormalizedFeatureVector, feature_index};

/// Default display scale for `similarity_score`.
pub const DEFAULT_SCORE_SCALE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarPlayer {
    pub player_id: i64,
    pub full_name: String,
    pub team_slug: String,
    pub season: i64,
    pub distance: f64,
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Nearest neighbours of `target_player_id` over z-scored vectors.
///
/// The target row is never part of the result. Equal distances are ordered
/// by ascending `player_id`.
pub fn find_similar(
    matrix: &FeatureMatrix,
    target_player_id: i64,
    k: usize,
) -> Result<Vec<SimilarPlayer>, PipelineError> {
    let target = matrix
        .get(target_player_id)
        .ok_or(PipelineError::UnknownPlayer(target_player_id))?;
    Ok(nearest(matrix, target, k))
}

pub fn nearest(matrix: &FeatureMatrix, target: &NormalizedFeatureVector, k: usize) -> Vec<SimilarPlayer> {
    let mut scored: Vec<(f64, &NormalizedFeatureVector)> = matrix
        .rows
        .iter()
        .filter(|row| row.player_id != target.player_id)
        .map(|row| (euclidean(&target.z, &row.z), row))
        .collect();
    scored.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.player_id.cmp(&b.1.player_id))
    });
    scored
        .into_iter()
        .take(k)
        .map(|(distance, row)| SimilarPlayer {
            player_id: row.player_id,
            full_name: row.full_name.clone(),
            team_slug: row.team_slug.clone(),
            season: row.season,
            distance,
        })
        .collect()
}

/// Display-only transform, `max(0, 100 - distance * scale)`.
pub fn similarity_score(distance: f64, scale: f64) -> f64 {
    (100.0 - distance * scale).max(0.0)
}

/// Highest raw scorers of `season`, ties by `player_id`.
pub fn top_scorers(matrix: &FeatureMatrix, season: i64, n: usize) -> Vec<&NormalizedFeatureVector> {
    let points = feature_index(Feature::Points);
    let mut rows: Vec<&NormalizedFeatureVector> =
        matrix.rows.iter().filter(|r| r.season == season).collect();
    rows.sort_by(|a, b| {
        b.raw[points]
            .total_cmp(&a.raw[points])
            .then(a.player_id.cmp(&b.player_id))
    });
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileRow;

    fn profile(player_id: i64, season: i64, points: f64, rebounds: f64) -> ProfileRow {
        ProfileRow {
            player_id,
            full_name: format!("P{player_id}"),
            global_player_id: Some(player_id.to_string()),
            team_slug: "duke".into(),
            team_name: None,
            conference: None,
            season,
            class_year: None,
            height: None,
            weight: None,
            position: None,
            games: Some(10),
            games_started: None,
            minutes: None,
            points: Some(points),
            rebounds: Some(rebounds),
            assists: None,
            steals: None,
            blocks: None,
            fg_pct: None,
            three_pct: None,
            ft_pct: None,
            true_shooting_pct: None,
        }
    }

    #[test]
    fn single_row_population_has_no_neighbours() {
        let matrix = FeatureMatrix::from_profiles(&[profile(1, 2025, 10.0, 4.0)]);
        assert!(find_similar(&matrix, 1, 5).unwrap().is_empty());
    }

    #[test]
    fn target_is_excluded_and_ties_break_by_id() {
        let matrix = FeatureMatrix::from_profiles(&[
            profile(4, 2025, 10.0, 4.0),
            profile(3, 2024, 20.0, 8.0),
            profile(1, 2024, 20.0, 8.0),
            profile(2, 2025, 10.0, 4.0),
        ]);
        let hits = find_similar(&matrix, 4, 3).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.player_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(hits[0].distance, 0.0);
        assert!(hits[1].distance > 0.0);
        assert_eq!(hits[1].distance, hits[2].distance);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let matrix = FeatureMatrix::from_profiles(&[profile(1, 2025, 10.0, 4.0)]);
        assert!(matches!(
            find_similar(&matrix, 42, 3),
            Err(PipelineError::UnknownPlayer(42))
        ));
    }

    #[test]
    fn score_is_clamped_at_zero() {
        assert_eq!(similarity_score(0.0, DEFAULT_SCORE_SCALE), 100.0);
        assert!((similarity_score(2.5, 12.0) - 70.0).abs() < 1e-12);
        assert_eq!(similarity_score(50.0, DEFAULT_SCORE_SCALE), 0.0);
    }

    #[test]
    fn top_scorers_stay_in_season() {
        let matrix = FeatureMatrix::from_profiles(&[
            profile(1, 2024, 30.0, 1.0),
            profile(2, 2025, 12.0, 1.0),
            profile(3, 2025, 18.0, 1.0),
            profile(4, 2025, 12.0, 1.0),
        ]);
        let top: Vec<i64> = top_scorers(&matrix, 2025, 2)
            .iter()
            .map(|r| r.player_id)
            .collect();
        assert_eq!(top, vec![3, 2]);
    }
}
