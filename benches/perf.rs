use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use d1_scout::classifier::classify_stats_table;
use d1_scout::document::extract_tables;
use d1_scout::features::{FeatureMatrix, percentile_ranks};
use d1_scout::model::ProfileRow;
use d1_scout::similarity::find_similar;

const POPULATION: usize = 5_000;

fn synthetic_population(n: usize) -> Vec<ProfileRow> {
    let mut rng = StdRng::seed_from_u64(0x5eed_d1);
    (0..n)
        .map(|i| ProfileRow {
            player_id: i as i64 + 1,
            full_name: format!("Player {i}"),
            global_player_id: Some((i + 1).to_string()),
            team_slug: format!("team{}", i % 360),
            team_name: None,
            conference: None,
            season: 2015 + (i % 11) as i64,
            class_year: None,
            height: None,
            weight: None,
            position: None,
            games: Some(rng.gen_range(1..=38)),
            games_started: None,
            minutes: Some(rng.gen_range(2.0..38.0)),
            points: Some(rng.gen_range(0.0..28.0)),
            rebounds: Some(rng.gen_range(0.0..13.0)),
            assists: Some(rng.gen_range(0.0..8.0)),
            steals: Some(rng.gen_range(0.0..3.0)),
            blocks: Some(rng.gen_range(0.0..4.0)),
            fg_pct: Some(rng.gen_range(0.25..0.7)),
            three_pct: if rng.gen_bool(0.8) {
                Some(rng.gen_range(0.0..0.5))
            } else {
                None
            },
            ft_pct: Some(rng.gen_range(0.4..0.95)),
            true_shooting_pct: Some(rng.gen_range(0.3..0.75)),
        })
        .collect()
}

fn season_document(players: usize) -> String {
    let mut html = String::from("<html><body>");
    for t in 0..12 {
        html.push_str(&format!(
            "<table id=\"noise{t}\"><thead><tr><th>Date</th><th>Opponent</th></tr></thead><tbody><tr><td>x</td><td>y</td></tr></tbody></table>"
        ));
    }
    html.push_str("<!--<table><thead><tr><th>Player</th><th>G</th><th>MP</th><th>FGA</th><th>FTA</th><th>PTS</th></tr></thead><tbody>");
    for p in 0..players {
        html.push_str(&format!(
            "<tr><td>Player {p}</td><td>30</td><td>22.1</td><td>8.0</td><td>2.5</td><td>11.4</td></tr>"
        ));
    }
    html.push_str("</tbody></table>--></body></html>");
    html
}

fn bench_feature_matrix(c: &mut Criterion) {
    let profiles = synthetic_population(POPULATION);
    c.bench_function("feature_matrix_5k", |b| {
        b.iter(|| {
            let matrix = FeatureMatrix::from_profiles(black_box(&profiles));
            black_box(matrix.len());
        })
    });
}

fn bench_percentile_ranks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<f64> = (0..POPULATION)
        .map(|_| (rng.gen_range(0.0..30.0_f64) * 10.0).round() / 10.0)
        .collect();
    c.bench_function("percentile_ranks_5k", |b| {
        b.iter(|| {
            let ranks = percentile_ranks(black_box(&values));
            black_box(ranks.len());
        })
    });
}

fn bench_similarity(c: &mut Criterion) {
    let matrix = FeatureMatrix::from_profiles(&synthetic_population(POPULATION));
    c.bench_function("find_similar_5k_k5", |b| {
        b.iter(|| {
            let hits = find_similar(black_box(&matrix), 42, 5).unwrap();
            black_box(hits.len());
        })
    });
}

fn bench_document_classify(c: &mut Criterion) {
    let html = season_document(15);
    c.bench_function("extract_and_classify_document", |b| {
        b.iter(|| {
            let tables = extract_tables(black_box(&html));
            black_box(classify_stats_table(&tables).map(|t| t.rows.len()));
        })
    });
}

criterion_group!(
    perf,
    bench_feature_matrix,
    bench_percentile_ranks,
    bench_similarity,
    bench_document_classify
);
criterion_main!(perf);
