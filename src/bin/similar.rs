use anyhow::{Result, anyhow};
use clap::Parser;

use d1_scout::features::{FeatureMatrix, build_feature_matrix};
use d1_scout::profile::ProfileFilter;
use d1_scout::similarity::{self, DEFAULT_SCORE_SCALE};
use d1_scout::{PipelineError, Store, cli};

/// Nearest statistical comparables across every season on record.
#[derive(Debug, Parser)]
#[command(name = "similar")]
struct Args {
    #[command(flatten)]
    common: cli::CommonArgs,

    /// Target player row; default is the top scorers of `--season`.
    #[arg(long)]
    player_id: Option<i64>,

    /// Season whose top scorers are reported (default: latest).
    #[arg(long)]
    season: Option<i64>,

    /// How many top scorers to report when no player is given.
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Neighbours per target.
    #[arg(long, default_value_t = 3)]
    k: usize,

    #[arg(long, default_value_t = DEFAULT_SCORE_SCALE)]
    score_scale: f64,

    #[arg(long, default_value_t = 0)]
    min_games: i64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init(&args.common);

    let store = Store::open_existing(&args.common.db_path()?)?;
    let filter = ProfileFilter {
        min_games: args.min_games,
        ..ProfileFilter::default()
    };
    let matrix = build_feature_matrix(&store, &filter)?;
    if matrix.is_empty() {
        return Err(PipelineError::EmptyPopulation.into());
    }

    let targets: Vec<i64> = match args.player_id {
        Some(id) => vec![id],
        None => {
            let season = args
                .season
                .or_else(|| matrix.rows.iter().map(|r| r.season).max())
                .ok_or_else(|| anyhow!("no seasons in population"))?;
            similarity::top_scorers(&matrix, season, args.top)
                .iter()
                .map(|r| r.player_id)
                .collect()
        }
    };

    println!("Population: {} player-seasons", matrix.len());
    for id in targets {
        report(&matrix, id, &args)?;
    }
    Ok(())
}

fn report(matrix: &FeatureMatrix, player_id: i64, args: &Args) -> Result<()> {
    let Some(target) = matrix.get(player_id) else {
        return Err(PipelineError::UnknownPlayer(player_id).into());
    };
    println!();
    println!(
        "{} ({}, {}) id={}",
        target.full_name, target.team_slug, target.season, target.player_id
    );
    let hits = similarity::find_similar(matrix, player_id, args.k)?;
    if hits.is_empty() {
        println!("  no comparables");
    }
    for hit in hits {
        println!(
            "  {:<28} {:<18} {} dist={:.3} score={:.1}",
            hit.full_name,
            hit.team_slug,
            hit.season,
            hit.distance,
            similarity::similarity_score(hit.distance, args.score_scale)
        );
    }
    Ok(())
}
