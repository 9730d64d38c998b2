use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use d1_scout::features::build_feature_matrix;
use d1_scout::profile::ProfileFilter;
use d1_scout::{PipelineError, Store, cli, export};

/// Write the normalised feature population to an xlsx workbook.
#[derive(Debug, Parser)]
#[command(name = "export_features")]
struct Args {
    #[command(flatten)]
    common: cli::CommonArgs,

    #[arg(long, default_value = "exports/d1_features.xlsx")]
    out: PathBuf,

    /// Keep rows with more games than this.
    #[arg(long, default_value_t = 0)]
    min_games: i64,

    #[arg(long)]
    season: Option<i64>,

    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init(&args.common);

    let store = Store::open_existing(&args.common.db_path()?)?;
    let filter = ProfileFilter {
        min_games: args.min_games,
        season: args.season,
        limit: args.limit,
    };
    let matrix = build_feature_matrix(&store, &filter)?;
    if matrix.is_empty() {
        return Err(PipelineError::EmptyPopulation.into());
    }
    let report = export::export_features(&matrix, &args.out)?;

    println!("Export complete");
    println!("Workbook: {}", args.out.display());
    println!("Profiles: {}", report.profiles);
    println!("Features: {}", report.features);
    Ok(())
}
