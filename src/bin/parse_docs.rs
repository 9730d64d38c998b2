use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use d1_scout::{cli, config, interchange};

/// Split scraped team pages into per-season stats and roster files.
#[derive(Debug, Parser)]
#[command(name = "parse_docs")]
struct Args {
    /// Directory holding `<season>/<team>_<season>.html` documents.
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Where the per-season CSV files go.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Only this season (default: every season directory found).
    #[arg(long)]
    season: Option<i64>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    cli::init_logging(&args.log_level);

    let raw_dir = args.raw_dir.unwrap_or_else(config::default_raw_dir);
    let out_dir = args.out_dir.unwrap_or_else(config::default_intermediate_dir);
    let seasons = match args.season {
        Some(season) => vec![season],
        None => interchange::available_seasons(&raw_dir)?,
    };
    if seasons.is_empty() {
        return Err(anyhow!("no season directories under {}", raw_dir.display()));
    }

    let mut summaries = Vec::with_capacity(seasons.len());
    for season in seasons {
        summaries.push(interchange::parse_season(&raw_dir, &out_dir, season)?);
    }

    println!("Parse complete");
    println!("Raw: {}", raw_dir.display());
    println!("Out: {}", out_dir.display());
    for summary in &summaries {
        println!(
            "season {}: documents={} stats={} rosters={} misses={}",
            summary.season,
            summary.documents,
            summary.stats_tables,
            summary.roster_tables,
            summary.misses.len()
        );
        for path in &summary.written {
            println!("  wrote {}", path.display());
        }
    }
    Ok(())
}
