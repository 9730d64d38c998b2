use anyhow::{Result, anyhow};
use clap::Parser;

use d1_scout::age::{self, AgeThresholds};
use d1_scout::store::{AGE_FEATURES, PLAYER_BIO, PLAYERS};
use d1_scout::{Store, cli};

/// Per-season age z-scores and young/old-for-level flags.
#[derive(Debug, Parser)]
#[command(name = "age_features")]
struct Args {
    #[command(flatten)]
    common: cli::CommonArgs,

    /// Only this season (default: every season with players).
    #[arg(long)]
    season: Option<i64>,

    /// z at or below which a player is young for the level.
    #[arg(long, default_value_t = -0.75, allow_negative_numbers = true)]
    young_threshold: f64,

    /// z at or above which a player is old for the level.
    #[arg(long, default_value_t = 0.75, allow_negative_numbers = true)]
    old_threshold: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init(&args.common);

    let mut store = Store::open_existing(&args.common.db_path()?)?;
    store.require_tables(&[PLAYERS, PLAYER_BIO, AGE_FEATURES])?;
    if store.seasons()?.is_empty() {
        return Err(anyhow!("no seasons found in players table"));
    }
    let thresholds = AgeThresholds {
        young: args.young_threshold,
        old: args.old_threshold,
    };
    let summaries = age::compute_age_features(&mut store, args.season, thresholds)?;

    println!("Age features complete");
    for s in &summaries {
        println!(
            "season {}: n={} mean_age={:.2} std={:.2}",
            s.season, s.written, s.mean_age, s.std_dev
        );
    }
    if summaries.is_empty() {
        println!("No season had players with birthdates");
    }
    Ok(())
}
