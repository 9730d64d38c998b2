use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use d1_scout::{Store, cli, identity};

/// Refresh player bios from the latest season rows, optionally adding birthdates.
#[derive(Debug, Parser)]
#[command(name = "seed_bio")]
struct Args {
    #[command(flatten)]
    common: cli::CommonArgs,

    /// CSV with `global_player_id,birthdate` (YYYY-MM-DD).
    #[arg(long)]
    birthdates: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init(&args.common);

    let mut store = Store::open_existing(&args.common.db_path()?)?;
    let refresh = identity::refresh_player_bio(&mut store)?;

    println!("Bio refresh complete");
    println!("Rows upserted: {}", refresh.upserted);
    println!("Orphans removed: {}", refresh.removed);

    if let Some(path) = args.birthdates {
        let entries = identity::read_birthdates_csv(&path)?;
        let seeded = identity::seed_birthdates(&mut store, &entries)?;
        println!("Birthdates applied: {}/{}", seeded.updated, entries.len());
        for id in seeded.unknown_ids.iter().take(6) {
            println!("   - unknown id {id}");
        }
        for id in seeded.invalid_dates.iter().take(6) {
            println!("   - bad date for {id}");
        }
    }
    Ok(())
}
