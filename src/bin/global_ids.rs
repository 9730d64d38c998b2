use anyhow::Result;
use clap::Parser;

use d1_scout::store::GLOBAL_PLAYERS;
use d1_scout::{Store, cli, identity};

/// Stamp local global ids and bootstrap the identity table.
#[derive(Debug, Parser)]
#[command(name = "global_ids")]
struct Args {
    #[command(flatten)]
    common: cli::CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init(&args.common);

    let store = Store::open_existing(&args.common.db_path()?)?;
    let stamped = identity::backfill_global_ids(&store)?;
    let inserted = identity::bootstrap_global_identities(&store)?;

    println!("Global ids complete");
    println!("Player rows stamped: {stamped}");
    println!("Identities added: {inserted}");
    println!("Identities total: {}", store.count_rows(GLOBAL_PLAYERS)?);
    Ok(())
}
