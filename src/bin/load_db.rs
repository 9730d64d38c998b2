use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use d1_scout::store::{PLAYERS, SEASON_STATS, TEAMS};
use d1_scout::{Store, cli, config, resolver};

/// Load the team master list and per-season files into the store.
#[derive(Debug, Parser)]
#[command(name = "load_db")]
struct Args {
    #[command(flatten)]
    common: cli::CommonArgs,

    /// Team master list (JSON array of `{slug, name, conference?}`).
    #[arg(long)]
    teams: Option<PathBuf>,

    /// Directory written by `parse_docs`.
    #[arg(long)]
    inter_dir: Option<PathBuf>,

    #[arg(long)]
    season: Option<i64>,

    /// Cap on stats rows per season.
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init(&args.common);

    let db_path = args.common.db_path()?;
    let teams_path = args.teams.unwrap_or_else(config::default_team_list);
    let inter_dir = args.inter_dir.unwrap_or_else(config::default_intermediate_dir);

    let teams = config::load_team_list(&teams_path)?;
    let mut store = Store::open(&db_path)?;
    let teams_inserted = resolver::upsert_teams(&mut store, &teams)?;
    let summary = resolver::load_interchange(&mut store, &inter_dir, args.season, args.limit)?;

    println!("Load complete");
    println!("DB: {}", db_path.display());
    println!("Teams: {} listed, {} new", teams.len(), teams_inserted);
    let mut by_conference: BTreeMap<String, usize> = BTreeMap::new();
    for team in resolver::list_teams(&store)? {
        let conference = team.conference.unwrap_or_else(|| "(none)".to_string());
        *by_conference.entry(conference).or_default() += 1;
    }
    for (conference, n) in &by_conference {
        println!("  {conference}: {n}");
    }
    for season in &summary.seasons {
        println!(
            "season {}: rows={} players+={} stats+={} dropped={}",
            season.season,
            season.rows_seen,
            season.players_inserted,
            season.stats_inserted,
            season.rows_dropped
        );
        if !season.unknown_teams.is_empty() {
            println!("  unknown teams: {}", season.unknown_teams.join(", "));
        }
    }
    if !summary.seasons_skipped.is_empty() {
        println!("Skipped seasons: {:?}", summary.seasons_skipped);
    }
    println!(
        "Totals: teams={} players={} season_stats={}",
        store.count_rows(TEAMS)?,
        store.count_rows(PLAYERS)?,
        store.count_rows(SEASON_STATS)?
    );
    Ok(())
}
