use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::config;

/// Flags every stage binary shares.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// SQLite store path (falls back to D1_SCOUT_DB, then the user data dir).
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl CommonArgs {
    pub fn db_path(&self) -> Result<PathBuf> {
        self.db
            .clone()
            .or_else(config::default_db_path)
            .context("unable to resolve sqlite path; pass --db or set D1_SCOUT_DB")
    }
}

/// Load `.env` and install the fmt subscriber. Call once at start-up.
pub fn init(common: &CommonArgs) {
    dotenvy::dotenv().ok();
    init_logging(&common.log_level);
}

pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn explicit_db_flag_wins() {
        let args = Harness::parse_from(["stage", "--db", "/tmp/x.sqlite", "--log-level", "debug"]);
        assert_eq!(args.common.db_path().unwrap(), PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(args.common.log_level, "debug");
    }
}
