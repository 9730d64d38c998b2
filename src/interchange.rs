use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::classifier::{self, ClassifiedStatsRow, RosterRow, TableKind};
use crate::document::{SourceDocument, Table, load_season_documents, normalize_header};
use crate::error::PipelineError;

const TEAM_SLUG_COL: &str = "team_slug";
const SEASON_COL: &str = "season";

/// A classified table plus the document tags it came from.
#[derive(Debug, Clone)]
pub struct TaggedTable {
    pub team_slug: String,
    pub season: i64,
    pub table: Table,
}

pub fn season_file(dir: &Path, season: i64, kind: TableKind) -> PathBuf {
    let name = match kind {
        TableKind::Stats => format!("per_game_{season}.csv"),
        TableKind::Roster => format!("rosters_{season}.csv"),
    };
    dir.join(season.to_string()).join(name)
}

/// Write one season's tables of one kind into a single file.
///
/// Columns are `team_slug, season` followed by the union of the normalised
/// source headers in first-seen order; cells a document lacks stay blank.
/// Footer and blank-name rows are left out.
pub fn write_season_file(
    dir: &Path,
    season: i64,
    kind: TableKind,
    tables: &[TaggedTable],
) -> Result<Option<PathBuf>> {
    if tables.is_empty() {
        return Ok(None);
    }
    let mut columns: Vec<String> = Vec::new();
    for tagged in tables {
        for header in &tagged.table.headers {
            let name = normalize_header(header);
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    let path = season_file(dir, season, kind);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("open {}", path.display()))?;

    let mut header = vec![TEAM_SLUG_COL.to_string(), SEASON_COL.to_string()];
    header.extend(columns.iter().cloned());
    writer.write_record(&header).context("write header")?;

    let mut rows = 0usize;
    for tagged in tables {
        let index: Vec<Option<usize>> = columns
            .iter()
            .map(|c| tagged.table.column_index(c))
            .collect();
        let player_col = tagged.table.column_index_ci("player");
        for row in &tagged.table.rows {
            let name = player_col.and_then(|i| row.get(i)).map_or("", |s| s.trim());
            if name.is_empty() || classifier::is_footer_label(name) {
                continue;
            }
            let mut record = vec![tagged.team_slug.clone(), tagged.season.to_string()];
            for idx in &index {
                record.push(idx.and_then(|i| row.get(i)).cloned().unwrap_or_default());
            }
            writer.write_record(&record).context("write row")?;
            rows += 1;
        }
    }
    writer.flush().context("flush interchange file")?;
    tracing::info!(path = %path.display(), rows, "wrote {kind} interchange file");
    Ok(Some(path))
}

#[derive(Debug, Default)]
pub struct ParseSummary {
    pub season: i64,
    pub documents: usize,
    pub stats_tables: usize,
    pub roster_tables: usize,
    pub misses: Vec<PipelineError>,
    pub written: Vec<PathBuf>,
}

/// Pick the stats and roster table out of each document.
///
/// A document with no matching table only loses that kind; the miss is
/// logged and recorded in the summary.
pub fn classify_documents(
    documents: &[SourceDocument],
    summary: &mut ParseSummary,
) -> (Vec<TaggedTable>, Vec<TaggedTable>) {
    let mut stats = Vec::new();
    let mut rosters = Vec::new();
    for doc in documents {
        for kind in [TableKind::Stats, TableKind::Roster] {
            let found = match kind {
                TableKind::Stats => classifier::classify_stats_table(&doc.tables),
                TableKind::Roster => classifier::classify_roster_table(&doc.tables),
            };
            let Some(table) = found else {
                let miss = PipelineError::ClassificationMiss {
                    kind,
                    document: doc.name.clone(),
                };
                tracing::warn!(season = doc.season, "{miss}; skipping");
                summary.misses.push(miss);
                continue;
            };
            let tagged = TaggedTable {
                team_slug: doc.team_slug.clone(),
                season: doc.season,
                table: table.clone(),
            };
            match kind {
                TableKind::Stats => stats.push(tagged),
                TableKind::Roster => rosters.push(tagged),
            }
        }
    }
    (stats, rosters)
}

/// Raw documents of one season to its per-game and roster files.
pub fn parse_season(raw_dir: &Path, out_dir: &Path, season: i64) -> Result<ParseSummary> {
    let documents = load_season_documents(raw_dir, season)?;
    let mut summary = ParseSummary {
        season,
        documents: documents.len(),
        ..ParseSummary::default()
    };
    if documents.is_empty() {
        tracing::warn!(season, dir = %raw_dir.display(), "no documents for season");
        return Ok(summary);
    }
    let (stats, rosters) = classify_documents(&documents, &mut summary);
    summary.stats_tables = stats.len();
    summary.roster_tables = rosters.len();
    for (kind, tables) in [(TableKind::Stats, &stats), (TableKind::Roster, &rosters)] {
        if let Some(path) = write_season_file(out_dir, season, kind, tables)? {
            summary.written.push(path);
        }
    }
    Ok(summary)
}

fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers = reader
        .headers()
        .context("read header")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("decode row in {}", path.display()))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(Table::new(headers, rows))
}

/// Typed rows for one season, or `None` when the season has no stats file.
pub fn read_stats_rows(dir: &Path, season: i64) -> Result<Option<Vec<ClassifiedStatsRow>>> {
    let path = season_file(dir, season, TableKind::Stats);
    if !path.exists() {
        return Ok(None);
    }
    let table = read_table(&path)?;
    let rows = table
        .rows
        .iter()
        .filter_map(|row| {
            let slug = table.cell(row, TEAM_SLUG_COL)?.trim();
            classifier::stats_row(&table, row, slug, season)
        })
        .collect();
    Ok(Some(rows))
}

/// Roster rows for one season; a missing roster file is an empty roster.
pub fn read_roster_rows(dir: &Path, season: i64) -> Result<Vec<RosterRow>> {
    let path = season_file(dir, season, TableKind::Roster);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let table = read_table(&path)?;
    Ok(table
        .rows
        .iter()
        .filter_map(|row| {
            let slug = table.cell(row, TEAM_SLUG_COL)?.trim();
            classifier::roster_row(&table, row, slug, season)
        })
        .collect())
}

/// Season directories under `dir`, ascending.
pub fn available_seasons(dir: &Path) -> Result<Vec<i64>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut seasons: Vec<i64> = fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str()?.parse::<i64>().ok())
        .collect();
    seasons.sort_unstable();
    seasons.dedup();
    Ok(seasons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(slug: &str, headers: &[&str], rows: &[&[&str]]) -> TaggedTable {
        TaggedTable {
            team_slug: slug.to_string(),
            season: 2025,
            table: Table::new(
                headers.iter().map(|s| s.to_string()).collect(),
                rows.iter()
                    .map(|r| r.iter().map(|s| s.to_string()).collect())
                    .collect(),
            ),
        }
    }

    #[test]
    fn season_files_merge_columns_across_documents() {
        let dir = tempfile::tempdir().unwrap();
        let tables = vec![
            tagged("duke", &["Player", "G", "PTS", "3P%"], &[&["A One", "30", "20.0", ".400"]]),
            tagged("unc", &["Player", "G", "PTS", "FTA"], &[&["B Two", "28", "11.5", "3.0"]]),
        ];
        let path = write_season_file(dir.path(), 2025, TableKind::Stats, &tables)
            .unwrap()
            .unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("team_slug,season,Player,G,PTS,three_P_pct,FTA"));

        let rows = read_stats_rows(dir.path(), 2025).unwrap().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team_slug, "duke");
        assert_eq!(rows[0].three_pct, Some(0.4));
        assert_eq!(rows[0].fta, None);
        assert_eq!(rows[1].team_slug, "unc");
        assert_eq!(rows[1].fta, Some(3.0));
        assert_eq!(available_seasons(dir.path()).unwrap(), vec![2025]);
    }

    #[test]
    fn missing_files_are_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_stats_rows(dir.path(), 2021).unwrap().is_none());
        assert!(read_roster_rows(dir.path(), 2021).unwrap().is_empty());
        assert!(
            write_season_file(dir.path(), 2021, TableKind::Roster, &[])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn parse_season_records_misses_and_writes_files() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let season_dir = raw.path().join("2025");
        fs::create_dir_all(&season_dir).unwrap();
        fs::write(
            season_dir.join("duke_2025.html"),
            r#"<table><thead><tr><th>Player</th><th>Class</th></tr></thead>
               <tbody><tr><td>A One</td><td>FR</td></tr></tbody></table>
               <!-- <table><thead><tr><th>Player</th><th>G</th><th>PTS</th></tr></thead>
               <tbody><tr><td>A One</td><td>30</td><td>20.1</td></tr>
               <tr><td>Team Totals</td><td>30</td><td>75.0</td></tr></tbody></table> -->"#,
        )
        .unwrap();
        fs::write(season_dir.join("unc_2025.html"), "<p>no tables here</p>").unwrap();

        let summary = parse_season(raw.path(), out.path(), 2025).unwrap();
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.stats_tables, 1);
        assert_eq!(summary.roster_tables, 1);
        assert_eq!(summary.misses.len(), 2);
        assert_eq!(summary.written.len(), 2);

        let rows = read_stats_rows(out.path(), 2025).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].points, Some(20.1));

        let raw_csv = fs::read_to_string(season_file(out.path(), 2025, TableKind::Stats)).unwrap();
        assert!(!raw_csv.contains("Team Totals"));
        assert_eq!(raw_csv.lines().count(), 2);
        let roster = read_roster_rows(out.path(), 2025).unwrap();
        assert_eq!(roster[0].class_year.as_deref(), Some("FR"));
    }
}
