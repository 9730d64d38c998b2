use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::features::{FEATURES, FeatureMatrix, NormalizedFeatureVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub profiles: usize,
    pub features: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
}

/// Write the normalised population to an `.xlsx` workbook.
///
/// `Profiles` has one row per player-season with raw, z and percentile
/// columns per feature; `Population` has the mean and σ behind the z-scores.
pub fn export_features(matrix: &FeatureMatrix, path: &Path) -> Result<ExportReport> {
    let mut profile_rows = vec![profile_header()];
    profile_rows.extend(matrix.rows.iter().map(profile_row));

    let mut population_rows = vec![vec![
        Cell::Text("feature".into()),
        Cell::Text("count".into()),
        Cell::Text("mean".into()),
        Cell::Text("std_dev".into()),
    ]];
    for (feature, stats) in FEATURES.iter().zip(matrix.stats.iter()) {
        population_rows.push(vec![
            Cell::Text(feature.name().into()),
            Cell::Number(stats.count as f64),
            Cell::Number(stats.mean),
            Cell::Number(stats.std_dev),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Profiles")?;
        write_rows(sheet, &profile_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Population")?;
        write_rows(sheet, &population_rows)?;
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export dir {}", parent.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        profiles: profile_rows.len().saturating_sub(1),
        features: FEATURES.len(),
    })
}

fn profile_header() -> Vec<Cell> {
    let mut header: Vec<Cell> = ["player_id", "global_player_id", "full_name", "team_slug", "season"]
        .into_iter()
        .map(|h| Cell::Text(h.into()))
        .collect();
    for suffix in ["", "_z", "_pct_rank"] {
        for feature in FEATURES {
            header.push(Cell::Text(format!("{}{suffix}", feature.name())));
        }
    }
    header
}

fn profile_row(row: &NormalizedFeatureVector) -> Vec<Cell> {
    let mut cells = vec![
        Cell::Number(row.player_id as f64),
        Cell::Text(row.global_player_id.clone().unwrap_or_default()),
        Cell::Text(row.full_name.clone()),
        Cell::Text(row.team_slug.clone()),
        Cell::Number(row.season as f64),
    ];
    for values in [&row.raw, &row.z, &row.percentile] {
        cells.extend(values.iter().map(|v| Cell::Number(*v)));
    }
    cells
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(text) => worksheet.write_string(r, c, text).map(|_| ()),
                Cell::Number(n) => worksheet.write_number(r, c, *n).map(|_| ()),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
