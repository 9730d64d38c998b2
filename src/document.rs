use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// One table lifted out of a source document: a header row and body rows.
///
/// Cells are plain text with tags stripped and whitespace collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of a column, comparing normalised header names so raw
    /// (`3P%`) and interchange (`three_P_pct`) spellings both resolve.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.headers
            .iter()
            .position(|h| normalize_header(h) == wanted)
    }

    pub fn column_index_ci(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name).to_ascii_lowercase();
        self.headers
            .iter()
            .position(|h| normalize_header(h).to_ascii_lowercase() == wanted)
    }

    pub fn cell<'a>(&'a self, row: &'a [String], name: &str) -> Option<&'a str> {
        let idx = self.column_index(name)?;
        row.get(idx).map(|s| s.as_str())
    }
}

/// A parsed source page tagged with the team and season it belongs to.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub team_slug: String,
    pub season: i64,
    pub tables: Vec<Table>,
}

impl SourceDocument {
    pub fn from_html(name: &str, season: i64, html: &str) -> Self {
        Self {
            name: name.to_string(),
            team_slug: team_slug_from_file_name(name),
            season,
            tables: extract_tables(html),
        }
    }
}

/// `%` becomes `_pct`, a leading `3` / `2` is spelled out.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim();
    let spelled = if let Some(rest) = trimmed.strip_prefix('3') {
        format!("three_{rest}")
    } else if let Some(rest) = trimmed.strip_prefix('2') {
        format!("two_{rest}")
    } else {
        trimmed.to_string()
    };
    spelled.replace('%', "_pct")
}

/// `duke_2025.html` -> `duke`.
pub fn team_slug_from_file_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    stem.split('_').next().unwrap_or(stem).to_string()
}

/// All `*.html` documents for one season directory, sorted by file name.
pub fn load_season_documents(raw_dir: &Path, season: i64) -> Result<Vec<SourceDocument>> {
    let dir = raw_dir.join(season.to_string());
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("read document dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html"))
        })
        .collect();
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let html =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        out.push(SourceDocument::from_html(&name, season, &html));
    }
    Ok(out)
}

/// Extract every `<table>` in document order.
///
/// Comment markers are removed first: the source format hides most tables
/// inside HTML comments.
pub fn extract_tables(html: &str) -> Vec<Table> {
    let html = html.replace("<!--", "").replace("-->", "");
    let mut out = Vec::new();
    let mut from = 0usize;
    while let Some((start, end)) = next_tag_block_ci(&html, "<table", "</table>", from) {
        if let Some(table) = parse_table(&html[start..end]) {
            out.push(table);
        }
        from = end;
    }
    out
}

fn parse_table(block: &str) -> Option<Table> {
    let mut header_rows: Vec<Vec<String>> = Vec::new();
    let mut body_rows: Vec<Vec<String>> = Vec::new();

    let thead = slice_between_ci(block, "<thead", "</thead>");
    if let Some(thead) = thead {
        header_rows.extend(rows_in(thead));
    }
    let bodies = body_sections(block);
    let sections = if bodies.is_empty() { vec![block] } else { bodies };
    for body in sections {
        for (is_header, cells) in typed_rows_in(body) {
            if thead.is_none() && header_rows.is_empty() && is_header {
                header_rows.push(cells);
            } else if !is_header {
                body_rows.push(cells);
            }
        }
    }

    // Grouped headers ("Totals", "Shooting") sit above the real column names.
    let headers = header_rows.pop()?;
    if headers.is_empty() {
        return None;
    }
    Some(Table::new(headers, body_rows))
}

/// Inner text of every `<tbody>` in the table, in order.
fn body_sections(block: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut from = 0usize;
    while let Some((start, end)) = next_tag_block_ci(block, "<tbody", "</tbody>", from) {
        let section = &block[start..end];
        if let Some(open_end) = section.find('>') {
            out.push(&section[open_end + 1..section.len() - "</tbody>".len()]);
        }
        from = end;
    }
    out
}

fn rows_in(fragment: &str) -> Vec<Vec<String>> {
    typed_rows_in(fragment)
        .into_iter()
        .map(|(_, cells)| cells)
        .collect()
}

/// Rows with a flag telling whether every cell was a `<th>`.
fn typed_rows_in(fragment: &str) -> Vec<(bool, Vec<String>)> {
    let mut out = Vec::new();
    let mut from = 0usize;
    while let Some((start, end)) = next_tag_block_ci(fragment, "<tr", "</tr>", from) {
        let row = &fragment[start..end];
        let cells = cells_in(row);
        if !cells.is_empty() {
            let all_th = cells.iter().all(|(th, _)| *th);
            out.push((all_th, cells.into_iter().map(|(_, text)| text).collect()));
        }
        from = end;
    }
    out
}

fn cells_in(row: &str) -> Vec<(bool, String)> {
    let lc = row.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut pos = 0usize;
    loop {
        let th = lc[pos..].find("<th").map(|i| i + pos);
        let td = lc[pos..].find("<td").map(|i| i + pos);
        let (start, is_th) = match (th, td) {
            (Some(a), Some(b)) if a < b => (a, true),
            (Some(_), Some(b)) => (b, false),
            (Some(a), None) => (a, true),
            (None, Some(b)) => (b, false),
            (None, None) => break,
        };
        // Skip `<thead`/`<tbody`-like prefixes that are not cell tags.
        let after = lc.as_bytes().get(start + 3).copied();
        if !matches!(after, Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            pos = start + 3;
            continue;
        }
        let close = if is_th { "</th>" } else { "</td>" };
        let Some(open_end) = lc[start..].find('>').map(|i| i + start + 1) else {
            break;
        };
        let end = lc[open_end..]
            .find(close)
            .map(|i| i + open_end)
            .unwrap_or(lc.len());
        out.push((is_th, strip_tags(&row[open_end..end])));
        pos = (end + close.len()).min(lc.len());
    }
    out
}

fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = s.to_ascii_lowercase();
    let o = lc.find(open_pat)?;
    let after = s[o..].find('>')? + o + 1;
    let cr = lc[after..].find(close_pat)?;
    Some(&s[after..after + cr])
}

fn next_tag_block_ci(s: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    let lc = s.to_ascii_lowercase();
    let start = lc.get(from..)?.find(open)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(close)?;
    Some((start, open_end + end_rel + close.len()))
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_entities(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    decode_numeric_refs(s)
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// `&#263;` / `&#x107;` to the character; malformed references stay as text.
fn decode_numeric_refs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find("&#") {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + 2..];
        let decoded = tail.find(';').and_then(|semi| {
            let body = &tail[..semi];
            let code = match body.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => body.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32).map(|ch| (ch, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push_str("&#");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
