use d1_scout::classifier::{
    TableKind, classify_roster_table, classify_stats_table, score_table, stats_rows,
};
use d1_scout::document::{Table, extract_tables};

fn table(headers: &[&str]) -> Table {
    Table::new(
        headers.iter().map(|h| h.to_string()).collect(),
        vec![headers.iter().map(|_| "1".to_string()).collect()],
    )
}

#[test]
fn stats_table_found_in_any_position() {
    let stats = table(&["Player", "G", "PTS"]);
    let schedule = table(&["Date", "Opponent", "Result"]);
    let roster = table(&["Player", "Class", "Pos"]);

    for order in [
        vec![stats.clone(), schedule.clone(), roster.clone()],
        vec![schedule.clone(), stats.clone(), roster.clone()],
        vec![schedule.clone(), roster.clone(), stats.clone()],
    ] {
        assert_eq!(classify_stats_table(&order), Some(&stats));
    }
}

#[test]
fn stats_table_not_found_without_all_required_headers() {
    let tables = vec![
        table(&["Player", "G", "MP"]),
        table(&["Player", "PTS"]),
        table(&["player", "g", "pts"]),
    ];
    assert_eq!(classify_stats_table(&tables), None);
    assert_eq!(classify_stats_table(&[]), None);
}

#[test]
fn richer_stats_table_beats_earlier_one() {
    let totals = table(&["Player", "G", "PTS"]);
    let per_game = table(&["Player", "G", "MP", "FGA", "3P%", "TRB", "PTS"]);
    let tables = vec![totals.clone(), per_game.clone()];
    assert_eq!(classify_stats_table(&tables), Some(&per_game));
    assert_eq!(score_table(&totals, TableKind::Stats), Some(3));
    assert_eq!(score_table(&per_game, TableKind::Stats), Some(7));
}

#[test]
fn equal_scores_keep_document_order() {
    let first = Table::new(
        vec!["Player".into(), "G".into(), "PTS".into()],
        vec![vec!["A".into(), "1".into(), "2".into()]],
    );
    let second = Table::new(
        vec!["Player".into(), "G".into(), "PTS".into()],
        vec![vec!["B".into(), "3".into(), "4".into()]],
    );
    let tables = vec![first.clone(), second];
    assert_eq!(classify_stats_table(&tables), Some(&first));
}

#[test]
fn roster_match_is_case_insensitive_and_needs_a_signature_column() {
    let tables = vec![
        table(&["PLAYER", "Hometown"]),
        table(&["player", "HEIGHT"]),
    ];
    assert_eq!(classify_roster_table(&tables), Some(&tables[1]));
    assert_eq!(classify_roster_table(&tables[..1]), None);
}

#[test]
fn footer_and_blank_rows_are_discarded() {
    let html = r#"
        <table>
          <thead><tr><th>Player</th><th>G</th><th>PTS</th></tr></thead>
          <tbody>
            <tr><td>A One</td><td>30</td><td>12.5</td></tr>
            <tr><td></td><td>30</td><td>0</td></tr>
            <tr><td>Team</td><td>30</td><td>70.0</td></tr>
            <tr><td>Opponent</td><td>30</td><td>65.0</td></tr>
          </tbody>
        </table>"#;
    let tables = extract_tables(html);
    let stats = classify_stats_table(&tables).unwrap();
    let rows = stats_rows(stats, "duke", 2025);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].player, "A One");
    assert_eq!(rows[0].games, Some(30));
    assert_eq!(rows[0].points, Some(12.5));
}
