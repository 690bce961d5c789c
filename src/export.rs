use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::error::SkippedPlayer;
use crate::squad::{PlayerSummary, SquadAnalysis};
use crate::transfers::TransferPlan;

#[derive(Debug)]
pub struct ExportReport {
    pub squad_rows: usize,
    pub transfer_rows: usize,
    pub skipped_rows: usize,
}

enum Cell {
    Text(String),
    Number(f64),
}

/// Writes `Squad`, `Transfers` and `Skipped` sheets.
pub fn export_report(
    path: &Path,
    analysis: &SquadAnalysis,
    plan: &TransferPlan,
) -> Result<ExportReport> {
    let mut squad_rows = vec![header(&[
        "Player ID",
        "Player",
        "Team",
        "Position",
        "Cost",
        "Predicted Points",
    ])];
    squad_rows.extend(analysis.players.iter().map(summary_row));

    let mut transfer_rows = vec![header(&[
        "Rank",
        "Out ID",
        "Out",
        "Out Team",
        "Out Points",
        "In ID",
        "In",
        "In Team",
        "In Points",
        "Position",
        "Points Gain",
        "Cost Change",
    ])];
    for (idx, s) in plan.suggestions.iter().enumerate() {
        transfer_rows.push(vec![
            Cell::Number((idx + 1) as f64),
            Cell::Number(s.outgoing.id as f64),
            Cell::Text(s.outgoing.display_name.clone()),
            Cell::Text(s.outgoing.team_name.to_string()),
            Cell::Number(round2(s.outgoing.predicted_points)),
            Cell::Number(s.incoming.id as f64),
            Cell::Text(s.incoming.display_name.clone()),
            Cell::Text(s.incoming.team_name.to_string()),
            Cell::Number(round2(s.incoming.predicted_points)),
            Cell::Text(s.incoming.position.short_label().to_string()),
            Cell::Number(round2(s.points_gain)),
            Cell::Number(round2(s.cost_change)),
        ]);
    }

    let mut skipped_rows = vec![header(&["Player ID", "Source", "Reason"])];
    skipped_rows.extend(analysis.skipped.iter().map(|s| skipped_row(s, "squad")));
    skipped_rows.extend(plan.skipped.iter().map(|s| skipped_row(s, "transfers")));

    let mut workbook = Workbook::new();
    for (name, rows) in [
        ("Squad", &squad_rows),
        ("Transfers", &transfer_rows),
        ("Skipped", &skipped_rows),
    ] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_rows(sheet, rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        squad_rows: squad_rows.len().saturating_sub(1),
        transfer_rows: transfer_rows.len().saturating_sub(1),
        skipped_rows: skipped_rows.len().saturating_sub(1),
    })
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles.iter().map(|t| Cell::Text(t.to_string())).collect()
}

fn summary_row(p: &PlayerSummary) -> Vec<Cell> {
    vec![
        Cell::Number(p.id as f64),
        Cell::Text(p.display_name.clone()),
        Cell::Text(p.team_name.to_string()),
        Cell::Text(p.position.short_label().to_string()),
        Cell::Number(p.cost),
        Cell::Number(round2(p.predicted_points)),
    ]
}

fn skipped_row(s: &SkippedPlayer, source: &str) -> Vec<Cell> {
    vec![
        Cell::Number(s.id as f64),
        Cell::Text(source.to_string()),
        Cell::Text(s.reason.to_string()),
    ]
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match cell {
                Cell::Text(value) => worksheet.write_string(r, c, value),
                Cell::Number(value) => worksheet.write_number(r, c, *value),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
