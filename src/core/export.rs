use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::normalize::CanonicalProjection;

const CSV_HEADER: [&str; 5] = ["year", "salary", "contribution", "growth", "balance"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub total_contributions: Decimal,
    pub years: usize,
    /// Compound annual growth of the balance, in percent.
    pub cagr_percent: f64,
}

/// Row table with every cell quoted, one line per year.
pub fn to_csv(projection: &CanonicalProjection) -> String {
    let mut lines = Vec::with_capacity(projection.annual_balances.len() + 1);
    lines.push(csv_line(CSV_HEADER.iter().map(|h| h.to_string())));
    for row in &projection.annual_balances {
        lines.push(csv_line([
            row.year.to_string(),
            row.salary.to_string(),
            row.contribution.to_string(),
            row.growth.to_string(),
            row.balance.to_string(),
        ]));
    }
    lines.join("\n")
}

fn csv_line<I: IntoIterator<Item = String>>(cells: I) -> String {
    cells
        .into_iter()
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Pretty JSON of the payload exactly as the backend sent it.
pub fn to_json(projection: &CanonicalProjection) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&projection.raw)
}

pub fn summarize(projection: &CanonicalProjection) -> ProjectionSummary {
    let rows = &projection.annual_balances;
    let total_contributions = rows
        .iter()
        .fold(Decimal::ZERO, |sum, row| sum.saturating_add(row.contribution));
    ProjectionSummary {
        initial_balance: projection.initial_balance,
        final_balance: projection.final_balance,
        total_contributions,
        years: rows.len(),
        cagr_percent: cagr_percent(projection),
    }
}

fn cagr_percent(projection: &CanonicalProjection) -> f64 {
    let rows = &projection.annual_balances;
    if rows.is_empty() {
        return 0.0;
    }
    let start = if projection.initial_balance.is_zero() {
        rows[0].balance
    } else {
        projection.initial_balance
    };
    let (Some(start), Some(end)) = (start.to_f64(), projection.final_balance.to_f64()) else {
        return 0.0;
    };
    if start <= 0.0 || end <= 0.0 {
        return 0.0;
    }
    let periods = rows.len().saturating_sub(1).max(1) as f64;
    ((end / start).powf(1.0 / periods) - 1.0) * 100.0
}
