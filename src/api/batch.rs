use std::collections::BTreeMap;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;

use crate::core::{ProjectionReport, ScenarioForm, ScenarioParameters, project_report, validate};

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("CSV has no header row")]
    MissingHeader,
    #[error("malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchRow {
    Projected {
        row_index: usize,
        result: ProjectionReport,
    },
    Failed {
        row_index: usize,
        row: BTreeMap<String, String>,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub count: usize,
    pub results: Vec<BatchRow>,
}

/// Projects every data row of a scenario CSV. A bad row is reported in place
/// and does not stop the rest of the batch.
pub fn project_csv(text: &str) -> Result<BatchResponse, CsvError> {
    let rows = parse_csv(text)?;
    let results: Vec<BatchRow> = rows
        .into_iter()
        .enumerate()
        .map(|(pos, row)| project_row(pos + 1, row))
        .collect();
    tracing::info!(count = results.len(), "batch projection");
    Ok(BatchResponse {
        count: results.len(),
        results,
    })
}

fn project_row(row_index: usize, row: BTreeMap<String, String>) -> BatchRow {
    let form = ScenarioForm::from_pairs(row.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Err(errors) = validate(&form).into_result() {
        return BatchRow::Failed {
            row_index,
            row,
            error: errors.to_string(),
        };
    }
    BatchRow::Projected {
        row_index,
        result: project_report(&ScenarioParameters::from_form(&form)),
    }
}

/// Header-keyed rows. Header names are trimmed and lower-cased. Quoted
/// cells may span lines. Missing trailing cells read as blank, extra cells
/// are dropped and all-blank records are skipped.
pub fn parse_csv(text: &str) -> Result<Vec<BTreeMap<String, String>>, CsvError> {
    let text = text.trim_start();
    if text.is_empty() {
        return Err(CsvError::MissingHeader);
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut cells = record.iter();
        rows.push(
            header
                .iter()
                .map(|name| (name.clone(), cells.next().unwrap_or_default().to_string()))
                .collect(),
        );
    }
    Ok(rows)
}
