use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use super::money::decimal_from_json;

/// One row of a normalized projection, whatever the backend called its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnualBalance {
    pub year: i64,
    pub salary: Decimal,
    pub contribution: Decimal,
    pub growth: Decimal,
    pub balance: Decimal,
}

/// The single projection record the results view, exports and cache work
/// from. `annual_balances` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalProjection {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub annual_balances: Vec<AnnualBalance>,
    pub raw: Value,
}

/// Which backend layout a payload was recognised as.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResponseShape {
    /// `{ initial_balance, annual_balances: [...] }`
    ExplicitBalances,
    /// `{ annual_balances: [...] }`
    AnnualBalances,
    /// `{ projection: [...] }`
    Projection,
    /// `[ { balance | year | y, ... }, ... ]`
    Rows,
}

struct Detector {
    shape: ResponseShape,
    rows: fn(&Value) -> Option<&Vec<Value>>,
}

// Evaluated top to bottom, first match wins.
const DETECTORS: &[Detector] = &[
    Detector {
        shape: ResponseShape::ExplicitBalances,
        rows: explicit_balance_rows,
    },
    Detector {
        shape: ResponseShape::AnnualBalances,
        rows: annual_balance_rows,
    },
    Detector {
        shape: ResponseShape::Projection,
        rows: projection_rows,
    },
    Detector {
        shape: ResponseShape::Rows,
        rows: bare_rows,
    },
];

const YEAR_KEYS: &[&str] = &["year", "y", "period"];
const BALANCE_KEYS: &[&str] = &["balance", "final_balance"];
const CONTRIBUTION_KEYS: &[&str] = &["contribution", "contributions"];
const GROWTH_KEYS: &[&str] = &["growth"];
const SALARY_KEYS: &[&str] = &["salary", "annual_salary"];

/// Maps any recognised backend payload onto a [`CanonicalProjection`].
///
/// A JSON string holding a payload is parsed first. `None` means there is no
/// projection to show: null input, unparseable text, an unknown layout, or a
/// layout with no rows.
pub fn normalize(payload: &Value) -> Option<CanonicalProjection> {
    match payload {
        Value::String(text) => normalize_str(text),
        data => normalize_value(data).map(|(_, projection)| projection),
    }
}

pub fn normalize_str(text: &str) -> Option<CanonicalProjection> {
    let data: Value = serde_json::from_str(text).ok()?;
    normalize_value(&data).map(|(_, projection)| projection)
}

/// Like [`normalize`] but also reports which layout matched.
pub fn detect(payload: &Value) -> Option<ResponseShape> {
    match payload {
        Value::String(text) => {
            let data: Value = serde_json::from_str(text).ok()?;
            normalize_value(&data).map(|(shape, _)| shape)
        }
        data => normalize_value(data).map(|(shape, _)| shape),
    }
}

fn normalize_value(data: &Value) -> Option<(ResponseShape, CanonicalProjection)> {
    let (shape, rows) = DETECTORS
        .iter()
        .find_map(|detector| (detector.rows)(data).map(|rows| (detector.shape, rows)))?;

    let annual_balances: Vec<AnnualBalance> = rows
        .iter()
        .enumerate()
        .map(|(pos, row)| map_row(row, pos))
        .collect();
    let first = annual_balances.first()?.balance;
    let last = annual_balances.last()?.balance;

    let explicit = |key: &str| data.get(key).and_then(decimal_from_json);
    let projection = CanonicalProjection {
        initial_balance: explicit("initial_balance").unwrap_or(first),
        final_balance: explicit("final_balance").unwrap_or(last),
        annual_balances,
        raw: data.clone(),
    };
    Some((shape, projection))
}

fn array_field<'a>(data: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    data.as_object()?.get(key)?.as_array()
}

fn annual_balance_rows(data: &Value) -> Option<&Vec<Value>> {
    array_field(data, "annual_balances")
}

fn projection_rows(data: &Value) -> Option<&Vec<Value>> {
    array_field(data, "projection")
}

fn explicit_balance_rows(data: &Value) -> Option<&Vec<Value>> {
    let object = data.as_object()?;
    if !present(object, "initial_balance") {
        return None;
    }
    object.get("annual_balances")?.as_array()
}

fn bare_rows(data: &Value) -> Option<&Vec<Value>> {
    let rows = data.as_array()?;
    let first = rows.first()?.as_object()?;
    ["balance", "year", "y"]
        .iter()
        .any(|key| present(first, key))
        .then_some(rows)
}

fn present(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).is_some_and(|value| !value.is_null())
}

fn map_row(row: &Value, pos: usize) -> AnnualBalance {
    let fallback_year = i64::try_from(pos).unwrap_or(i64::MAX - 1) + 1;
    AnnualBalance {
        year: first_of(row, YEAR_KEYS)
            .and_then(year_from_json)
            .unwrap_or(fallback_year),
        salary: amount(row, SALARY_KEYS),
        contribution: amount(row, CONTRIBUTION_KEYS),
        growth: amount(row, GROWTH_KEYS),
        balance: amount(row, BALANCE_KEYS),
    }
}

fn first_of<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

fn amount(row: &Value, keys: &[&str]) -> Decimal {
    first_of(row, keys)
        .and_then(decimal_from_json)
        .unwrap_or(Decimal::ZERO)
}

fn year_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
