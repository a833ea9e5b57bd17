use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::money::parse_decimal;
use super::types::{Field, ScenarioForm, ScenarioParameters};

pub const NON_NEGATIVE_MESSAGE: &str = "Enter a valid non-negative number";
pub const YEARS_MESSAGE: &str = "Years must be a positive integer";
pub const RATE_MESSAGE: &str = "Enter a valid decimal (e.g. 0.05 for 5%)";
pub const YEARS_LIMIT_MESSAGE: &str = "Years must be at most 1000";

/// Longest horizon accepted for one projection.
pub const MAX_PROJECTION_YEARS: i64 = 1000;

/// Field-level validation failures. Empty means the scenario may be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid scenario: {}", describe(.0))]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, &'static str>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, msg)| (*field, *msg))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn insert(&mut self, field: Field, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }
}

fn describe(errors: &BTreeMap<Field, &'static str>) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{}: {msg}", field.as_str()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks a form as typed. Amounts must be non-negative numbers, years a
/// positive whole number, and rates any finite decimal (negative growth is a
/// legitimate down-market scenario).
pub fn validate(form: &ScenarioForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    for field in [Field::CurrentBalance, Field::AnnualSalary] {
        match parse_decimal(form.get(field)) {
            Some(value) if value >= Decimal::ZERO => {}
            _ => errors.insert(field, NON_NEGATIVE_MESSAGE),
        }
    }

    match parse_decimal(form.get(Field::Years)) {
        Some(years) if years > Decimal::from(MAX_PROJECTION_YEARS) => {
            errors.insert(Field::Years, YEARS_LIMIT_MESSAGE)
        }
        Some(years) if years.fract().is_zero() && years > Decimal::ZERO => {}
        _ => errors.insert(Field::Years, YEARS_MESSAGE),
    }

    for field in [
        Field::ContributionRate,
        Field::SalaryGrowth,
        Field::RateOfReturn,
    ] {
        if parse_decimal(form.get(field)).is_none() {
            errors.insert(field, RATE_MESSAGE);
        }
    }

    errors
}

/// Range rules for input that arrived already typed (for example as JSON).
pub fn validate_parameters(params: &ScenarioParameters) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if params.current_balance < Decimal::ZERO {
        errors.insert(Field::CurrentBalance, NON_NEGATIVE_MESSAGE);
    }
    if params.annual_salary < Decimal::ZERO {
        errors.insert(Field::AnnualSalary, NON_NEGATIVE_MESSAGE);
    }
    if params.years < 1 {
        errors.insert(Field::Years, YEARS_MESSAGE);
    } else if params.years > MAX_PROJECTION_YEARS {
        errors.insert(Field::Years, YEARS_LIMIT_MESSAGE);
    }
    errors
}
