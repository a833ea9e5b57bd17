use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::money::{parse_decimal, round2};

/// Scenario form fields, in the order they appear on the form.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CurrentBalance,
    AnnualSalary,
    Years,
    ContributionRate,
    SalaryGrowth,
    RateOfReturn,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::CurrentBalance,
        Field::AnnualSalary,
        Field::Years,
        Field::ContributionRate,
        Field::SalaryGrowth,
        Field::RateOfReturn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::CurrentBalance => "current_balance",
            Field::AnnualSalary => "annual_salary",
            Field::Years => "years",
            Field::ContributionRate => "contribution_rate",
            Field::SalaryGrowth => "salary_growth",
            Field::RateOfReturn => "rate_of_return",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

/// Raw, user-typed scenario input. Nothing here has been parsed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioForm {
    pub current_balance: String,
    pub annual_salary: String,
    pub years: String,
    pub contribution_rate: String,
    pub salary_growth: String,
    pub rate_of_return: String,
}

impl Default for ScenarioForm {
    fn default() -> Self {
        Self {
            current_balance: "1000.00".to_string(),
            annual_salary: "50000.00".to_string(),
            years: "10".to_string(),
            contribution_rate: "0.10".to_string(),
            salary_growth: "0.03".to_string(),
            rate_of_return: "0.05".to_string(),
        }
    }
}

impl ScenarioForm {
    /// Builds a form from string-keyed input such as a CSV row. Unknown keys
    /// are ignored and missing fields are left blank.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut form = Self {
            current_balance: String::new(),
            annual_salary: String::new(),
            years: String::new(),
            contribution_rate: String::new(),
            salary_growth: String::new(),
            rate_of_return: String::new(),
        };
        for (key, value) in pairs {
            if let Some(field) = Field::from_key(key.trim()) {
                *form.field_mut(field) = value.to_string();
            }
        }
        form
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::CurrentBalance => &self.current_balance,
            Field::AnnualSalary => &self.annual_salary,
            Field::Years => &self.years,
            Field::ContributionRate => &self.contribution_rate,
            Field::SalaryGrowth => &self.salary_growth,
            Field::RateOfReturn => &self.rate_of_return,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::CurrentBalance => &mut self.current_balance,
            Field::AnnualSalary => &mut self.annual_salary,
            Field::Years => &mut self.years,
            Field::ContributionRate => &mut self.contribution_rate,
            Field::SalaryGrowth => &mut self.salary_growth,
            Field::RateOfReturn => &mut self.rate_of_return,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioParameters {
    pub current_balance: Decimal,
    pub annual_salary: Decimal,
    pub years: i64,
    pub contribution_rate: Decimal,
    pub salary_growth: Decimal,
    pub rate_of_return: Decimal,
}

impl ScenarioParameters {
    /// Lenient conversion used by the preview: anything unparseable becomes 0
    /// and fractional years are truncated.
    pub fn from_form(form: &ScenarioForm) -> Self {
        let number = |field: Field| parse_decimal(form.get(field)).unwrap_or(Decimal::ZERO);
        Self {
            current_balance: number(Field::CurrentBalance),
            annual_salary: number(Field::AnnualSalary),
            years: number(Field::Years).trunc().to_i64().unwrap_or(0),
            contribution_rate: number(Field::ContributionRate),
            salary_growth: number(Field::SalaryGrowth),
            rate_of_return: number(Field::RateOfReturn),
        }
    }
}

/// One projected year. `index` is 1-based and goes out on the wire as `year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionYear {
    #[serde(rename = "year")]
    pub index: u32,
    pub salary: Decimal,
    pub contribution: Decimal,
    pub growth: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumptions {
    pub contribution_rate: Decimal,
    pub salary_growth: Decimal,
    pub rate_of_return: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retirement_age: Option<u32>,
}

/// Body of `POST /dc/project`. Decimals serialize as strings and accept
/// either strings or numbers when read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub current_balance: Decimal,
    pub annual_salary: Decimal,
    pub years: i64,
    pub assumptions: Assumptions,
}

impl From<&ScenarioParameters> for ProjectionRequest {
    fn from(params: &ScenarioParameters) -> Self {
        Self {
            current_balance: params.current_balance,
            annual_salary: params.annual_salary,
            years: params.years,
            assumptions: Assumptions {
                contribution_rate: params.contribution_rate,
                salary_growth: params.salary_growth,
                rate_of_return: params.rate_of_return,
                retirement_age: None,
            },
        }
    }
}

impl From<&ProjectionRequest> for ScenarioParameters {
    fn from(request: &ProjectionRequest) -> Self {
        Self {
            current_balance: request.current_balance,
            annual_salary: request.annual_salary,
            years: request.years,
            contribution_rate: request.assumptions.contribution_rate,
            salary_growth: request.assumptions.salary_growth,
            rate_of_return: request.assumptions.rate_of_return,
        }
    }
}

/// What the reference calculator returns for a DC projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub initial_balance: Decimal,
    pub annual_balances: Vec<ProjectionYear>,
    pub final_balance: Decimal,
}

impl ProjectionReport {
    pub fn new(params: &ScenarioParameters, annual_balances: Vec<ProjectionYear>) -> Self {
        let initial_balance = round2(params.current_balance);
        let final_balance = annual_balances
            .last()
            .map(|row| row.balance)
            .unwrap_or(initial_balance);
        Self {
            initial_balance,
            annual_balances,
            final_balance,
        }
    }
}
