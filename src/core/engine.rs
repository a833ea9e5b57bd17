use rust_decimal::Decimal;

use super::money::round2;
use super::types::{ProjectionReport, ProjectionYear, ScenarioForm, ScenarioParameters};

/// Year-by-year DC projection.
///
/// Each year the contribution is taken from the current salary, growth is
/// earned on the opening balance plus that contribution, and the salary then
/// grows for the following year. Every intermediate amount is rounded to
/// cents at the same points as the reference calculator, so both sides agree
/// to the cent. Requests for fewer than one year yield a single row.
pub fn project(params: &ScenarioParameters) -> Vec<ProjectionYear> {
    let years = params.years.max(1);
    let salary_factor = Decimal::ONE.saturating_add(params.salary_growth);

    let mut balance = params.current_balance;
    let mut salary = params.annual_salary;
    let mut rows = Vec::with_capacity(usize::try_from(years).unwrap_or(0).min(1024));

    for index in 1..=years {
        let contribution = round2(salary.saturating_mul(params.contribution_rate));
        let growth = round2(
            balance
                .saturating_add(contribution)
                .saturating_mul(params.rate_of_return),
        );
        balance = round2(balance.saturating_add(contribution).saturating_add(growth));
        rows.push(ProjectionYear {
            index: u32::try_from(index).unwrap_or(u32::MAX),
            salary: round2(salary),
            contribution,
            growth,
            balance,
        });
        salary = round2(salary.saturating_mul(salary_factor));
    }

    rows
}

/// Local preview of a form as typed. Both the live preview and the
/// transport fallback go through here.
pub fn preview(form: &ScenarioForm) -> Vec<ProjectionYear> {
    project(&ScenarioParameters::from_form(form))
}

pub fn project_report(params: &ScenarioParameters) -> ProjectionReport {
    ProjectionReport::new(params, project(params))
}
