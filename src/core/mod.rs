mod benefits;
mod engine;
mod export;
mod money;
mod normalize;
mod types;
mod validate;

pub use benefits::{
    AnnuityQuote, BenefitError, DbAccrual, EARLY_RETIREMENT_PCT, LATE_RETIREMENT_PCT,
    annuity_conversion, apply_withdrawal, commutation, db_accrual, early_retirement_adjustment,
    late_retirement_adjustment,
};
pub use engine::{preview, project, project_report};
pub use export::{ProjectionSummary, summarize, to_csv, to_json};
pub use money::{decimal_from_json, parse_decimal, round2};
pub use normalize::{
    AnnualBalance, CanonicalProjection, ResponseShape, detect, normalize, normalize_str,
};
pub use types::{
    Assumptions, Field, ProjectionReport, ProjectionRequest, ProjectionYear, ScenarioForm,
    ScenarioParameters,
};
pub use validate::{
    MAX_PROJECTION_YEARS, NON_NEGATIVE_MESSAGE, RATE_MESSAGE, ValidationErrors, YEARS_LIMIT_MESSAGE,
    YEARS_MESSAGE, validate, validate_parameters,
};
