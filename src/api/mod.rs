mod batch;
mod cli;

use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    AnnuityQuote, BenefitError, DbAccrual, EARLY_RETIREMENT_PCT, LATE_RETIREMENT_PCT,
    ProjectionReport, ProjectionRequest, ScenarioParameters, ValidationErrors, annuity_conversion,
    apply_withdrawal, commutation, db_accrual, early_retirement_adjustment,
    late_retirement_adjustment, project_report, validate_parameters,
};

pub use batch::{BatchResponse, BatchRow, CsvError, parse_csv, project_csv};
pub use cli::{Cli, run_cli};

const DEFAULT_PAYMENT_FREQUENCY: u32 = 12;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Benefit(#[from] BenefitError),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error("invalid request body: {0}")]
    Body(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a ValidationErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "rejecting request");
        let fields = match &self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        };
        json_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: self.to_string(),
                fields,
            },
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct CsvPayload {
    csv: String,
}

#[derive(Debug, Deserialize)]
struct DbAccrualPayload {
    final_salary: Decimal,
    years_of_service: i64,
    accrual_rate: Decimal,
}

#[derive(Debug, Deserialize)]
struct AnnuityPayload {
    lump_sum: Decimal,
    rate_of_return: Decimal,
    payment_periods: u32,
    #[serde(default = "default_payment_frequency")]
    payment_frequency_per_year: u32,
}

#[derive(Debug, Deserialize)]
struct CommutationPayload {
    annuity_payment: Decimal,
    commutation_pct: Decimal,
}

#[derive(Debug, Serialize)]
struct CommutationResponse {
    lump_sum: Decimal,
}

#[derive(Debug, Deserialize)]
struct WithdrawPayload {
    balance: Decimal,
    withdrawal_amt: Decimal,
}

#[derive(Debug, Serialize)]
struct WithdrawResponse {
    new_balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct EarlyPayload {
    annual_pension: Decimal,
    years_early: i64,
    #[serde(default = "default_early_pct")]
    pct_per_year: Decimal,
}

#[derive(Debug, Deserialize)]
struct LatePayload {
    annual_pension: Decimal,
    years_late: i64,
    #[serde(default = "default_late_pct")]
    pct_per_year: Decimal,
}

#[derive(Debug, Serialize)]
struct AdjustmentResponse {
    adjusted_pension: Decimal,
}

fn default_payment_frequency() -> u32 {
    DEFAULT_PAYMENT_FREQUENCY
}

fn default_early_pct() -> Decimal {
    EARLY_RETIREMENT_PCT
}

fn default_late_pct() -> Decimal {
    LATE_RETIREMENT_PCT
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/dc/project", post(dc_project_handler))
        .route("/batch/dc_project", post(batch_handler))
        .route("/db/accrual", post(db_accrual_handler))
        .route("/annuity/convert", post(annuity_handler))
        .route("/commutation", post(commutation_handler))
        .route("/withdraw", post(withdraw_handler))
        .route("/adjustments/early", post(early_handler))
        .route("/adjustments/late", post(late_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "DC projection API listening");
    serve(listener).await
}

/// Serves on an already-bound listener. Tests bind port 0 and hand it in.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn dc_project_handler(
    payload: Result<Json<ProjectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let report = dc_projection(&request)?;
    Ok(json_response(StatusCode::OK, report))
}

fn dc_projection(request: &ProjectionRequest) -> Result<ProjectionReport, ApiError> {
    let params = ScenarioParameters::from(request);
    validate_parameters(&params).into_result()?;
    tracing::info!(years = params.years, "dc projection");
    Ok(project_report(&params))
}

async fn batch_handler(
    payload: Result<Json<CsvPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(CsvPayload { csv }) = payload?;
    let response = project_csv(&csv)?;
    Ok(json_response(StatusCode::OK, response))
}

async fn db_accrual_handler(
    payload: Result<Json<DbAccrualPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let accrual: DbAccrual = db_accrual(
        body.final_salary,
        body.accrual_rate,
        body.years_of_service,
    )?;
    Ok(json_response(StatusCode::OK, accrual))
}

async fn annuity_handler(
    payload: Result<Json<AnnuityPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let quote: AnnuityQuote = annuity_conversion(
        body.lump_sum,
        body.rate_of_return,
        body.payment_periods,
        body.payment_frequency_per_year,
    )?;
    Ok(json_response(StatusCode::OK, quote))
}

async fn commutation_handler(
    payload: Result<Json<CommutationPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let lump_sum = commutation(body.annuity_payment, body.commutation_pct);
    Ok(json_response(StatusCode::OK, CommutationResponse { lump_sum }))
}

async fn withdraw_handler(
    payload: Result<Json<WithdrawPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let new_balance = apply_withdrawal(body.balance, body.withdrawal_amt);
    Ok(json_response(StatusCode::OK, WithdrawResponse { new_balance }))
}

async fn early_handler(
    payload: Result<Json<EarlyPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let adjusted_pension =
        early_retirement_adjustment(body.annual_pension, body.years_early, body.pct_per_year)?;
    Ok(json_response(StatusCode::OK, AdjustmentResponse { adjusted_pension }))
}

async fn late_handler(
    payload: Result<Json<LatePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let adjusted_pension =
        late_retirement_adjustment(body.annual_pension, body.years_late, body.pct_per_year)?;
    Ok(json_response(StatusCode::OK, AdjustmentResponse { adjusted_pension }))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            fields: None,
        },
    )
}
