use super::AppState;
use super::error::ApiError;
use super::requests::{
    AddInvestmentRequest, AgreementLetterRequest, ApproveLoanRequest, CreateLoanRequest,
    DisburseLoanRequest, PageQuery,
};
use super::response::ApiResponse;
use crate::domain::loan::{Loan, LoanState};
use crate::domain::money::{Amount, Rate};
use crate::error::LoanError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use validator::Validate;

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "loanflow",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Rejects the request unless the loan is currently in one of `required`.
async fn ensure_state(
    state: &AppState,
    id: &str,
    action: &'static str,
    required: &'static [LoanState],
) -> Result<(), ApiError> {
    let loan = state
        .engine
        .get_loan(id)
        .await
        .map_err(ApiError::context("Loan not found"))?;

    if required.contains(&loan.state) {
        Ok(())
    } else {
        Err(ApiError::Engine {
            message: "State validation error",
            source: LoanError::InvalidState {
                action,
                required,
                actual: loan.state,
            },
        })
    }
}

pub async fn create_loan(
    State(state): State<AppState>,
    body: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> ApiResult<Loan> {
    let Json(req) = body?;
    req.validate()?;
    let principal = Amount::new(req.principal_amount)?;
    let rate = Rate::new(req.rate)?;
    let roi = Rate::new(req.roi)?;

    let loan = state
        .engine
        .create_loan(&req.borrower_id, principal, rate, roi)
        .await
        .map_err(ApiError::context("Failed to create loan"))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Loan created successfully",
        loan,
    ))
}

pub async fn get_loan(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Loan> {
    let loan = state
        .engine
        .get_loan(&id)
        .await
        .map_err(ApiError::context("Loan not found"))?;
    Ok(ApiResponse::success(StatusCode::OK, "OK", loan))
}

pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Vec<Loan>> {
    let (page, limit) = query.resolve();
    let loans = state
        .engine
        .get_loans(page, limit)
        .await
        .map_err(ApiError::context("Failed to list loans"))?;
    Ok(ApiResponse::success(StatusCode::OK, "OK", loans))
}

pub async fn approve_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ApproveLoanRequest>, JsonRejection>,
) -> ApiResult<ApproveLoanRequest> {
    let Json(req) = body?;
    req.validate()?;
    ensure_state(&state, &id, "be approved", &[LoanState::Proposed]).await?;

    state
        .engine
        .approve_loan(&id, &req.validator_id, &req.proof_url)
        .await
        .map_err(ApiError::context("Failed to approve loan"))?;

    Ok(ApiResponse::success(StatusCode::OK, "OK", req))
}

pub async fn add_investment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AddInvestmentRequest>, JsonRejection>,
) -> ApiResult<AddInvestmentRequest> {
    let Json(req) = body?;
    req.validate()?;
    let amount = Amount::new(req.amount)?;
    ensure_state(
        &state,
        &id,
        "add investment",
        &[LoanState::Approved, LoanState::Invested],
    )
    .await?;

    state
        .engine
        .add_investment(&id, &req.investor_id, &req.email, amount)
        .await
        .map_err(ApiError::context("Failed to add investment"))?;

    Ok(ApiResponse::success(StatusCode::OK, "OK", req))
}

pub async fn disburse_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DisburseLoanRequest>, JsonRejection>,
) -> ApiResult<DisburseLoanRequest> {
    let Json(req) = body?;
    req.validate()?;
    ensure_state(&state, &id, "be disbursed", &[LoanState::Invested]).await?;

    state
        .engine
        .disburse_loan(&id, &req.field_officer_id, &req.signed_agreement)
        .await
        .map_err(ApiError::context("Failed to disburse loan"))?;

    Ok(ApiResponse::success(StatusCode::OK, "OK", req))
}

pub async fn generate_agreement_letter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AgreementLetterRequest>, JsonRejection>,
) -> ApiResult<AgreementLetterRequest> {
    let Json(req) = body?;
    req.validate()?;

    state
        .engine
        .generate_agreement_letter(&id, &req.letter_url)
        .await
        .map_err(ApiError::context("Failed to generate agreement letter"))?;

    Ok(ApiResponse::success(StatusCode::OK, "OK", req))
}

pub async fn loans_by_borrower(
    State(state): State<AppState>,
    Path(borrower_id): Path<String>,
) -> ApiResult<Vec<Loan>> {
    let loans = state
        .engine
        .get_loans_by_borrower(&borrower_id)
        .await
        .map_err(ApiError::context("Failed to get loans by borrower"))?;
    Ok(ApiResponse::success(StatusCode::OK, "OK", loans))
}

pub async fn loans_by_state(
    State(state): State<AppState>,
    Path(raw_state): Path<String>,
) -> ApiResult<Vec<Loan>> {
    let loan_state: LoanState = raw_state.parse()?;
    let loans = state
        .engine
        .get_loans_by_state(loan_state)
        .await
        .map_err(ApiError::context("Failed to get loans by state"))?;
    Ok(ApiResponse::success(StatusCode::OK, "OK", loans))
}
