//! HTTP surface for the loan engine.
//!
//! Handlers validate request shape, call the engine and wrap the outcome in an
//! [`response::ApiResponse`] envelope. Engine errors become status codes through
//! [`error::status_for`].

pub mod error;
pub mod handlers;
pub mod requests;
pub mod response;

use crate::application::engine::LoanEngine;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LoanEngine>,
}

impl AppState {
    pub fn new(engine: LoanEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Builds the application router with every loan route registered.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/loans",
            post(handlers::create_loan).get(handlers::list_loans),
        )
        .route("/loans/:id", get(handlers::get_loan))
        .route("/loans/:id/approve", post(handlers::approve_loan))
        .route("/loans/:id/invest", post(handlers::add_investment))
        .route("/loans/:id/disburse", post(handlers::disburse_loan))
        .route(
            "/loans/:id/agreement",
            post(handlers::generate_agreement_letter),
        )
        .route(
            "/loans/borrower/:borrower_id",
            get(handlers::loans_by_borrower),
        )
        .route("/loans/state/:state", get(handlers::loans_by_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
