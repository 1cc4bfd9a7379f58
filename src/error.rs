use crate::domain::loan::LoanState;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures raised by a [`LoanStore`](crate::domain::ports::LoanStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("loan with ID {0} not found")]
    NotFound(String),
    #[error("loan with ID {0} already exists")]
    AlreadyExists(String),
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Failures raised by a [`Notifier`](crate::domain::ports::Notifier).
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to deliver notification to {contact}: {reason}")]
    Delivery { contact: String, reason: String },
}

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("loan with ID {id} not found")]
    NotFound { id: String },

    #[error("loan must be in {} state to {action}, found {actual}", join_states(.required))]
    InvalidState {
        action: &'static str,
        required: &'static [LoanState],
        actual: LoanState,
    },

    #[error("{0} cannot be empty")]
    InvalidArgument(&'static str),

    #[error("investment of {amount} exceeds principal {principal} ({invested} already invested)")]
    Overfunding {
        invested: Decimal,
        amount: Decimal,
        principal: Decimal,
    },

    #[error("failed to send agreement to investor {investor_id}")]
    Notification {
        investor_id: String,
        #[source]
        source: NotifyError,
    },

    #[error("failed to {operation} loan")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

fn join_states(states: &[LoanState]) -> String {
    states
        .iter()
        .map(LoanState::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

pub type Result<T> = std::result::Result<T, LoanError>;
