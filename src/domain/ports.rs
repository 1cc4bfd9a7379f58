use super::loan::{Loan, LoanState};
use crate::error::{NotifyError, StoreError};
use async_trait::async_trait;

/// Persistence contract for loan records.
///
/// Implementations hold data only; every business rule lives in the engine.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Inserts a new loan. Fails with [`StoreError::AlreadyExists`] if the id is taken.
    async fn save(&self, loan: Loan) -> Result<(), StoreError>;
    /// Fails with [`StoreError::NotFound`] if absent.
    async fn find_by_id(&self, id: &str) -> Result<Loan, StoreError>;
    /// Overwrites an existing loan. Fails with [`StoreError::NotFound`] if absent.
    async fn update(&self, loan: Loan) -> Result<(), StoreError>;
    async fn find_by_borrower_id(&self, borrower_id: &str) -> Result<Vec<Loan>, StoreError>;
    async fn find_by_state(&self, state: LoanState) -> Result<Vec<Loan>, StoreError>;
    /// Returns the 1-indexed `page` of size `limit`, ordered by creation time.
    /// Pages past the end are empty.
    async fn find_all(&self, page: usize, limit: usize) -> Result<Vec<Loan>, StoreError>;
}

/// Sends the agreement notification to an investor once a loan is fully funded.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        contact: &str,
        loan_id: &str,
        agreement_url: Option<&str>,
    ) -> Result<(), NotifyError>;
}

pub type LoanStoreBox = Box<dyn LoanStore>;
pub type NotifierBox = Box<dyn Notifier>;

