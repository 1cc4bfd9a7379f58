use super::paginate;
use crate::domain::loan::{Loan, LoanState};
use crate::domain::ports::LoanStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A thread-safe in-memory store for loans.
///
/// Uses `Arc<RwLock<HashMap<String, Loan>>>`: writes take the exclusive lock,
/// lookups and scans share the read lock. Loans are handed out as owned clones
/// so callers can never mutate stored state in place.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    loans: Arc<RwLock<HashMap<String, Loan>>>,
}

impl InMemoryLoanStore {
    /// Creates a new, empty in-memory loan store.
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(loans: &HashMap<String, Loan>, pred: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        loans.values().filter(|loan| pred(*loan)).cloned().collect()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn save(&self, loan: Loan) -> Result<(), StoreError> {
        let mut loans = self.loans.write().await;
        if loans.contains_key(&loan.id) {
            return Err(StoreError::AlreadyExists(loan.id));
        }
        debug!(loan_id = %loan.id, "saving loan");
        loans.insert(loan.id.clone(), loan);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Loan, StoreError> {
        let loans = self.loans.read().await;
        loans
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, loan: Loan) -> Result<(), StoreError> {
        let mut loans = self.loans.write().await;
        match loans.get_mut(&loan.id) {
            Some(slot) => {
                debug!(loan_id = %loan.id, state = %loan.state, "updating loan");
                *slot = loan;
                Ok(())
            }
            None => Err(StoreError::NotFound(loan.id)),
        }
    }

    async fn find_by_borrower_id(&self, borrower_id: &str) -> Result<Vec<Loan>, StoreError> {
        let loans = self.loans.read().await;
        Ok(Self::matching(&loans, |loan| loan.borrower_id == borrower_id))
    }

    async fn find_by_state(&self, state: LoanState) -> Result<Vec<Loan>, StoreError> {
        let loans = self.loans.read().await;
        Ok(Self::matching(&loans, |loan| loan.state == state))
    }

    async fn find_all(&self, page: usize, limit: usize) -> Result<Vec<Loan>, StoreError> {
        let all: Vec<Loan> = self.loans.read().await.values().cloned().collect();
        Ok(paginate(all, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Rate};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn loan(id: &str, borrower: &str) -> Loan {
        Loan::propose(
            id.to_string(),
            borrower.to_string(),
            Amount::new(dec!(1000)).unwrap(),
            Rate::new(dec!(0.05)).unwrap(),
            Rate::new(dec!(0.1)).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryLoanStore::new();
        let loan = loan("l-1", "b-1");

        store.save(loan.clone()).await.unwrap();
        assert_eq!(store.find_by_id("l-1").await.unwrap(), loan);

        assert!(matches!(
            store.find_by_id("missing").await,
            Err(StoreError::NotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_id() {
        let store = InMemoryLoanStore::new();
        store.save(loan("l-1", "b-1")).await.unwrap();

        let err = store.save(loan("l-1", "b-2")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.find_by_id("l-1").await.unwrap().borrower_id, "b-1");
    }

    #[tokio::test]
    async fn test_update_requires_existing() {
        let store = InMemoryLoanStore::new();
        assert!(matches!(
            store.update(loan("l-1", "b-1")).await,
            Err(StoreError::NotFound(_))
        ));

        store.save(loan("l-1", "b-1")).await.unwrap();
        let mut changed = loan("l-1", "b-1");
        changed.agreement_letter = Some("letter".to_string());
        store.update(changed.clone()).await.unwrap();
        assert_eq!(store.find_by_id("l-1").await.unwrap(), changed);
    }

    #[tokio::test]
    async fn test_scans_return_empty_on_no_match() {
        let store = InMemoryLoanStore::new();
        store.save(loan("l-1", "b-1")).await.unwrap();
        store.save(loan("l-2", "b-1")).await.unwrap();
        store.save(loan("l-3", "b-2")).await.unwrap();

        assert_eq!(store.find_by_borrower_id("b-1").await.unwrap().len(), 2);
        assert!(store.find_by_borrower_id("nobody").await.unwrap().is_empty());
        assert_eq!(
            store.find_by_state(LoanState::Proposed).await.unwrap().len(),
            3
        );
        assert!(
            store
                .find_by_state(LoanState::Disbursed)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_find_all_pages_in_creation_order() {
        let store = InMemoryLoanStore::new();
        let start = Utc::now();
        for i in 0..5 {
            let mut l = loan(&format!("l-{i}"), "b");
            l.created_at = start + Duration::seconds(i);
            store.save(l).await.unwrap();
        }

        let ids = |loans: Vec<Loan>| loans.into_iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(ids(store.find_all(1, 2).await.unwrap()), ["l-0", "l-1"]);
        assert_eq!(ids(store.find_all(3, 2).await.unwrap()), ["l-4"]);
        assert!(store.find_all(4, 2).await.unwrap().is_empty());
    }
}
