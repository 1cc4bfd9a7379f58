#![allow(dead_code)]

use async_trait::async_trait;
use loanflow::application::engine::LoanEngine;
use loanflow::domain::loan::{Loan, LoanState};
use loanflow::domain::money::{Amount, Rate};
use loanflow::domain::ports::LoanStore;
use loanflow::error::StoreError;
use loanflow::infrastructure::in_memory::InMemoryLoanStore;
use loanflow::infrastructure::notifier::RecordingNotifier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Store fake that delegates to the in-memory store but can be told to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryLoanStore,
    fail_saves: Arc<AtomicBool>,
    fail_updates: Arc<AtomicBool>,
    lose_loans: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `save` fails with a backend error.
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// Every `update` fails with a backend error.
    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    /// `update` reports the loan as gone, as if it were deleted concurrently.
    pub fn lose_loans(&self) {
        self.lose_loans.store(true, Ordering::SeqCst);
    }

    pub async fn snapshot(&self, id: &str) -> Loan {
        self.inner.find_by_id(id).await.unwrap()
    }
}

fn disk_full() -> StoreError {
    StoreError::Backend(Box::new(std::io::Error::other("disk full")))
}

#[async_trait]
impl LoanStore for FlakyStore {
    async fn save(&self, loan: Loan) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.save(loan).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Loan, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, loan: Loan) -> Result<(), StoreError> {
        if self.lose_loans.load(Ordering::SeqCst) {
            return Err(StoreError::NotFound(loan.id));
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.update(loan).await
    }

    async fn find_by_borrower_id(&self, borrower_id: &str) -> Result<Vec<Loan>, StoreError> {
        self.inner.find_by_borrower_id(borrower_id).await
    }

    async fn find_by_state(&self, state: LoanState) -> Result<Vec<Loan>, StoreError> {
        self.inner.find_by_state(state).await
    }

    async fn find_all(&self, page: usize, limit: usize) -> Result<Vec<Loan>, StoreError> {
        self.inner.find_all(page, limit).await
    }
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub fn in_memory_engine() -> (LoanEngine, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let engine = LoanEngine::new(
        Box::new(InMemoryLoanStore::new()),
        Box::new(notifier.clone()),
    );
    (engine, notifier)
}

pub async fn create(engine: &LoanEngine, principal: Decimal) -> Loan {
    engine
        .create_loan(
            "borrower-123",
            amount(principal),
            Rate::new(dec!(0.05)).unwrap(),
            Rate::new(dec!(0.1)).unwrap(),
        )
        .await
        .unwrap()
}

pub async fn approved(engine: &LoanEngine, principal: Decimal) -> Loan {
    let loan = create(engine, principal).await;
    engine
        .approve_loan(&loan.id, "validator-1", "https://proof/visit.jpg")
        .await
        .unwrap();
    loan
}
