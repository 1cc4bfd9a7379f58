use crate::domain::loan::{Funding, Investment, Loan, LoanState};
use crate::domain::money::{Amount, Rate};
use crate::domain::ports::{LoanStoreBox, NotifierBox};
use crate::error::{LoanError, Result, StoreError};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// The loan state machine and funding aggregator.
///
/// `LoanEngine` is the only writer of loan records. Every mutating operation
/// holds the write gate for its whole load, check, notify and persist sequence,
/// so two concurrent investments on a loan can never both observe the same
/// pre-investment total. Reads bypass the gate and rely on the store's own
/// shared locking.
pub struct LoanEngine {
    store: LoanStoreBox,
    notifier: NotifierBox,
    write_gate: Mutex<()>,
}

fn require_non_empty(value: &str, field: &'static str) -> Result<()> {
    if value.is_empty() {
        Err(LoanError::InvalidArgument(field))
    } else {
        Ok(())
    }
}

/// Maps a lookup miss to `NotFound` and anything else to a persistence failure.
fn lookup_error(id: &str, err: StoreError) -> LoanError {
    match err {
        StoreError::NotFound(_) => LoanError::NotFound { id: id.to_string() },
        other => LoanError::Persistence {
            operation: "find",
            source: other,
        },
    }
}

fn normalize(value: i64, default: i64) -> usize {
    usize::try_from(if value < 1 { default } else { value }).unwrap_or(default as usize)
}

impl LoanEngine {
    /// Creates a new `LoanEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - Where loan records are kept.
    /// * `notifier` - Used to tell investors a loan is fully funded.
    pub fn new(store: LoanStoreBox, notifier: NotifierBox) -> Self {
        Self {
            store,
            notifier,
            write_gate: Mutex::new(()),
        }
    }

    async fn load(&self, id: &str) -> Result<Loan> {
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| lookup_error(id, e))
    }

    async fn persist(&self, loan: Loan) -> Result<()> {
        let id = loan.id.clone();
        self.store.update(loan).await.map_err(|source| {
            error!(loan_id = %id, error = %source, "failed to update loan");
            LoanError::Persistence {
                operation: "update",
                source,
            }
        })
    }

    /// Creates a loan in the `Proposed` state under a freshly generated id.
    pub async fn create_loan(
        &self,
        borrower_id: &str,
        principal: Amount,
        rate: Rate,
        roi: Rate,
    ) -> Result<Loan> {
        info!(
            borrower_id,
            principal_amount = %principal,
            rate = %rate.value(),
            roi = %roi.value(),
            "creating new loan"
        );

        let loan = Loan::propose(
            Uuid::new_v4().to_string(),
            borrower_id.to_string(),
            principal,
            rate,
            roi,
            Utc::now(),
        );

        let _gate = self.write_gate.lock().await;
        self.store.save(loan.clone()).await.map_err(|source| {
            error!(loan_id = %loan.id, error = %source, "failed to create loan");
            LoanError::Persistence {
                operation: "create",
                source,
            }
        })?;

        info!(loan_id = %loan.id, "loan created");
        Ok(loan)
    }

    pub async fn approve_loan(&self, id: &str, validator_id: &str, proof_url: &str) -> Result<()> {
        info!(loan_id = id, validator_id, "approving loan");

        let _gate = self.write_gate.lock().await;
        let mut loan = self.load(id).await?;
        loan.approve(validator_id.to_string(), proof_url.to_string(), Utc::now())
            .inspect_err(|e| warn!(loan_id = id, error = %e, "approval rejected"))?;
        self.persist(loan).await?;

        info!(loan_id = id, "loan approved");
        Ok(())
    }

    /// Adds an investment and, when it completes funding, notifies every investor.
    ///
    /// Notifications go out in investor order. If any of them fails the whole
    /// call fails and nothing is persisted: neither the new investment nor the
    /// state change.
    pub async fn add_investment(
        &self,
        id: &str,
        investor_id: &str,
        email: &str,
        amount: Amount,
    ) -> Result<()> {
        info!(loan_id = id, investor_id, email, amount = %amount, "adding investment");

        let _gate = self.write_gate.lock().await;
        let mut loan = self.load(id).await?;
        let investment = Investment {
            investor_id: investor_id.to_string(),
            amount,
            email: email.to_string(),
        };
        let funding = loan
            .add_investment(investment, Utc::now())
            .inspect_err(|e| warn!(loan_id = id, error = %e, "investment rejected"))?;

        match funding {
            Funding::Complete => {
                info!(loan_id = id, "loan fully funded, notifying investors");
                for inv in &loan.investors {
                    info!(
                        loan_id = id,
                        investor_id = %inv.investor_id,
                        email = %inv.email,
                        "sending agreement email"
                    );
                    self.notifier
                        .notify(&inv.email, &loan.id, loan.agreement_letter.as_deref())
                        .await
                        .map_err(|source| {
                            error!(
                                loan_id = id,
                                investor_id = %inv.investor_id,
                                error = %source,
                                "failed to send agreement email"
                            );
                            LoanError::Notification {
                                investor_id: inv.investor_id.clone(),
                                source,
                            }
                        })?;
                }
            }
            Funding::Partial { remaining } => {
                info!(loan_id = id, remaining = %remaining, "loan partially funded");
            }
        }

        self.persist(loan).await?;
        info!(loan_id = id, "investment added");
        Ok(())
    }

    pub async fn disburse_loan(
        &self,
        id: &str,
        field_officer_id: &str,
        signed_agreement: &str,
    ) -> Result<()> {
        info!(loan_id = id, field_officer_id, "disbursing loan");

        require_non_empty(id, "loan ID")?;
        require_non_empty(field_officer_id, "field officer ID")?;
        require_non_empty(signed_agreement, "signed agreement")?;

        let _gate = self.write_gate.lock().await;
        let mut loan = self.load(id).await?;
        loan.disburse(
            field_officer_id.to_string(),
            signed_agreement.to_string(),
            Utc::now(),
        )
        .inspect_err(|e| warn!(loan_id = id, error = %e, "disbursement rejected"))?;
        self.persist(loan).await?;

        info!(loan_id = id, "loan disbursed");
        Ok(())
    }

    /// Records the agreement letter reference. Permitted in every state.
    pub async fn generate_agreement_letter(&self, id: &str, letter_url: &str) -> Result<()> {
        info!(loan_id = id, letter_url, "generating agreement letter");

        require_non_empty(id, "loan ID")?;
        require_non_empty(letter_url, "letter URL")?;

        let _gate = self.write_gate.lock().await;
        let mut loan = self.load(id).await?;
        loan.attach_agreement_letter(letter_url.to_string(), Utc::now());
        self.persist(loan).await
    }

    pub async fn get_loan(&self, id: &str) -> Result<Loan> {
        require_non_empty(id, "loan ID")?;
        self.load(id).await
    }

    pub async fn get_loans_by_borrower(&self, borrower_id: &str) -> Result<Vec<Loan>> {
        require_non_empty(borrower_id, "borrower ID")?;
        let loans = self
            .store
            .find_by_borrower_id(borrower_id)
            .await
            .map_err(|source| LoanError::Persistence {
                operation: "find borrower",
                source,
            })?;
        info!(borrower_id, count = loans.len(), "loans retrieved by borrower");
        Ok(loans)
    }

    pub async fn get_loans_by_state(&self, state: LoanState) -> Result<Vec<Loan>> {
        let loans = self
            .store
            .find_by_state(state)
            .await
            .map_err(|source| LoanError::Persistence {
                operation: "find state",
                source,
            })?;
        info!(state = %state, count = loans.len(), "loans retrieved by state");
        Ok(loans)
    }

    /// Lists loans page by page. `page` or `limit` below 1 fall back to 1 and 10.
    pub async fn get_loans(&self, page: i64, limit: i64) -> Result<Vec<Loan>> {
        let page = normalize(page, DEFAULT_PAGE);
        let limit = normalize(limit, DEFAULT_LIMIT);
        self.store
            .find_all(page, limit)
            .await
            .map_err(|source| LoanError::Persistence {
                operation: "list",
                source,
            })
    }
}
