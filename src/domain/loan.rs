use super::money::{Amount, Rate};
use crate::error::{LoanError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a loan.
///
/// States are totally ordered and a loan only ever moves forward:
/// `Proposed -> Approved -> Invested -> Disbursed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanState {
    Proposed,
    Approved,
    Invested,
    Disbursed,
}

impl LoanState {
    pub const ALL: [LoanState; 4] = [
        LoanState::Proposed,
        LoanState::Approved,
        LoanState::Invested,
        LoanState::Disbursed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanState::Proposed => "PROPOSED",
            LoanState::Approved => "APPROVED",
            LoanState::Invested => "INVESTED",
            LoanState::Disbursed => "DISBURSED",
        }
    }
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanState {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self> {
        LoanState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| LoanError::ValidationError(format!("unknown loan state '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub validator_id: String,
    pub proof_url: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub investor_id: String,
    pub amount: Amount,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disbursement {
    pub field_officer_id: String,
    pub signed_agreement: String,
    pub date: DateTime<Utc>,
}

/// Outcome of appending an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funding {
    /// The loan still needs `remaining` to be fully funded.
    Partial { remaining: Decimal },
    /// Cumulative investment now equals the principal exactly.
    Complete,
}

/// A peer-to-peer loan and its lifecycle record.
///
/// Mutation goes through the transition methods, which check their guard
/// before touching any field. A failed transition leaves the loan unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub borrower_id: String,
    pub principal_amount: Amount,
    pub rate: Rate,
    pub roi: Rate,
    pub agreement_letter: Option<String>,
    pub state: LoanState,
    pub approved_info: Option<Approval>,
    pub investors: Vec<Investment>,
    pub disbursed_info: Option<Disbursement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Creates a loan in the `Proposed` state.
    pub fn propose(
        id: String,
        borrower_id: String,
        principal_amount: Amount,
        rate: Rate,
        roi: Rate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            borrower_id,
            principal_amount,
            rate,
            roi,
            agreement_letter: None,
            state: LoanState::Proposed,
            approved_info: None,
            investors: Vec::new(),
            disbursed_info: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of all investments made so far.
    pub fn total_invested(&self) -> Decimal {
        self.investors.iter().map(|inv| inv.amount.value()).sum()
    }

    fn require(&self, action: &'static str, required: &'static [LoanState]) -> Result<()> {
        if required.contains(&self.state) {
            Ok(())
        } else {
            Err(LoanError::InvalidState {
                action,
                required,
                actual: self.state,
            })
        }
    }

    pub fn approve(
        &mut self,
        validator_id: String,
        proof_url: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require("be approved", &[LoanState::Proposed])?;

        self.approved_info = Some(Approval {
            validator_id,
            proof_url,
            date: now,
        });
        self.state = LoanState::Approved;
        self.updated_at = now;
        Ok(())
    }

    /// Appends an investment, moving to `Invested` when the principal is met exactly.
    ///
    /// An investment that would push the total past the principal is rejected
    /// whole; it is never clipped to the remaining balance. A sum that overflows
    /// `Decimal` is past any principal and is rejected the same way.
    pub fn add_investment(
        &mut self,
        investment: Investment,
        now: DateTime<Utc>,
    ) -> Result<Funding> {
        self.require(
            "add investment",
            &[LoanState::Approved, LoanState::Invested],
        )?;

        let principal = self.principal_amount.value();
        let invested = self.total_invested();
        let amount = investment.amount.value();
        let total = match invested.checked_add(amount) {
            Some(total) if total <= principal => total,
            _ => {
                return Err(LoanError::Overfunding {
                    invested,
                    amount,
                    principal,
                });
            }
        };

        self.investors.push(investment);
        self.updated_at = now;

        if total == principal {
            self.state = LoanState::Invested;
            Ok(Funding::Complete)
        } else {
            Ok(Funding::Partial {
                remaining: principal - total,
            })
        }
    }

    pub fn disburse(
        &mut self,
        field_officer_id: String,
        signed_agreement: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require("be disbursed", &[LoanState::Invested])?;

        self.disbursed_info = Some(Disbursement {
            field_officer_id,
            signed_agreement,
            date: now,
        });
        self.state = LoanState::Disbursed;
        self.updated_at = now;
        Ok(())
    }

    /// Sets the agreement letter reference. Allowed in any state.
    pub fn attach_agreement_letter(&mut self, letter_url: String, now: DateTime<Utc>) {
        self.agreement_letter = Some(letter_url);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn proposed(principal: Decimal) -> Loan {
        Loan::propose(
            "loan-1".to_string(),
            "borrower-1".to_string(),
            Amount::new(principal).unwrap(),
            Rate::new(dec!(0.05)).unwrap(),
            Rate::new(dec!(0.1)).unwrap(),
            Utc::now(),
        )
    }

    fn investment(id: &str, amount: Decimal) -> Investment {
        Investment {
            investor_id: id.to_string(),
            amount: Amount::new(amount).unwrap(),
            email: format!("{id}@example.com"),
        }
    }

    #[test]
    fn test_state_parsing_is_upper_case_only() {
        assert_eq!("INVESTED".parse::<LoanState>().unwrap(), LoanState::Invested);
        assert!("invested".parse::<LoanState>().is_err());
        assert!("".parse::<LoanState>().is_err());
    }

    #[test]
    fn test_state_order() {
        assert!(LoanState::Proposed < LoanState::Approved);
        assert!(LoanState::Approved < LoanState::Invested);
        assert!(LoanState::Invested < LoanState::Disbursed);
    }

    #[test]
    fn test_approve_only_from_proposed() {
        let mut loan = proposed(dec!(1000));
        loan.approve("validator".into(), "proof".into(), Utc::now())
            .unwrap();
        assert_eq!(loan.state, LoanState::Approved);
        assert!(loan.approved_info.is_some());

        let before = loan.clone();
        let err = loan
            .approve("validator".into(), "proof".into(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LoanError::InvalidState { .. }));
        assert_eq!(loan, before);
    }

    #[test]
    fn test_investment_requires_approval() {
        let mut loan = proposed(dec!(1000));
        let err = loan
            .add_investment(investment("inv-1", dec!(100)), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LoanError::InvalidState { .. }));
        assert!(loan.investors.is_empty());
    }

    #[test]
    fn test_exact_funding_completes() {
        let mut loan = proposed(dec!(1000));
        loan.approve("v".into(), "p".into(), Utc::now()).unwrap();

        let first = loan
            .add_investment(investment("inv-1", dec!(400)), Utc::now())
            .unwrap();
        assert_eq!(first, Funding::Partial { remaining: dec!(600) });
        assert_eq!(loan.state, LoanState::Approved);

        let second = loan
            .add_investment(investment("inv-2", dec!(600)), Utc::now())
            .unwrap();
        assert_eq!(second, Funding::Complete);
        assert_eq!(loan.state, LoanState::Invested);
        assert_eq!(loan.total_invested(), dec!(1000));
    }

    #[test]
    fn test_overfunding_rejected_whole() {
        let mut loan = proposed(dec!(1000));
        loan.approve("v".into(), "p".into(), Utc::now()).unwrap();
        loan.add_investment(investment("inv-1", dec!(900)), Utc::now())
            .unwrap();

        let err = loan
            .add_investment(investment("inv-2", dec!(100.01)), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            LoanError::Overfunding { invested, amount, principal }
                if invested == dec!(900) && amount == dec!(100.01) && principal == dec!(1000)
        ));
        assert_eq!(loan.investors.len(), 1);
        assert_eq!(loan.state, LoanState::Approved);
    }

    #[test]
    fn test_overfunding_near_decimal_max() {
        let mut loan = proposed(Decimal::MAX);
        loan.approve("v".into(), "p".into(), Utc::now()).unwrap();
        let half = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        loan.add_investment(investment("inv-1", half), Utc::now())
            .unwrap();

        let err = loan
            .add_investment(investment("inv-2", half), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            LoanError::Overfunding { invested, principal, .. }
                if invested == half && principal == Decimal::MAX
        ));
        assert_eq!(loan.investors.len(), 1);
        assert_eq!(loan.state, LoanState::Approved);

        let rest = investment("inv-3", Decimal::MAX - half);
        let funding = loan.add_investment(rest, Utc::now()).unwrap();
        assert_eq!(funding, Funding::Complete);
    }

    #[test]
    fn test_disburse_only_from_invested() {
        let mut loan = proposed(dec!(10));
        assert!(loan.disburse("o".into(), "s".into(), Utc::now()).is_err());
        assert!(loan.disbursed_info.is_none());

        loan.approve("v".into(), "p".into(), Utc::now()).unwrap();
        loan.add_investment(investment("inv-1", dec!(10)), Utc::now())
            .unwrap();
        loan.disburse("o".into(), "s".into(), Utc::now()).unwrap();
        assert_eq!(loan.state, LoanState::Disbursed);
        assert_eq!(
            loan.disbursed_info.as_ref().map(|d| d.field_officer_id.as_str()),
            Some("o")
        );
    }

    #[test]
    fn test_agreement_letter_in_any_state() {
        let mut loan = proposed(dec!(10));
        loan.attach_agreement_letter("https://letters/1.pdf".into(), Utc::now());
        assert_eq!(loan.agreement_letter.as_deref(), Some("https://letters/1.pdf"));
        assert_eq!(loan.state, LoanState::Proposed);
    }

    #[test]
    fn test_loan_json_uses_upper_case_state() {
        let loan = proposed(dec!(10));
        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["state"], "PROPOSED");
        assert_eq!(json["borrowerId"], "borrower-1");

        let back: Loan = serde_json::from_value(json).unwrap();
        assert_eq!(back, loan);
    }
}
