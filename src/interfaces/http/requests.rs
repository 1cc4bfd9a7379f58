use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    #[validate(length(min = 1, message = "borrowerId is required"))]
    pub borrower_id: String,
    pub principal_amount: Decimal,
    pub rate: Decimal,
    pub roi: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApproveLoanRequest {
    #[validate(length(min = 1, message = "validatorId is required"))]
    pub validator_id: String,
    #[validate(length(min = 1, message = "proofUrl is required"))]
    pub proof_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddInvestmentRequest {
    #[validate(length(min = 1, message = "investorId is required"))]
    pub investor_id: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DisburseLoanRequest {
    #[validate(length(min = 1, message = "fieldOfficerId is required"))]
    pub field_officer_id: String,
    #[validate(length(min = 1, message = "signedAgreement is required"))]
    pub signed_agreement: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgreementLetterRequest {
    #[validate(length(min = 1, message = "letterUrl is required"))]
    pub letter_url: String,
}

/// Raw pagination query. Values are kept as text so that anything
/// unparsable falls back to the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Returns `(page, limit)`, substituting 1 and 10 for missing, invalid
    /// or non-positive values.
    pub fn resolve(&self) -> (i64, i64) {
        fn parse(value: Option<&str>, default: i64) -> i64 {
            value
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v >= 1)
                .unwrap_or(default)
        }
        (
            parse(self.page.as_deref(), 1),
            parse(self.limit.as_deref(), 10),
        )
    }
}
