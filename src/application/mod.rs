//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `LoanEngine`, which drives each loan through
//! `Proposed -> Approved -> Invested -> Disbursed`, enforcing the guard of every
//! transition and the rule that investments never exceed the principal.

pub mod engine;
