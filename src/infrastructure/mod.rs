//! Adapters implementing the domain ports.

pub mod in_memory;
pub mod notifier;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

use crate::domain::loan::Loan;

/// Orders loans by creation time (id as tie-break) and returns the 1-indexed page.
pub(crate) fn paginate(mut loans: Vec<Loan>, page: usize, limit: usize) -> Vec<Loan> {
    loans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let start = page.saturating_sub(1).saturating_mul(limit);
    loans.into_iter().skip(start).take(limit).collect()
}
