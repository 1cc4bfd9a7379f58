//! Domain model: the loan record, its state machine and the ports the
//! application layer depends on.

pub mod loan;
pub mod money;
pub mod ports;
