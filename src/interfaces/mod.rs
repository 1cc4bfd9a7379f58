//! Inbound adapters translating external calls into engine operations.

pub mod http;
