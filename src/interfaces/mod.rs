//! Adapters between the ledger and the outside world: CSV batch input and
//! output, and JSON account seeding.

pub mod csv;
pub mod seed;
