//! Domain layer: value types, the account aggregate, transaction records and
//! the ports the application layer talks to.

pub mod account;
pub mod fraud;
pub mod money;
pub mod ports;
pub mod receipt;
pub mod transaction;
