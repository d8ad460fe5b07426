//! Store backends implementing the core ledger traits.

pub mod memory;
pub mod postgres;
