//! Storage backends for accounts, settings, provider mappings and the ledger

pub mod memory;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
pub use traits::{LedgerTotals, SyncStore};

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
