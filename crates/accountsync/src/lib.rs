//! Account State & Settlement Synchronizer for PaySync
//!
//! This crate keeps local exchange-account state consistent, mirrors every
//! mutation to the external order-matching engine, runs the two-step
//! confirm/cancel handshake for settling orders, and maintains the
//! append-only settlement ledger used for statistics.
//!
//! The engine is the source of truth for whether an order is actually
//! settled; the local ledger only records outcomes the engine confirmed.
//!
//! # Feature Flags
//!
//! - `postgres` - Enable PostgreSQL storage
//! - `client` - Enable HTTP clients for the engine and the provider
//! - `api` - Enable the HTTP API surface

pub mod accounts;
pub mod clients;
pub mod coordinator;
pub mod error;
pub mod payload;
pub mod resolver;
pub mod stats;
pub mod store;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

// Re-export commonly used types
pub use accounts::AccountManager;
pub use coordinator::{SettlementCoordinator, SettlementStep};
pub use error::{SyncError, SyncResult};
pub use payload::{CallbackPayload, SettlementTicket};
pub use resolver::ProviderIdResolver;
pub use stats::{LedgerStats, StatsWindow};
pub use types::{Account, AccountSettings, LedgerOrder, OrderStatus};

// Store exports
pub use store::memory::MemoryStore;
pub use store::traits::SyncStore;

#[cfg(feature = "postgres")]
pub use store::postgres::PostgresStore;

#[cfg(feature = "api")]
pub use api::{create_router, SyncApiState};

// Client exports
pub use clients::engine::{DesiredState, EngineClient, MockEngineClient, ReloadRequest};
pub use clients::provider::{MockProviderClient, ProviderAccount, ProviderClient};

#[cfg(feature = "client")]
pub use clients::engine::http::HttpEngineClient;

#[cfg(feature = "client")]
pub use clients::provider::http::HttpProviderClient;
