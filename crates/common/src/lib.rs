//! Common types shared across PaySync crates
//!
//! # Modules
//!
//! - [`types`] - Shared identifier types (UserId, AccountId, ...)

pub mod types;

pub use types::*;
