//! Observability infrastructure for PaySync
//!
//! Structured logging via tracing. Log level is controlled through the
//! `RUST_LOG` environment variable.

pub mod logging;

pub use logging::{init_logging, LogFormat};
