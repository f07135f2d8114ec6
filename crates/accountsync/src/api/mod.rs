//! HTTP API for the synchronizer

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::SyncApiState;
pub use routes::create_router;
