//! Clients for the external engine and the exchange provider

pub mod engine;
pub mod provider;
