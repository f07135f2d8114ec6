use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Top-level configuration for the synchronizer service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MasterConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection string, typically injected as `${DATABASE_URL}`
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Connection parameters for the external order-matching engine
///
/// An empty `base_url` is allowed: every mirror push then degrades to a
/// no-op reporting failure, and local state stays authoritative.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_engine_timeout_ms")]
    pub timeout_ms: u64,
}

/// Connection parameters for the exchange provider (account-id resolution)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            timeout_ms: default_provider_timeout_ms(),
        }
    }
}
