use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    let substituted = substitution::substitute_env_vars(&content)?;

    let config: MasterConfig =
        serde_yaml::from_str(&substituted).with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &MasterConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let content = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}

#[instrument]
pub fn generate_default_config() -> MasterConfig {
    MasterConfig {
        service: ServiceConfig {
            name: "paysync".to_string(),
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            log_format: default_log_format(),
        },
        database: DatabaseConfig {
            url: "${DATABASE_URL}".to_string(),
            max_connections: default_max_connections(),
        },
        engine: EngineConfig {
            base_url: "http://127.0.0.1:8090".to_string(),
            timeout_ms: default_engine_timeout_ms(),
        },
        provider: ProviderConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrip() {
        let config = generate_default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: MasterConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.service.name, "paysync");
        assert_eq!(parsed.engine.timeout_ms, 2000);
        assert_eq!(parsed.provider.timeout_ms, 3000);
    }

    #[test]
    fn test_minimal_config_applies_defaults() {
        let yaml = r#"
service:
  name: paysync
database:
  url: postgres://localhost/paysync
engine:
  base_url: http://localhost:8090
"#;
        let config: MasterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.service.listen_port, 8080);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.provider.base_url, "https://app.cr.bot");
    }
}
