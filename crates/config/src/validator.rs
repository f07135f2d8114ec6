use crate::*;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Listen port must not be 0")]
    InvalidListenPort,

    #[error("Database URL is required")]
    MissingDatabaseUrl,

    #[error("Database URL contains unresolved environment variables: {0}")]
    UnresolvedDatabaseUrl(String),

    #[error("Invalid {field} URL '{value}': {message}")]
    InvalidUrl {
        field: String,
        value: String,
        message: String,
    },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

/// Validate a loaded configuration
///
/// An empty engine base URL is a warning, not an error: the service still
/// runs, every mirror push just reports failure.
pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    if config.service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }
    if observability_format_is_unknown(&config.service.log_format) {
        report.add_error(ValidationError::InvalidLogFormat(
            config.service.log_format.clone(),
        ));
    }
    if config.service.listen_port == 0 {
        report.add_error(ValidationError::InvalidListenPort);
    }

    if config.database.url.trim().is_empty() {
        report.add_error(ValidationError::MissingDatabaseUrl);
    } else if substitution::has_unresolved_env_vars(&config.database.url) {
        report.add_error(ValidationError::UnresolvedDatabaseUrl(
            config.database.url.clone(),
        ));
    }
    if config.database.max_connections == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "database.max_connections".to_string(),
        });
    }

    if config.engine.base_url.trim().is_empty() {
        report.add_warning(
            "engine.base_url",
            "not set; mirror pushes will be skipped and reported as failed",
        );
    } else {
        check_url(&mut report, "engine.base_url", &config.engine.base_url);
    }
    if config.engine.timeout_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "engine.timeout_ms".to_string(),
        });
    } else if config.engine.timeout_ms > 10_000 {
        report.add_warning(
            "engine.timeout_ms",
            "over 10s; engine calls are meant to fail fast",
        );
    }

    check_url(&mut report, "provider.base_url", &config.provider.base_url);
    if config.provider.timeout_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provider.timeout_ms".to_string(),
        });
    }

    report
}

fn check_url(report: &mut ValidationReport, field: &str, value: &str) {
    if let Err(e) = Url::parse(value) {
        report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        });
    }
}

fn observability_format_is_unknown(format: &str) -> bool {
    !matches!(format.to_lowercase().as_str(), "pretty" | "json" | "compact")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::generate_default_config;

    fn valid_config() -> MasterConfig {
        let mut config = generate_default_config();
        config.database.url = "postgres://localhost/paysync".to_string();
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&valid_config());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn test_unresolved_database_url_is_error() {
        let config = generate_default_config();
        let report = validate_config(&config);
        assert!(!report.is_valid());
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnresolvedDatabaseUrl(_))));
    }

    #[test]
    fn test_empty_engine_url_is_warning_only() {
        let mut config = valid_config();
        config.engine.base_url = String::new();
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "engine.base_url"));
    }

    #[test]
    fn test_bad_urls_and_timeouts() {
        let mut config = valid_config();
        config.engine.base_url = "not a url".to_string();
        config.provider.timeout_ms = 0;
        let report = validate_config(&config);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_unknown_log_format() {
        let mut config = valid_config();
        config.service.log_format = "fancy".to_string();
        let report = validate_config(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidLogFormat(_))));
    }
}
