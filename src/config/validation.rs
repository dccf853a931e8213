use url::Url;

use crate::{
    config::models::{GatewayConfig, RawConfig},
    core::auth::CredentialSet,
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required setting: {setting}")]
    MissingSetting { setting: String },

    #[error("Invalid setting '{setting}': {message}")]
    InvalidSetting { setting: String, message: String },

    #[error("Configuration invalid:\n{message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator.
///
/// Collects every problem before failing so the operator sees the full list
/// of missing settings at once, not just the first one.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(raw: &RawConfig) -> ValidationResult<GatewayConfig> {
        let mut errors = Vec::new();

        let database_url = match raw.database_url.as_deref() {
            None | Some("") => {
                errors.push(ValidationError::MissingSetting {
                    setting: "DATABASE_URL".to_string(),
                });
                None
            }
            Some(value) => match Url::parse(value) {
                Ok(url) => Some(url),
                Err(e) => {
                    errors.push(ValidationError::InvalidSetting {
                        setting: "DATABASE_URL".to_string(),
                        message: e.to_string(),
                    });
                    None
                }
            },
        };

        let port = match raw.port {
            None => {
                errors.push(ValidationError::MissingSetting {
                    setting: "PORT".to_string(),
                });
                None
            }
            Some(0) => {
                errors.push(ValidationError::InvalidSetting {
                    setting: "PORT".to_string(),
                    message: "port must be non-zero".to_string(),
                });
                None
            }
            Some(port) => Some(port),
        };

        let asset_dir = match &raw.asset_dir {
            None => {
                errors.push(ValidationError::MissingSetting {
                    setting: "-t/--assets (UI asset directory)".to_string(),
                });
                None
            }
            Some(dir) => Some(dir.clone()),
        };

        if raw.host.trim().is_empty() {
            errors.push(ValidationError::InvalidSetting {
                setting: "HOST".to_string(),
                message: "host must not be empty".to_string(),
            });
        }

        let keepalive_interval = match humantime::parse_duration(&raw.keepalive) {
            Ok(interval) if !interval.is_zero() => Some(interval),
            Ok(_) => {
                errors.push(ValidationError::InvalidSetting {
                    setting: "KEEPALIVE_INTERVAL".to_string(),
                    message: "interval must be greater than zero".to_string(),
                });
                None
            }
            Err(e) => {
                errors.push(ValidationError::InvalidSetting {
                    setting: "KEEPALIVE_INTERVAL".to_string(),
                    message: e.to_string(),
                });
                None
            }
        };

        if !errors.is_empty() {
            return Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            });
        }

        // Unwraps are unreachable: errors is empty iff every field is Some.
        Ok(GatewayConfig {
            database_url: database_url.expect("validated"),
            host: raw.host.clone(),
            port: port.expect("validated"),
            asset_dir: asset_dir.expect("validated"),
            credentials: CredentialSet::parse(&raw.auth),
            keepalive_interval: keepalive_interval.expect("validated"),
        })
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .enumerate()
            .map(|(i, e)| format!("  {}. {e}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn complete_raw() -> RawConfig {
        RawConfig {
            database_url: Some("http://storage:9000".to_string()),
            port: Some(8080),
            asset_dir: Some("/srv/ui".into()),
            auth: "alice:secret".to_string(),
            ..RawConfig::default()
        }
    }

    #[test]
    fn complete_config_validates() {
        let config = ConfigValidator::validate(&complete_raw()).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.keepalive_interval, Duration::from_secs(20));
        assert_eq!(config.credentials.len(), 1);
    }

    #[test]
    fn every_missing_setting_is_reported() {
        let raw = RawConfig::default();
        let err = ConfigValidator::validate(&raw).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("DATABASE_URL"));
        assert!(message.contains("PORT"));
        assert!(message.contains("asset"));
    }

    #[test]
    fn zero_port_is_rejected() {
        let raw = RawConfig {
            port: Some(0),
            ..complete_raw()
        };
        let err = ConfigValidator::validate(&raw).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn unparseable_database_url_is_rejected() {
        let raw = RawConfig {
            database_url: Some("not a url".to_string()),
            ..complete_raw()
        };
        assert!(ConfigValidator::validate(&raw).is_err());
    }

    #[test]
    fn bad_keepalive_is_rejected() {
        let raw = RawConfig {
            keepalive: "soon".to_string(),
            ..complete_raw()
        };
        let err = ConfigValidator::validate(&raw).unwrap_err();
        assert!(err.to_string().contains("KEEPALIVE_INTERVAL"));
    }

    #[test]
    fn empty_auth_disables_gate() {
        let config = ConfigValidator::validate(&RawConfig {
            auth: String::new(),
            ..complete_raw()
        })
        .unwrap();
        assert!(config.credentials.is_empty());
    }
}
