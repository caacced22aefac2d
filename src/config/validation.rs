//! Configuration validation.
//!
//! Semantic checks only; serde already handled the syntax. Every problem is
//! collected so a bad file can be fixed in one pass.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSetting {
    /// Dotted path of the offending key, e.g. `upstream.base_url`.
    pub key: &'static str,
    pub reason: String,
}

impl InvalidSetting {
    fn new(key: &'static str, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InvalidSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<InvalidSetting>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(InvalidSetting::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(InvalidSetting::new(
                "upstream.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url) if url.cannot_be_a_base() => {
            errors.push(InvalidSetting::new("upstream.base_url", "must be a base URL"));
        }
        Ok(_) => {}
        Err(e) => errors.push(InvalidSetting::new("upstream.base_url", e.to_string())),
    }

    if HeaderName::from_bytes(config.upstream.api_key_header.as_bytes()).is_err() {
        errors.push(InvalidSetting::new(
            "upstream.api_key_header",
            format!("'{}' is not a valid header name", config.upstream.api_key_header),
        ));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(InvalidSetting::new("upstream.timeout_secs", "must be greater than 0"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(InvalidSetting::new(
            "upstream.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    let limits = &config.rate_limit;
    if limits.enabled {
        if limits.default_per_second == 0 {
            errors.push(InvalidSetting::new(
                "rate_limit.default_per_second",
                "must be greater than 0",
            ));
        }
        if limits.poll_per_second == 0 {
            errors.push(InvalidSetting::new(
                "rate_limit.poll_per_second",
                "must be greater than 0",
            ));
        }
        if limits.prune_interval_secs == 0 {
            errors.push(InvalidSetting::new(
                "rate_limit.prune_interval_secs",
                "must be greater than 0",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(InvalidSetting::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(InvalidSetting::new("security.max_body_size", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.base_url = "ftp://example.com".into();
        config.upstream.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let keys: Vec<_> = errors.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec!["listener.bind_address", "upstream.base_url", "upstream.timeout_secs"]
        );
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "/v2".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].key, "upstream.base_url");
    }

    #[test]
    fn test_zero_rates_ignored_when_disabled() {
        let mut config = GatewayConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.default_per_second = 0;
        assert!(validate_config(&config).is_ok());

        config.rate_limit.enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_header_name() {
        let mut config = GatewayConfig::default();
        config.upstream.api_key_header = "Api Key".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().starts_with("upstream.api_key_header"));
    }
}
