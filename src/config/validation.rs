//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Validation is a pure function and reports every problem it finds, not
//! just the first.

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("upstream address '{0}' is not an absolute URL with a host")]
    InvalidUpstream(String),

    #[error("health probe timeout must be at least 1 second")]
    ZeroProbeTimeout,

    #[error("health probe timeout ({timeout_secs}s) must be shorter than the interval ({interval_secs}s)")]
    ProbeTimeoutExceedsInterval { timeout_secs: u64, interval_secs: u64 },

    #[error("request timeout must be at least 1 second")]
    ZeroRequestTimeout,
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for address in &config.upstreams.addresses {
        match Url::parse(address) {
            Ok(url) if url.host_str().is_some() => {}
            _ => errors.push(ValidationError::InvalidUpstream(address.clone())),
        }
    }

    if config.health_check.enabled {
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroProbeTimeout);
        } else if config.health_check.timeout_secs >= config.health_check.interval_secs {
            errors.push(ValidationError::ProbeTimeoutExceedsInterval {
                timeout_secs: config.health_check.timeout_secs,
                interval_secs: config.health_check.interval_secs,
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
