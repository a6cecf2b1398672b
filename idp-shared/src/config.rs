//! Environment-variable configuration helpers.

/// Returns the value of `key`, or `fallback` when unset or empty.
pub fn env_or(key: &str, fallback: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// Returns the value of `key` when set and non-empty.
pub fn require_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Service identity labels attached to HTTP metrics and log output.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub service: String,
    pub environment: String,
}

impl ServiceIdentity {
    pub fn new(service: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            environment: environment.into(),
        }
    }

    /// Reads `SERVICE_NAME` and `ENVIRONMENT`, falling back to the defaults
    /// the metrics contract expects for unlabeled deployments.
    pub fn from_env() -> Self {
        Self {
            service: env_or("SERVICE_NAME", "unknown-service"),
            environment: env_or("ENVIRONMENT", "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_empty() {
        std::env::set_var("IDP_TEST_EMPTY_VAR", "");
        assert_eq!(env_or("IDP_TEST_EMPTY_VAR", "fallback"), "fallback");
        std::env::set_var("IDP_TEST_SET_VAR", "value");
        assert_eq!(env_or("IDP_TEST_SET_VAR", "fallback"), "value");
    }

    #[test]
    fn require_env_treats_empty_as_missing() {
        std::env::set_var("IDP_TEST_REQUIRE_EMPTY", "");
        assert_eq!(require_env("IDP_TEST_REQUIRE_EMPTY"), None);
        std::env::set_var("IDP_TEST_REQUIRE_SET", "token");
        assert_eq!(require_env("IDP_TEST_REQUIRE_SET"), Some("token".to_string()));
    }
}
