//! Client configuration.
//!
//! Values come from the environment when present and fall back to
//! defaults otherwise.
use log::warn;
use std::env;
use std::time::Duration;

const TIMEOUT_ENV_NAME: &str = "C2ARRAY_TIMEOUT_SECS";
const TIMEOUT_DEFAULT: Duration = Duration::from_secs(15);

/// Base URL of the subscriber, slash-terminated.
pub const URLBASE_ENV_NAME: &str = "C2ARRAY_URLBASE";

/// Cookie used to authorize requests.
pub const AUTH_TOKEN_ENV_NAME: &str = "C2ARRAY_AUTH_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout for a whole request, connect to last body byte.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: TIMEOUT_DEFAULT,
            user_agent: format!("c2array/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the timeout overridden by `C2ARRAY_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = env::var(TIMEOUT_ENV_NAME) {
            match parse_timeout(&val) {
                Some(timeout) => config.timeout = timeout,
                None => warn!("Ignoring {TIMEOUT_ENV_NAME}={val:?}: not a positive number of seconds"),
            }
        }
        config
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn parse_timeout(val: &str) -> Option<Duration> {
    let secs: f64 = val.trim().parse().ok()?;
    if secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Base URL and auth token from `C2ARRAY_URLBASE` and `C2ARRAY_AUTH_TOKEN`.
pub fn env_location() -> (Option<String>, Option<String>) {
    (
        env::var(URLBASE_ENV_NAME).ok(),
        env::var(AUTH_TOKEN_ENV_NAME).ok().filter(|t| !t.is_empty()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_matches_service_default() {
        assert_eq!(ClientConfig::default().timeout, Duration::from_secs(15));
        assert!(ClientConfig::default().user_agent.starts_with("c2array/"));
    }

    #[test]
    fn parses_timeouts() {
        assert_eq!(parse_timeout("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout(" 2.5 "), Some(Duration::from_millis(2500)));
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("-1"), None);
        assert_eq!(parse_timeout("soon"), None);
        assert_eq!(parse_timeout("inf"), None);
        assert_eq!(parse_timeout("NaN"), None);
        assert_eq!(parse_timeout("1e20"), None);
    }

    #[test]
    fn builder_setters() {
        let config = ClientConfig::default()
            .timeout(Duration::from_secs(1))
            .user_agent("tests");
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.user_agent, "tests");
    }
}
