use crate::error::{Result, TipError};
use log::*;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A value that must never end up in logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Where the tipping API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Reads `TIPZED_API_URL`, `TIPZED_API_TOKEN` and `TIPZED_TIMEOUT_SECS`.
    ///
    /// Fails if the timeout is set but is not a positive number of seconds.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], but falls back to defaults instead of failing.
    pub fn new_from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            warn!("{e}. Using default client configuration");
            Self::default()
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where F: Fn(&str) -> Option<String> {
        let api_url = lookup("TIPZED_API_URL").unwrap_or_else(|| {
            warn!("TIPZED_API_URL not set, using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        let token = lookup("TIPZED_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(Secret::new);
        if token.is_none() {
            debug!("TIPZED_API_TOKEN not set, requests will be anonymous");
        }
        let timeout = match lookup("TIPZED_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        Ok(Self { api_url, token, timeout })
    }
}

pub fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(TipError::Config(format!(
            "Invalid timeout '{raw}': expected seconds > 0"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_reads_all_fields() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("TIPZED_API_URL", "https://api.example.com/v1"),
            ("TIPZED_API_TOKEN", "abc123"),
            ("TIPZED_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com/v1");
        assert_eq!(config.token.as_ref().map(|t| t.reveal().as_str()), Some("abc123"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        for raw in ["0", "soon", "-3"] {
            let result = ClientConfig::from_lookup(lookup_from(&[("TIPZED_TIMEOUT_SECS", raw)]));
            assert!(matches!(result, Err(TipError::Config(_))), "{raw}");
        }
    }

    #[test]
    fn test_env_or_default_never_fails() {
        let config = ClientConfig::new_from_env_or_default();
        assert!(!config.api_url.is_empty());
        assert!(config.timeout > Duration::ZERO);
    }

    #[test]
    fn test_secret_is_masked() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "hunter2");
    }
}
