//! Daemon configuration
//!
//! Loaded from an optional TOML file with environment overrides for the
//! two required values. The service URL and access token have no
//! defaults: starting without them is a configuration error and the
//! daemon refuses to serve triggers.

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use vsd_client::RemoteTimeouts;

fn default_fetch_connect_ms() -> u64 {
    800
}
fn default_fetch_read_ms() -> u64 {
    1000
}
fn default_submit_connect_ms() -> u64 {
    1000
}
fn default_submit_read_ms() -> u64 {
    2000
}
fn default_submit_max_retries() -> u32 {
    5
}
fn default_submit_backoff_ms() -> u64 {
    300
}
fn default_poll_interval_ms() -> u64 {
    3000
}
fn default_listen_port() -> u16 {
    8700
}

/// Raw TOML configuration surface.
#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub service_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_fetch_connect_ms")]
    pub fetch_connect_timeout_ms: u64,
    #[serde(default = "default_fetch_read_ms")]
    pub fetch_read_timeout_ms: u64,
    #[serde(default = "default_submit_connect_ms")]
    pub submit_connect_timeout_ms: u64,
    #[serde(default = "default_submit_read_ms")]
    pub submit_read_timeout_ms: u64,
    #[serde(default = "default_submit_max_retries")]
    pub submit_max_retries: u32,
    #[serde(default = "default_submit_backoff_ms")]
    pub submit_backoff_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

/// Validated settings the daemon actually runs with.
#[derive(Debug)]
pub struct Settings {
    pub service_url: String,
    pub access_token: String,
    pub timeouts: RemoteTimeouts,
    pub poll_interval: Duration,
    pub listen_port: u16,
}

impl DaemonConfig {
    /// Load the config file (all fields optional) and apply the
    /// `VSD_SERVICE_URL` / `VSD_ACCESS_TOKEN` environment overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config: DaemonConfig = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file '{p}'"))?;
                toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file '{p}'"))?
            }
            None => toml::from_str("").context("failed to build default configuration")?,
        };

        if let Ok(url) = std::env::var("VSD_SERVICE_URL") {
            config.service_url = Some(url);
        }
        if let Ok(token) = std::env::var("VSD_ACCESS_TOKEN") {
            config.access_token = Some(token);
        }
        Ok(config)
    }

    /// Validate the required values and convert to runtime settings.
    pub fn into_settings(self) -> anyhow::Result<Settings> {
        let service_url = self
            .service_url
            .filter(|s| !s.is_empty())
            .context("service_url is not set (config file or VSD_SERVICE_URL)")?;
        let access_token = self
            .access_token
            .filter(|s| !s.is_empty())
            .context("access_token is not set (config file or VSD_ACCESS_TOKEN)")?;

        Ok(Settings {
            service_url,
            access_token,
            timeouts: RemoteTimeouts {
                fetch_connect: Duration::from_millis(self.fetch_connect_timeout_ms),
                fetch_read: Duration::from_millis(self.fetch_read_timeout_ms),
                submit_connect: Duration::from_millis(self.submit_connect_timeout_ms),
                submit_read: Duration::from_millis(self.submit_read_timeout_ms),
                submit_max_retries: self.submit_max_retries,
                submit_backoff: Duration::from_millis(self.submit_backoff_ms),
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            listen_port: self.listen_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: DaemonConfig = toml::from_str(
            r#"
            service_url = "http://localhost:5000"
            access_token = "secret"
            fetch_connect_timeout_ms = 500
            submit_max_retries = 3
            poll_interval_ms = 1000
            "#,
        )
        .unwrap();
        let settings = config.into_settings().unwrap();
        assert_eq!(settings.service_url, "http://localhost:5000");
        assert_eq!(settings.timeouts.fetch_connect, Duration::from_millis(500));
        assert_eq!(settings.timeouts.submit_max_retries, 3);
        assert_eq!(settings.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn defaults_match_design_values() {
        let config: DaemonConfig = toml::from_str(
            r#"
            service_url = "http://localhost:5000"
            access_token = "secret"
            "#,
        )
        .unwrap();
        let settings = config.into_settings().unwrap();
        assert_eq!(settings.timeouts.fetch_connect, Duration::from_millis(800));
        assert_eq!(settings.timeouts.fetch_read, Duration::from_millis(1000));
        assert_eq!(settings.timeouts.submit_connect, Duration::from_millis(1000));
        assert_eq!(settings.timeouts.submit_read, Duration::from_millis(2000));
        assert_eq!(settings.timeouts.submit_max_retries, 5);
        assert_eq!(settings.timeouts.submit_backoff, Duration::from_millis(300));
        assert_eq!(settings.poll_interval, Duration::from_millis(3000));
        assert_eq!(settings.listen_port, 8700);
    }

    #[test]
    fn missing_service_url_is_fatal() {
        let config: DaemonConfig = toml::from_str(r#"access_token = "secret""#).unwrap();
        assert!(config.into_settings().is_err());
    }

    #[test]
    fn empty_access_token_is_fatal() {
        let config: DaemonConfig = toml::from_str(
            r#"
            service_url = "http://localhost:5000"
            access_token = ""
            "#,
        )
        .unwrap();
        assert!(config.into_settings().is_err());
    }
}
