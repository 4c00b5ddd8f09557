//! Configuration types for demo-api.
//!
//! Config is loaded once at startup from a TOML file and validated before the
//! server opens any ports. Every field has a default, so a missing file is
//! fine; an invalid file is rejected with a clear error.
//!
//! # Example
//! ```toml
//! [server]
//! port = 8080
//! log_format = "json"
//!
//! [app]
//! name    = "demo-api"
//! version = "0.0.1"
//!
//! [access_log]
//! path = "log/app.log"
//!
//! [users]
//! cache_ttl_secs = 60
//! ```

use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity reported by `GET /version`.
    #[serde(default)]
    pub app: AppInfo,

    #[serde(default)]
    pub access_log: AccessLogConfig,

    #[serde(default)]
    pub users: UsersConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields `Ok(None)` so the
    /// caller can fall back to defaults. A file that exists but fails to parse
    /// or validate is still an error.
    pub fn load_optional(path: &Path) -> anyhow::Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.app.name.trim().is_empty(),
            "[app] name must not be empty"
        );
        anyhow::ensure!(
            !self.app.version.trim().is_empty(),
            "[app] version must not be empty"
        );
        anyhow::ensure!(
            self.server.request_timeout_secs > 0,
            "[server] request_timeout_secs must be greater than zero"
        );
        if self.access_log.enabled && self.access_log.file {
            anyhow::ensure!(
                !self.access_log.path.as_os_str().is_empty(),
                "[access_log] path must not be empty; set `file = false` to disable the file sink"
            );
        }
        Ok(())
    }
}

/// Listener and logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    #[serde(default = "defaults::host")]
    pub host: IpAddr,

    /// Listen port (default: 8080).
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log filter used when `RUST_LOG` is unset, e.g. `"demo_api=debug"`.
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            request_timeout_secs: defaults::request_timeout_secs(),
            log_level: None,
            log_format: LogFormat::default(),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppInfo {
    #[serde(default = "defaults::app_name")]
    pub name: String,
    #[serde(default = "defaults::app_version")]
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: defaults::app_name(),
            version: defaults::app_version(),
        }
    }
}

/// Access log settings.
///
/// Lines are written in the classic Gin format to `path` and, when `stdout`
/// is set, also emitted through tracing under the `demo_api::access` target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessLogConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Write lines to `path` (default: true).
    #[serde(default = "defaults::enabled")]
    pub file: bool,

    /// Log file, truncated at startup (default: `log/app.log`).
    #[serde(default = "defaults::access_log_path")]
    pub path: PathBuf,

    #[serde(default = "defaults::enabled")]
    pub stdout: bool,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            file: defaults::enabled(),
            path: defaults::access_log_path(),
            stdout: defaults::enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsersConfig {
    /// How long a user fetched from the store stays cached (default: 60).
    /// `0` disables the cache.
    #[serde(default = "defaults::cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl UsersConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: defaults::cache_ttl_secs(),
        }
    }
}

mod defaults {
    use std::{
        net::{IpAddr, Ipv4Addr},
        path::PathBuf,
    };

    pub fn host() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
    pub fn port() -> u16 { 8080 }
    pub fn request_timeout_secs() -> u64 { 30 }
    pub fn app_name() -> String { "demo-api".into() }
    pub fn app_version() -> String { "0.0.1".into() }
    pub fn enabled() -> bool { true }
    pub fn access_log_path() -> PathBuf { PathBuf::from("log/app.log") }
    pub fn cache_ttl_secs() -> u64 { 60 }
}
