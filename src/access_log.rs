//! Per-request access log in the classic Gin text format.
//!
//! Each completed request produces one line:
//!
//! ```text
//! 10.0.0.7 - [2024-05-01T12:00:00+09:00] "GET /healthz HTTP/1.1 200 41.2µs "curl/8.5.0" "
//! ```
//!
//! Lines go to an append-only file (truncated once at startup) and, optionally,
//! to the tracing output under the `demo_api::access` target. Write failures are
//! logged and swallowed; logging never fails a request.

use std::{
    fmt,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use tokio::{fs::File, io::AsyncWriteExt, sync::Mutex};

use crate::{config::AccessLogConfig, state::AppState};

/// Sink for formatted access-log lines.
pub struct AccessLog {
    file: Option<Mutex<File>>,
    stdout: bool,
}

impl AccessLog {
    /// Open the sinks described by `cfg`.
    ///
    /// The file's parent directories are created and the file itself is
    /// truncated, so each process start begins a fresh log.
    pub async fn open(cfg: &AccessLogConfig) -> anyhow::Result<Self> {
        let file = if cfg.enabled && cfg.file {
            if let Some(dir) = cfg.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("creating log directory {}", dir.display()))?;
            }
            let file = File::create(&cfg.path)
                .await
                .with_context(|| format!("creating access log {}", cfg.path.display()))?;
            Some(Mutex::new(file))
        } else {
            None
        };

        Ok(Self {
            file,
            stdout: cfg.enabled && cfg.stdout,
        })
    }

    /// A sink that drops everything.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            file: None,
            stdout: false,
        }
    }

    pub async fn record(&self, entry: &AccessEntry) {
        let line = entry.to_string();

        if self.stdout {
            tracing::info!(target: "demo_api::access", "{}", line.trim_end());
        }

        if let Some(file) = &self.file {
            let mut file = file.lock().await;
            if let Err(e) = write_line(&mut file, &line).await {
                tracing::warn!(error = %e, "failed to write access log line");
            }
        }
    }
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

/// Everything needed to render one access-log line.
#[derive(Debug, Clone)]
pub struct AccessEntry {
    pub client_ip: String,
    pub timestamp: DateTime<FixedOffset>,
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub status: u16,
    pub latency: Duration,
    pub user_agent: String,
}

impl fmt::Display for AccessEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} - [{}] \"{} {} {} {} {:?} \"{}\" \"",
            self.client_ip,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.method,
            self.path,
            self.protocol,
            self.status,
            self.latency,
            self.user_agent,
        )
    }
}

/// Resolve the caller's address: `X-Forwarded-For` (first hop), then
/// `X-Real-IP`, then the socket peer. `-` when none is known.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = header("x-real-ip") {
        return real.to_string();
    }
    peer.map(|p| p.ip().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Axum middleware that writes one [`AccessEntry`] per request.
///
/// The peer address comes from `ConnectInfo`, which is present only when the
/// server is started with `into_make_service_with_connect_info`.
pub async fn access_log_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0);
    let client_ip = client_ip(req.headers(), peer);
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let protocol = format!("{:?}", req.version());
    let user_agent = req
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let timestamp = Local::now().fixed_offset();
    let start = Instant::now();
    let response = next.run(req).await;

    let entry = AccessEntry {
        client_ip,
        timestamp,
        method,
        path,
        protocol,
        status: response.status().as_u16(),
        latency: start.elapsed(),
        user_agent,
    };
    state.access_log.record(&entry).await;

    response
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::http::HeaderValue;

    use super::*;

    fn sample_entry() -> AccessEntry {
        AccessEntry {
            client_ip: "10.0.0.7".into(),
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T12:00:00+09:00").unwrap(),
            method: "GET".into(),
            path: "/healthz".into(),
            protocol: "HTTP/1.1".into(),
            status: 200,
            latency: Duration::from_micros(1500),
            user_agent: "curl/8.5.0".into(),
        }
    }

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("demo-api-access-{}", uuid::Uuid::new_v4()))
            .join("nested")
            .join("app.log")
    }

    // -----------------------------------------------------------------------
    // Line format
    // -----------------------------------------------------------------------

    #[test]
    fn entry_renders_gin_format() {
        assert_eq!(
            sample_entry().to_string(),
            "10.0.0.7 - [2024-05-01T12:00:00+09:00] \"GET /healthz HTTP/1.1 200 1.5ms \"curl/8.5.0\" \"\n"
        );
    }

    #[test]
    fn utc_timestamp_uses_z_suffix() {
        let mut entry = sample_entry();
        entry.timestamp = DateTime::parse_from_rfc3339("2024-05-01T03:00:00Z").unwrap();
        assert!(entry.to_string().contains("[2024-05-01T03:00:00Z]"));
    }

    // -----------------------------------------------------------------------
    // Client IP resolution
    // -----------------------------------------------------------------------

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "198.51.100.2");

        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "127.0.0.1");
    }

    #[test]
    fn client_ip_is_dash_when_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(client_ip(&headers, None), "-");
    }

    // -----------------------------------------------------------------------
    // File sink
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn open_creates_directories_and_record_appends_lines() {
        let path = temp_log_path();
        let cfg = AccessLogConfig {
            enabled: true,
            file: true,
            path: path.clone(),
            stdout: false,
        };

        let log = AccessLog::open(&cfg).await.unwrap();
        log.record(&sample_entry()).await;
        log.record(&sample_entry()).await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("10.0.0.7 - ["));

        tokio::fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).await.ok();
    }

    #[tokio::test]
    async fn open_truncates_existing_file() {
        let path = temp_log_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "stale line\n").await.unwrap();

        let cfg = AccessLogConfig {
            enabled: true,
            file: true,
            path: path.clone(),
            stdout: false,
        };
        let _log = AccessLog::open(&cfg).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.is_empty());

        tokio::fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).await.ok();
    }

    #[tokio::test]
    async fn disabled_config_opens_no_file() {
        let path = temp_log_path();
        let cfg = AccessLogConfig {
            enabled: false,
            file: true,
            path: path.clone(),
            stdout: true,
        };

        let log = AccessLog::open(&cfg).await.unwrap();
        log.record(&sample_entry()).await;

        assert!(!path.exists());
        assert!(!log.stdout);
    }
}
