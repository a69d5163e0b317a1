//! CLI command implementations.

use clap::ValueEnum;
use reqwest::header::{
    HeaderMap, HeaderName, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: StatusCode, url: String },
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Caching discipline to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// `Cache-Control: no-store`
    NoStore,
    /// `no-cache` revalidated with `If-None-Match`
    Etag,
    /// `no-cache` revalidated with `If-Modified-Since`
    LastModified,
    /// `max-age=N`
    MaxAge,
}

impl Mode {
    /// Route serving this discipline.
    pub fn path(self) -> &'static str {
        match self {
            Mode::NoStore => "/api/no-store",
            Mode::Etag => "/api/etag",
            Mode::LastModified => "/api/last-modified",
            Mode::MaxAge => "/api/max-age",
        }
    }

    /// The validator header to read from a response and the conditional
    /// header to send it back in.
    pub fn revalidation(self) -> Option<(HeaderName, HeaderName)> {
        match self {
            Mode::Etag => Some((ETAG, IF_NONE_MATCH)),
            Mode::LastModified => Some((LAST_MODIFIED, IF_MODIFIED_SINCE)),
            Mode::NoStore | Mode::MaxAge => None,
        }
    }
}

/// One request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Conditional header sent, if any.
    pub sent: Option<(HeaderName, String)>,
    /// Response status.
    pub status: StatusCode,
    /// `Cache-Control` received.
    pub cache_control: Option<String>,
    /// Validator received.
    pub validator: Option<String>,
    /// Response body length in bytes.
    pub body_len: usize,
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sent {
            Some((name, value)) => writeln!(f, "  -> {name}: {value}")?,
            None => writeln!(f, "  -> (unconditional)")?,
        }
        write!(f, "  <- {}", self.status)?;
        if let Some(cc) = &self.cache_control {
            write!(f, ", cache-control: {cc}")?;
        }
        if let Some(v) = &self.validator {
            write!(f, ", validator: {v}")?;
        }
        write!(f, ", {} body bytes", self.body_len)
    }
}

/// Result of probing one discipline.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Discipline probed.
    pub mode: Mode,
    /// Initial unconditional request.
    pub first: Exchange,
    /// Revalidation request, when the discipline has a validator.
    pub revalidation: Option<Exchange>,
}

impl ProbeReport {
    /// True when the origin confirmed the cached copy with `304`.
    pub fn revalidated(&self) -> bool {
        self.revalidation
            .as_ref()
            .is_some_and(|e| e.status == StatusCode::NOT_MODIFIED)
    }
}

/// HTTP client for a Cachelab node.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a client for the node at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cachelab/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn exchange(
        &self,
        mode: Mode,
        sent: Option<(HeaderName, String)>,
    ) -> Result<Exchange> {
        let url = self.url(mode.path());
        let mut request = self.http.get(&url);
        if let Some((name, value)) = &sent {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !(status.is_success() || status == StatusCode::NOT_MODIFIED) {
            return Err(CliError::UnexpectedStatus { status, url });
        }

        let headers = response.headers().clone();
        let validator = mode
            .revalidation()
            .and_then(|(name, _)| header_string(&headers, &name));
        let body = response.bytes().await?;

        Ok(Exchange {
            sent,
            status,
            cache_control: header_string(&headers, &CACHE_CONTROL),
            validator,
            body_len: body.len(),
        })
    }

    /// Fetches a discipline once, then revalidates with whatever validator
    /// came back.
    pub async fn probe(&self, mode: Mode) -> Result<ProbeReport> {
        tracing::info!(mode = ?mode, path = mode.path(), "Probing");
        let first = self.exchange(mode, None).await?;

        let revalidation = match (mode.revalidation(), &first.validator) {
            (Some((_, conditional)), Some(validator)) => Some(
                self.exchange(mode, Some((conditional, validator.clone())))
                    .await?,
            ),
            _ => None,
        };

        Ok(ProbeReport {
            mode,
            first,
            revalidation,
        })
    }

    /// Replaces the resource content.
    pub async fn update(&self, content: Option<&str>) -> Result<Value> {
        let url = self.url("/api/update");
        let body = match content {
            Some(content) => serde_json::json!({ "content": content }),
            None => serde_json::json!({}),
        };
        tracing::info!(url = %url, "Updating resource");
        self.json(self.http.post(&url).json(&body), url).await
    }

    /// Fetches the current resource state.
    pub async fn status(&self) -> Result<Value> {
        let url = self.url("/api/status");
        self.json(self.http.get(&url), url).await
    }

    async fn json(&self, request: reqwest::RequestBuilder, url: String) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::UnexpectedStatus { status, url });
        }
        Ok(response.json().await?)
    }
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Prints a probe report.
pub fn print_report(report: &ProbeReport) {
    println!("{}", report.mode.path());
    println!("{}", report.first);
    match &report.revalidation {
        Some(exchange) => {
            println!("{exchange}");
            if report.revalidated() {
                println!("  cached copy confirmed (304 Not Modified)");
            } else {
                println!("  cached copy replaced ({})", exchange.status);
            }
        }
        None => println!("  no validator, nothing to revalidate"),
    }
}
