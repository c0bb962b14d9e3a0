//! Minimal JSON HTTP client with safe logging, retries, and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - Redacts sensitive query params (Google's `key` included) and never logs secret values
//! - Retries 429/5xx and transport failures with exponential backoff and `Retry-After` support
//! - Optional *raw* request/response logging via `LEADSCOUT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), leadscout_http::HttpError> {
//! let client = leadscout_http::HttpClient::new("https://maps.googleapis.com/maps/api/")?;
//! let got: serde_json::Value = client
//!     .get_json("geocode/json", leadscout_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! headers, body snippets (truncated), retries, final errors, and (optionally)
//! raw request/response lines (target `http.raw`).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "LEADSCOUT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
const RATE_LIMIT_FLOOR: Duration = Duration::from_millis(1100);

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
    "signature",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_PARAMS.contains(&lower.as_str())
}

/// Copy of `url` with every secret query value replaced by `<redacted>`.
fn redacted_url(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut out = url.clone();
    if pairs.is_empty() {
        return out;
    }
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", redacted_url(url).as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let lower = key.to_ascii_lowercase();
            let val = if lower == "authorization" || lower.contains("api-key") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// True for failures where a later identical request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use leadscout_http::Auth;
/// use std::borrow::Cow;
///
/// let key = Auth::Query { name: "key", value: Cow::Borrowed("AIza-demo") };
/// match key {
///     Auth::Query { name, .. } => assert_eq!(name, "key"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header (e.g. `X-Goog-Api-Key`)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param (Google Maps web services use `key`)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

impl Auth<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
            Auth::Query { .. } => "query",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use leadscout_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     query: Some(vec![("address", Cow::Borrowed("Toronto, ON"))]),
///     auth: Some(Auth::Query {
///         name: "key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// Relative paths are joined onto `base`, so keep its trailing slash.
    ///
    /// ```no_run
    /// use leadscout_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://maps.googleapis.com/maps/api/")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("leadscout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use leadscout_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://maps.googleapis.com/maps/api/")?.with_retries(5);
    /// assert_eq!(client.max_retries, 5);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::GET, path, opts).await
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self.resolve(path, opts.allow_absolute)?;

        // Query auth rides along with the ordinary params.
        let mut query: Vec<(&str, Cow<'_, str>)> = opts.query.clone().unwrap_or_default();
        if let Some(Auth::Query { name, value }) = &opts.auth {
            query.push((*name, value.clone()));
        }
        let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
        let redacted_q: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (*k, if is_secret_param(k) { "<redacted>" } else { *v }))
            .collect();

        let auth_kind = opts.auth.as_ref().map_or("none", Auth::kind);
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());
        let mut attempt = 0usize;

        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout)
                .query(&pairs);

            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            match &opts.auth {
                Some(Auth::Bearer(tok)) => {
                    let tok = sanitize_api_key(tok)?;
                    rb = rb.bearer_auth(tok);
                }
                Some(Auth::Header { name, value }) => {
                    rb = rb.header(name, value);
                }
                Some(Auth::Query { .. }) | Some(Auth::None) | None => {}
            }

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                auth_kind,
                "http.request.start"
            );

            if raw_enabled() {
                let mut full = url.clone();
                full.query_pairs_mut().extend_pairs(pairs.iter());
                let curl = make_curl(&method, &full, opts.headers.as_ref().unwrap_or(&HeaderMap::new()));
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            let t0 = Instant::now();
            let outcome = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes()
                        .await
                        .map(|bytes| (status, headers, bytes))
                        .map_err(|e| ("body", e))
                }
                Err(e) => Err(("send", e)),
            };
            let (status, headers, bytes) = match outcome {
                Ok(parts) => parts,
                Err((stage, err)) if attempt < max_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(
                        req_id=%req_id,
                        stage,
                        attempt,
                        max_retries,
                        backoff_ms=delay.as_millis() as u64,
                        message=%err,
                        "http.retrying.network"
                    );
                    sleep(delay).await;
                    continue;
                }
                Err((stage, err)) => {
                    tracing::warn!(req_id=%req_id, stage, attempt, message=%err, "http.network_error");
                    return Err(HttpError::Network(err.to_string()));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let upstream_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-goog-request-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%upstream_id,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    %status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%text,
                    truncated
                );
            }

            let snippet = snip_body(&bytes);
            tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        req_id=%req_id,
                        serde_line=%e.line(),
                        serde_col=%e.column(),
                        serde_err=%e,
                        body_snippet=%snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let message = extract_error_message(&bytes);
            let retry_after = retry_after_delay_secs(&headers);
            let err = HttpError::Api {
                status,
                message,
                request_id: upstream_id,
            };

            if err.is_transient() && attempt < max_retries {
                attempt += 1;
                let delay = retry_delay(status, retry_after, attempt, timeout);
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    retry_after_secs=?retry_after,
                    error=%err,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                error=%err,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(err);
        }
    }
}

/// Delay before retrying a 429/5xx. `Retry-After` is honored up to `cap`
/// (the request timeout); a 429 never waits less than [`RATE_LIMIT_FLOOR`].
fn retry_delay(status: StatusCode, retry_after: Option<u64>, attempt: usize, cap: Duration) -> Duration {
    let delay = match retry_after {
        Some(secs) => Duration::from_secs(secs).min(cap),
        None => backoff(attempt),
    };
    if status == StatusCode::TOO_MANY_REQUESTS {
        delay.max(RATE_LIMIT_FLOOR)
    } else {
        delay
    }
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(10) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

fn extract_error_message(body: &[u8]) -> String {
    // Google web services: {"error_message": "...", "status": "REQUEST_DENIED"}
    // Google APIs / OpenAI style: {"error": {"message": "..."}}
    // Generic: {"message": "..."} / {"detail": "..."} / {"error": "..."}
    #[derive(Deserialize)]
    struct Nested {
        message: String,
    }
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Nested(Nested),
        Text(String),
    }
    #[derive(Deserialize)]
    struct Envelope {
        #[serde(default)]
        error_message: Option<String>,
        #[serde(default)]
        error: Option<ErrorField>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        let nested = match env.error {
            Some(ErrorField::Nested(n)) => Some(n.message),
            Some(ErrorField::Text(t)) => Some(t),
            None => None,
        };
        if let Some(found) = [env.error_message, nested, env.message, env.detail]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
        {
            return found;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_error_message_wins() {
        let body = br#"{"error_message":"The provided API key is invalid.","results":[],"status":"REQUEST_DENIED"}"#;
        assert_eq!(extract_error_message(body), "The provided API key is invalid.");
    }

    #[test]
    fn nested_and_flat_errors() {
        assert_eq!(
            extract_error_message(br#"{"error":{"code":403,"message":"denied"}}"#),
            "denied"
        );
        assert_eq!(extract_error_message(br#"{"detail":"Location not found"}"#), "Location not found");
        assert_eq!(extract_error_message(b"plain text failure"), "plain text failure");
    }

    #[test]
    fn snippets_are_capped() {
        let long = "x".repeat(2_000);
        let snip = snip_body(long.as_bytes());
        assert_eq!(snip.len(), SNIPPET_MAX + 3);
        assert!(snip.ends_with("..."));
    }

    #[test]
    fn redacts_key_in_urls() {
        let url = Url::parse("https://maps.googleapis.com/maps/api/geocode/json?address=Oslo&key=AIzaSECRET").unwrap();
        let red = redacted_url(&url);
        assert!(!red.as_str().contains("AIzaSECRET"));
        assert!(red.as_str().contains("address=Oslo"));

        let curl = make_curl(&Method::GET, &url, &HeaderMap::new());
        assert!(curl.starts_with("curl -XGET"));
        assert!(!curl.contains("AIzaSECRET"));
    }

    #[test]
    fn sanitizes_bearer_tokens() {
        assert_eq!(sanitize_api_key(" 'abc def' ").unwrap(), "abcdef");
        assert!(sanitize_api_key("tökén").is_err());
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn retry_after_is_capped_and_floored() {
        let cap = Duration::from_secs(15);
        assert_eq!(
            retry_delay(StatusCode::TOO_MANY_REQUESTS, Some(86_400), 1, cap),
            cap
        );
        assert_eq!(
            retry_delay(StatusCode::TOO_MANY_REQUESTS, Some(0), 1, cap),
            RATE_LIMIT_FLOOR
        );
        assert_eq!(
            retry_delay(StatusCode::TOO_MANY_REQUESTS, None, 1, cap),
            RATE_LIMIT_FLOOR
        );
        assert_eq!(
            retry_delay(StatusCode::SERVICE_UNAVAILABLE, Some(3), 1, cap),
            Duration::from_secs(3)
        );
        assert_eq!(
            retry_delay(StatusCode::BAD_GATEWAY, None, 2, cap),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn transient_classification() {
        assert!(HttpError::Network("reset".into()).is_transient());
        let api = HttpError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "bad".into(),
            request_id: "-".into(),
        };
        assert!(!api.is_transient());
        let limited = HttpError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".into(),
            request_id: "-".into(),
        };
        assert!(limited.is_transient());
    }
}
