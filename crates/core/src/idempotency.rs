//! Idempotency keys for write requests.
//!
//! A key is the SHA-256 hex digest of a canonical string built from the
//! request method, the canonical path, and the canonical JSON body, so a
//! retried request always carries the same key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_json;
use crate::config::IdempotencyConfig;
use crate::error::CoreError;
use crate::hashing;

/// Header the API expects the key in.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Create, update and delete verbs.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(CoreError::Validation(format!("unsupported HTTP method '{s}'"))),
        }
    }
}

/// Whether `method` names a write verb. Unknown methods are not writes.
pub fn is_write_method(method: &str) -> bool {
    method.parse::<HttpMethod>().is_ok_and(|m| m.is_write())
}

/// Whether requests with `method` need an idempotency key at all.
pub fn requires_idempotency(method: HttpMethod) -> bool {
    method.is_write()
}

/// Input to key derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyPayload {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub body: Value,
}

impl IdempotencyPayload {
    pub fn new(method: HttpMethod, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// An outgoing request as seen by the API client.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Value,
    /// Per-call opt-out.
    pub skip_idempotency: bool,
}

impl WriteRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body,
            skip_idempotency: false,
        }
    }

    pub fn payload(&self) -> IdempotencyPayload {
        IdempotencyPayload::new(self.method, self.path.clone(), self.body.clone())
    }
}

/// Normalize a request path.
///
/// Enforces a leading `/`, collapses repeated slashes, drops a trailing
/// slash (except for the root) and the fragment, and sorts query parameters
/// by key then value.
pub fn canonical_path(path: &str) -> String {
    let path = path.split('#').next().unwrap_or_default();
    let (route, query) = match path.split_once('?') {
        Some((route, query)) => (route, Some(query)),
        None => (path, None),
    };

    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    let mut out = format!("/{}", segments.join("/"));

    if let Some(query) = query {
        let mut params: Vec<(&str, &str)> = query
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once('=').unwrap_or((p, "")))
            .collect();
        params.sort();
        if !params.is_empty() {
            let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            out.push('?');
            out.push_str(&rendered.join("&"));
        }
    }
    out
}

/// The exact string that is hashed into a key.
///
/// Method and path are length-prefixed so no choice of field contents can
/// make two different requests render the same string.
pub fn canonical_string(payload: &IdempotencyPayload) -> String {
    let method = payload.method.as_str();
    let path = canonical_path(&payload.path);
    let body = canonical_json(&payload.body);
    format!(
        "{}:{method}|{}:{path}|{body}",
        method.len(),
        path.len()
    )
}

/// Derive the idempotency key for `payload`.
pub fn generate_idempotency_key_sync(payload: &IdempotencyPayload) -> String {
    hashing::sha256_hex(canonical_string(payload).as_bytes())
}

/// Async entry point for request pipelines; produces exactly the same key as
/// [`generate_idempotency_key_sync`].
pub async fn generate_idempotency_key(payload: &IdempotencyPayload) -> String {
    generate_idempotency_key_sync(payload)
}

/// Whether the client should attach a key to `request`.
pub fn should_add_idempotency_key(config: &IdempotencyConfig, request: &WriteRequest) -> bool {
    if !config.enabled || request.skip_idempotency || !requires_idempotency(request.method) {
        return false;
    }
    let path = canonical_path(&request.path);
    !config
        .exempt_paths
        .iter()
        .any(|exempt| is_under(&path, &canonical_path(exempt)))
}

/// Whether `path` is `prefix` or lies below it, on segment boundaries.
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?']) || prefix == "/",
        None => false,
    }
}

/// The `(header name, key)` pair to attach to `request`, if any.
pub fn idempotency_header(
    config: &IdempotencyConfig,
    request: &WriteRequest,
) -> Option<(String, String)> {
    should_add_idempotency_key(config, request).then(|| {
        (
            config.header_name.clone(),
            generate_idempotency_key_sync(&request.payload()),
        )
    })
}
