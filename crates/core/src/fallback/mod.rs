//! Fallback/degradation policy: decides when a failed API call should be
//! answered with local mock data instead of an error.
//!
//! The decision functions are pure over `(config, failure)` and never fail.

pub mod mock_data;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::FallbackConfig;

pub use mock_data::{get_mock_data, MockData, ResourceContext};

/// HTTP status for an authentication failure. Falls back deliberately so a
/// misconfigured login cannot hard-block the dashboard.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// How an API request failed, as reported by the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestFailure {
    /// No response arrived (DNS, refused connection, timeout, CORS).
    Network { message: String },
    /// The server answered with a non-success status.
    Http { status: u16, message: String },
    /// The error object had no recognizable shape.
    Malformed { detail: String },
}

impl RequestFailure {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn http(status: u16) -> Self {
        Self::Http {
            status,
            message: String::new(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Interpret a loosely shaped client error object.
    ///
    /// `{"response": {"status": 503}}` is an HTTP failure; an object with no
    /// `response` (or a null one) is a network failure; anything else,
    /// including a response without a usable status, is malformed.
    pub fn from_json(error: &Value) -> Self {
        let Some(obj) = error.as_object() else {
            return Self::Malformed {
                detail: format!("error is not an object: {error}"),
            };
        };
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match obj.get("response") {
            None | Some(Value::Null) => Self::Network { message },
            Some(response) => match response
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok())
            {
                Some(status) => Self::Http { status, message },
                None => Self::Malformed {
                    detail: format!("response without a status: {response}"),
                },
            },
        }
    }
}

/// Why a fallback did or did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackReason {
    NetworkError,
    ServerError,
    Unauthorized,
    ForceMock,
    /// Unrecognized failure; treated as possibly transient.
    Unclassified,
    None,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network-error",
            Self::ServerError => "server-error",
            Self::Unauthorized => "unauthorized",
            Self::ForceMock => "force-mock",
            Self::Unclassified => "unclassified",
            Self::None => "none",
        }
    }
}

/// Outcome of the fallback policy for one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackDecision {
    pub status: Option<u16>,
    pub should_fallback: bool,
    pub reason: FallbackReason,
}

/// Apply the fallback policy.
///
/// Precedence: disabled config never falls back; `force_mock` always does;
/// otherwise network failures, 5xx, 401, and unrecognized failures fall
/// back while every other status does not.
pub fn decide(config: &FallbackConfig, failure: &RequestFailure) -> FallbackDecision {
    let status = failure.status();
    let reason = if !config.enabled {
        FallbackReason::None
    } else if config.force_mock {
        FallbackReason::ForceMock
    } else {
        match failure {
            RequestFailure::Network { .. } => FallbackReason::NetworkError,
            RequestFailure::Malformed { .. } => FallbackReason::Unclassified,
            RequestFailure::Http { status, .. } => match *status {
                500..=599 => FallbackReason::ServerError,
                STATUS_UNAUTHORIZED => FallbackReason::Unauthorized,
                _ => FallbackReason::None,
            },
        }
    };
    FallbackDecision {
        status,
        should_fallback: reason != FallbackReason::None,
        reason,
    }
}

pub fn should_fallback(config: &FallbackConfig, failure: &RequestFailure) -> bool {
    decide(config, failure).should_fallback
}

pub fn get_fallback_reason(config: &FallbackConfig, failure: &RequestFailure) -> FallbackReason {
    decide(config, failure).reason
}

/// Record that `context` was answered with mock data. Diagnostic only.
pub fn log_fallback(context: &ResourceContext, decision: &FallbackDecision) {
    tracing::warn!(
        resource = %context,
        reason = decision.reason.as_str(),
        status = ?decision.status,
        "Serving mock data in place of failed API response"
    );
}
