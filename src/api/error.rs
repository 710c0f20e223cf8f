//! Typed errors for backend calls

use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never got an HTTP response
    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx response
    #[error("{}", status_message(*.status, .message.as_deref()))]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose body did not have the expected shape
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    /// Envelope with `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid client setup: {0}")]
    Setup(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::Status {
            status: 404,
            message: Some(what.into()),
        }
    }

    /// The session is no longer accepted and must be replaced
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. } | ApiError::Session(_))
    }
}

/// User-facing text for an HTTP failure
fn status_message(status: u16, message: Option<&str>) -> String {
    match status {
        401 => "Session expired or token rejected (401); run `tenantdesk token set`".to_string(),
        403 => "You do not have permission to perform this action (403)".to_string(),
        404 => match message {
            Some(m) if !m.is_empty() => format!("Not found: {}", m),
            _ => "The requested resource was not found (404)".to_string(),
        },
        503 => "Service temporarily unavailable (503); try again shortly".to_string(),
        _ => match message {
            Some(m) if !m.is_empty() => format!("{} ({})", m, status),
            _ => format!("Request failed with status {}", status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: Option<&str>) -> ApiError {
        ApiError::Status {
            status: code,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_tailored_messages() {
        assert!(status(401, Some("jwt expired")).to_string().contains("token set"));
        assert!(status(403, None).to_string().contains("permission"));
        assert!(status(503, None).to_string().contains("temporarily unavailable"));
        assert_eq!(status(404, Some("tenant t1")).to_string(), "Not found: tenant t1");
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(status(422, Some("amount too large")).to_string(), "amount too large (422)");
        assert_eq!(status(500, None).to_string(), "Request failed with status 500");
    }

    #[test]
    fn test_is_auth() {
        assert!(status(401, None).is_auth());
        assert!(!status(403, None).is_auth());
        assert!(ApiError::Session(SessionError::Missing).is_auth());
    }
}
