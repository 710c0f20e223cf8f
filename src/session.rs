//! Persisted admin session
//!
//! The bearer token lives in `session.json` next to the config file. The
//! token is JWT-shaped; its `exp` claim is read locally (signature is not
//! checked) so an expired session is dropped before any request is made.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiError;
use crate::models::AppConfig;

/// Environment variable that overrides the stored token
pub const TOKEN_ENV: &str = "TENANTDESK_TOKEN";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session found; run `tenantdesk token set`")]
    Missing,

    #[error("session expired at {0}; run `tenantdesk token set`")]
    Expired(DateTime<Utc>),

    #[error("cannot determine config directory")]
    NoConfigDir,

    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(alias = "adminToken")]
    pub token: String,

    #[serde(default)]
    pub user: Option<AdminUser>,

    #[serde(default)]
    pub is_authenticated: bool,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry from the token's `exp` claim, `None` for opaque tokens
#[must_use]
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
            is_authenticated: true,
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiry(&self.token)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }

    /// Token with the middle elided, for display
    #[must_use]
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

pub fn session_path() -> Result<PathBuf, SessionError> {
    AppConfig::user_config_dir()
        .map(|dir| dir.join("session.json"))
        .ok_or(SessionError::NoConfigDir)
}

pub fn load_from(path: &Path) -> Result<Option<Session>, SessionError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| SessionError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_to(path: &Path, session: &Session) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(session).map_err(|source| SessionError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }
    Ok(())
}

pub fn clear_at(path: &Path) -> Result<bool, SessionError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SessionError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Drop the stored session when the server refused its token
pub fn forget_if_rejected(err: &ApiError) {
    if !err.is_auth() {
        return;
    }
    match session_path() {
        Ok(path) => {
            forget_rejected_at(&path, err);
        }
        Err(e) => tracing::warn!(error = %e, "could not locate rejected session"),
    }
}

/// Remove the session at `path` if `err` is a 401. Returns whether a file was removed.
pub fn forget_rejected_at(path: &Path, err: &ApiError) -> bool {
    if !err.is_auth() {
        return false;
    }
    match clear_at(path) {
        Ok(removed) => {
            if removed {
                tracing::info!(path = %path.display(), "removed rejected session");
            }
            removed
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not remove rejected session");
            false
        }
    }
}

/// Session to use for requests: the env override, else the stored file.
///
/// An expired stored session is removed and reported as `Expired`.
pub fn active_session(now: DateTime<Utc>) -> Result<Session, SessionError> {
    if let Ok(token) = std::env::var(TOKEN_ENV)
        && !token.trim().is_empty()
    {
        return Ok(Session::new(token.trim()));
    }
    let path = session_path()?;
    let session = load_from(&path)?.ok_or(SessionError::Missing)?;
    if session.token.is_empty() || !session.is_authenticated {
        return Err(SessionError::Missing);
    }
    if let Some(exp) = session.expires_at()
        && exp <= now
    {
        tracing::info!(expired_at = %exp, "dropping expired session");
        clear_at(&path)?;
        return Err(SessionError::Expired(exp));
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"admin","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_token_expiry() {
        let exp = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let session = Session::new(jwt_with_exp(exp.timestamp()));
        assert_eq!(session.expires_at(), Some(exp));
        assert!(!session.is_expired(exp - chrono::Duration::seconds(1)));
        assert!(session.is_expired(exp));
    }

    #[test]
    fn test_opaque_token_never_expires_locally() {
        let session = Session::new("opaque-api-key");
        assert_eq!(session.expires_at(), None);
        assert!(!session.is_expired(Utc::now()));
    }

    #[test]
    fn test_masked_token() {
        assert_eq!(Session::new("short").masked_token(), "*****");
        assert_eq!(Session::new("abcdef1234567890").masked_token(), "abcdef…7890");
    }

    #[test]
    fn test_save_load_clear() {
        let dir = std::env::temp_dir().join(format!("tenantdesk-session-{}", std::process::id()));
        let path = dir.join("session.json");
        assert_eq!(load_from(&path).unwrap(), None);

        let session = Session::new("tok");
        save_to(&path, &session).unwrap();
        assert_eq!(load_from(&path).unwrap(), Some(session));

        assert!(clear_at(&path).unwrap());
        assert!(!clear_at(&path).unwrap());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unauthorized_forgets_session() {
        let dir = std::env::temp_dir().join(format!("tenantdesk-rejected-{}", std::process::id()));
        let path = dir.join("session.json");
        save_to(&path, &Session::new("tok")).unwrap();

        let server_error = ApiError::Status {
            status: 500,
            message: None,
        };
        assert!(!forget_rejected_at(&path, &server_error));
        assert!(load_from(&path).unwrap().is_some());

        let unauthorized = ApiError::Status {
            status: 401,
            message: None,
        };
        assert!(forget_rejected_at(&path, &unauthorized));
        assert_eq!(load_from(&path).unwrap(), None);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_legacy_field_name() {
        let session: Session =
            serde_json::from_str(r#"{"adminToken": "abc", "isAuthenticated": true}"#).unwrap();
        assert_eq!(session.token, "abc");
        assert!(session.is_authenticated);
    }
}
