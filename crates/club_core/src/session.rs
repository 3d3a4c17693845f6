//! Process-wide authentication state.
//!
//! One `Session` lives for the whole program, shared as `Arc<Session>` and
//! handed to whoever needs to forward the token. It is populated on login
//! and cleared on logout; the token itself is never inspected.

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw value for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// `data` of a successful `users/auth/signin` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub access_token_expiration_date_time: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expiration_date_time: Option<String>,
}

#[derive(Debug, Clone)]
struct Credentials {
    token: AuthToken,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct Session {
    inner: RwLock<Option<Credentials>>,
}

pub type SessionHandle = Arc<Session>;

impl Session {
    pub fn new() -> SessionHandle {
        Arc::new(Self::default())
    }

    pub fn login(&self, token: AuthToken, expires_at: Option<DateTime<Utc>>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Credentials { token, expires_at });
        info!(?expires_at, "session started");
    }

    /// Store the access token of a sign-in response. An unparsable
    /// expiration is kept as "never expires" and logged.
    pub fn login_with(&self, data: &LoginData) {
        let expires_at = parse_expiration(&data.access_token_expiration_date_time);
        if expires_at.is_none() {
            warn!(
                raw = %data.access_token_expiration_date_time,
                "could not parse access token expiration"
            );
        }
        self.login(AuthToken::new(data.access_token.clone()), expires_at);
    }

    pub fn logout(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            info!("session cleared");
        }
    }

    /// The current token, unless absent or expired.
    pub fn token(&self) -> Option<AuthToken> {
        self.token_at(Utc::now())
    }

    pub fn token_at(&self, now: DateTime<Utc>) -> Option<AuthToken> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|c| c.expires_at.map(|exp| exp > now).unwrap_or(true))
            .map(|c| c.token.clone())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|c| c.expires_at)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Accepts RFC 3339 and the offset-less `YYYY-MM-DDTHH:MM:SS[.fff]` form
/// (interpreted as UTC).
pub fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
