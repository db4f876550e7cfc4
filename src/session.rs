//! Admin session gate: credential checks and signed session tokens.
//!
//! The gate decides, per request, whether the caller holds a valid admin
//! session. There is no server-side session store: the cookie value is a
//! self-contained HMAC-SHA256-signed token carrying the subject and its
//! validity window, so expiry is checked lazily at validation time and the
//! only revocation besides expiry is rotating the signing secret.

use crate::config::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Cookie name for the session token
pub const SESSION_COOKIE: &str = "session";

/// Login failure. Credential mismatch is the only issue-time failure;
/// token problems at validation time degrade to "not authenticated".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// A validated admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued session together with its wire token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// Claims embedded in the signed token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the admin username at issue time.
    sub: String,
    /// Issued-at (Unix timestamp, seconds).
    iat: i64,
    /// Expiry (Unix timestamp, seconds).
    exp: i64,
}

/// The session gate. Constructed once at startup from configuration and
/// shared read-only across requests.
pub struct SessionGate {
    admin_username: String,
    admin_password: String,
    secret: String,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionGate {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            admin_username: auth.admin_username.trim().to_string(),
            admin_password: auth.admin_password.trim().to_string(),
            secret: auth.session_secret.clone(),
            ttl: Duration::days(auth.session_ttl_days),
            secure_cookies: auth.secure_cookies,
        }
    }

    /// Check a credential pair and issue a session on success.
    ///
    /// Both inputs are trimmed before the comparison; the comparison itself
    /// is exact and case-sensitive.
    pub fn issue(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let username = username.trim();
        let password = password.trim();

        if username != self.admin_username || password != self.admin_password {
            return Err(AuthError::InvalidCredentials);
        }

        // Claims carry whole seconds; truncate so the returned session is
        // identical to what validate() reconstructs from the token
        let issued_at = Utc::now().trunc_subsecs(0);
        let expires_at = issued_at + self.ttl;

        let claims = Claims {
            sub: username.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        // Claims is a plain struct of scalars; serialization cannot fail
        let payload = serde_json::to_vec(&claims).expect("claims serialize");
        let encoded = URL_SAFE_NO_PAD.encode(&payload);
        let mac = self.sign(encoded.as_bytes());
        let token = format!("{encoded}.{}", URL_SAFE_NO_PAD.encode(mac));

        Ok(IssuedSession {
            token,
            session: Session {
                subject: claims.sub,
                issued_at,
                expires_at,
            },
        })
    }

    /// Validate a token and return the session it asserts.
    ///
    /// Returns `None` on any failure: malformed token, bad signature,
    /// expired, or a subject that no longer matches the configured admin.
    pub fn validate(&self, token: &str) -> Option<Session> {
        let (encoded, sig) = token.split_once('.')?;

        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).ok()?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&sig_bytes).ok()?;

        let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        let claims: Claims = serde_json::from_slice(&payload).ok()?;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)?;
        if expires_at < Utc::now() {
            return None;
        }

        if claims.sub != self.admin_username {
            return None;
        }

        Some(Session {
            subject: claims.sub,
            issued_at: DateTime::from_timestamp(claims.iat, 0)?,
            expires_at,
        })
    }

    /// Validate the token presented in a cookie header value, if any.
    pub fn validate_cookie(&self, cookie_value: Option<&str>) -> Option<Session> {
        self.validate(cookie_value?)
    }

    /// `Set-Cookie` value carrying a session token.
    pub fn session_cookie(&self, token: &str) -> String {
        let max_age = self.ttl.num_seconds();
        let secure = if self.secure_cookies { "; Secure" } else { "" };
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}{secure}"
        )
    }

    /// `Set-Cookie` value that revokes the session cookie.
    pub fn clear_cookie(&self) -> String {
        let secure = if self.secure_cookies { "; Secure" } else { "" };
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0{secure}")
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        // A zero-length key is still a valid HMAC key, so this cannot fail
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
