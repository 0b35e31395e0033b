//! Session cookie.
//!
//! The cookie is the only carrier of the session token. It is written once,
//! by the login handler, and read by the auth gate on every protected
//! request.

use chrono::{DateTime, Utc};
use http::HeaderValue;
use http::header::InvalidHeaderValue;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";

/// Default token and cookie lifetime: five hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 5 * 60 * 60;

/// `Set-Cookie` value for a freshly issued session token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    value: String,
    expires: DateTime<Utc>,
}

impl SessionCookie {
    pub fn new(value: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self { value: value.into(), expires }
    }

    pub fn value(&self) -> &str { &self.value }
    pub fn expires(&self) -> DateTime<Utc> { self.expires }

    /// `HttpOnly`, `Secure`, `SameSite=None`, scoped to `/`, with an
    /// RFC 7231 `Expires` date mirroring the token expiry.
    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; Path=/; Expires={}; HttpOnly; Secure; SameSite=None",
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        ))
    }
}
