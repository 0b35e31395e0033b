//! Process configuration, read from environment variables at startup.
//!
//! | Variable | Default |
//! |---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `CORS_ALLOWED_ORIGIN` | `http://localhost:3000` |
//! | `JWT_SECRET` | unset: every token check fails |
//! | `SESSION_TTL_SECS` | `18000` |

use std::net::SocketAddr;

use chrono::TimeDelta;
use tracing::Dispatch;

use crate::error::Error;
use crate::session::DEFAULT_SESSION_TTL_SECS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub allowed_origin: String,
    pub jwt_secret: Option<String>,
    pub session_ttl: TimeDelta,
    /// Where the access log is written. Silent unless replaced.
    pub log_sink: Dispatch,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("BIND_ADDR: {e}")))?;

        let allowed_origin =
            lookup("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_owned());

        let jwt_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());

        let ttl_secs = match lookup("SESSION_TTL_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| Error::Config(format!("SESSION_TTL_SECS: invalid value `{raw}`")))?,
            None => DEFAULT_SESSION_TTL_SECS,
        };
        let session_ttl = TimeDelta::try_seconds(ttl_secs)
            .ok_or_else(|| Error::Config("SESSION_TTL_SECS: out of range".into()))?;

        Ok(Self {
            bind_addr,
            allowed_origin,
            jwt_secret,
            session_ttl,
            log_sink: Dispatch::none(),
        })
    }

    pub fn with_log_sink(mut self, sink: Dispatch) -> Self {
        self.log_sink = sink;
        self
    }
}
