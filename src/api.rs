//! HTTP surface of the forum backend.
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | `POST` | `/api/v1/users/create` | none |
//! | `POST` | `/api/v1/users/login` | none |
//! | `GET` | `/api/v1/auth/checkCookie` | none |
//! | `*` | `/api/v1/users/private/findById` | session cookie |
//!
//! Every route runs behind request-id tagging, access logging and CORS, in
//! that order. Routes under [`PRIVATE_PREFIX`] additionally pass the
//! [`AuthGate`].

use std::future::Future;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use http::StatusCode;
use http::header::SET_COOKIE;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::context::Context;
use crate::dispatch::App;
use crate::error::{ApiError, Error};
use crate::handler::Handler;
use crate::middleware::{AccessLog, AuthGate, Cors, RequestId};
use crate::request::Request;
use crate::response::{Json, Response};
use crate::session::{SESSION_COOKIE, SessionCookie};
use crate::store::{StoreError, User, UserStore};
use crate::token::TokenCodec;

pub const CREATE_USER: &str = "/api/v1/users/create";
pub const LOGIN: &str = "/api/v1/users/login";
pub const CHECK_COOKIE: &str = "/api/v1/auth/checkCookie";
pub const FIND_BY_ID: &str = "/api/v1/users/private/findById";

/// Everything at or below this prefix requires a session.
pub const PRIVATE_PREFIX: &str = "/api/v1/users/private";

pub const INVALID_CREDENTIALS: &str = "invalid login credentials";

/// Shared, read-only state for the handlers.
pub struct ApiState {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenCodec>,
    session_ttl: TimeDelta,
}

/// Builds the full application: middleware stack and route table.
pub fn app(config: &Config, store: Arc<dyn UserStore>) -> Result<App, Error> {
    let tokens = Arc::new(match config.jwt_secret.as_deref() {
        Some(secret) => TokenCodec::new(secret.as_bytes()),
        None => {
            tracing::warn!("JWT_SECRET is not set; logins will fail and private routes reject everyone");
            TokenCodec::unconfigured()
        }
    });
    let cors = Cors::new(&config.allowed_origin)
        .map_err(|e| Error::Config(format!("CORS_ALLOWED_ORIGIN: {e}")))?;

    let state = Arc::new(ApiState {
        store,
        tokens: Arc::clone(&tokens),
        session_ttl: config.session_ttl,
    });

    App::new()
        .use_global(RequestId::new())
        .use_global(AccessLog::new(config.log_sink.clone()))
        .use_global(cors)
        .try_route("POST", CREATE_USER, with_state(Arc::clone(&state), create_user))?
        .try_route("POST", LOGIN, with_state(Arc::clone(&state), login))?
        .try_route("GET", CHECK_COOKIE, check_cookie)?
        .use_with_prefix(PRIVATE_PREFIX, AuthGate::new(tokens))
        .try_route("*", FIND_BY_ID, with_state(state, find_by_id))
}

fn with_state<F, Fut>(state: Arc<ApiState>, f: F) -> impl Handler
where
    F: Fn(Arc<ApiState>, Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    move |req: Request, ctx: Context| f(Arc::clone(&state), req, ctx)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct Lookup {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CookieStatus {
    cookie_present: bool,
}

// POST /api/v1/users/create → 201 with the stored user
async fn create_user(state: Arc<ApiState>, req: Request, _ctx: Context) -> Result<Response, ApiError> {
    let Credentials { email, password } = req.json()?;
    let user = state.store.create(User { email, password, ..User::default() })?;

    tracing::info!(user_id = %user.id, "user created");
    Ok(Response::builder().status(StatusCode::CREATED).json_value(&user))
}

// POST /api/v1/users/login → 200, token as a JSON string, session cookie set
async fn login(state: Arc<ApiState>, req: Request, _ctx: Context) -> Result<Response, ApiError> {
    let creds: Credentials = req.json()?;

    let user = match state.store.find_by_email(&creds.email) {
        Ok(user) if state.store.compare_password(&user, &creds.password) => user,
        Ok(_) | Err(StoreError::NotFound | StoreError::Invalid(_)) => {
            return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }
        Err(e) => return Err(e.into()),
    };

    let issued = state
        .tokens
        .issue(&user.id, Utc::now(), state.session_ttl)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let cookie = SessionCookie::new(issued.token.clone(), issued.expires_at)
        .to_header_value()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Response::builder()
        .header(SET_COOKIE, cookie)
        .json_value(&issued.token))
}

// GET /api/v1/auth/checkCookie → presence only, the token is not checked
async fn check_cookie(req: Request, _ctx: Context) -> Json<CookieStatus> {
    let cookie_present = req.cookie(SESSION_COOKIE).is_some();
    if !cookie_present {
        tracing::debug!("no session cookie on request");
    }
    Json(CookieStatus { cookie_present })
}

// * /api/v1/users/private/findById → 200 with the user
async fn find_by_id(state: Arc<ApiState>, req: Request, ctx: Context) -> Result<Response, ApiError> {
    let Lookup { id } = req.json()?;
    let user = state.store.find_by_id(&id)?;

    tracing::debug!(requested_by = ctx.user_id().unwrap_or("-"), user_id = %user.id, "user looked up");
    Ok(Response::builder().json_value(&user))
}
