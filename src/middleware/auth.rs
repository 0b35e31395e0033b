//! Authentication gate.
//!
//! Reads the session cookie, verifies the token it carries and records the
//! token subject as the user id in the [`Context`]. Anything short of a
//! valid, unexpired token ends the request with `401` and the error
//! envelope. No state is kept between requests.

use std::sync::Arc;

use chrono::Utc;

use crate::context::Context;
use crate::error::ApiError;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::session::SESSION_COOKIE;
use crate::token::TokenCodec;

#[derive(Clone, Debug)]
pub struct AuthGate {
    tokens: Arc<TokenCodec>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenCodec>) -> Self {
        Self { tokens }
    }

    fn authenticate(&self, request: &Request) -> Result<String, ApiError> {
        let token = request
            .cookie(SESSION_COOKIE)
            .ok_or_else(|| ApiError::Unauthenticated("session cookie not present".into()))?;

        self.tokens
            .verify(token, Utc::now())
            .map(|claims| claims.sub)
            .map_err(|e| ApiError::Unauthenticated(e.to_string()))
    }
}

impl Middleware for AuthGate {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.authenticate(&request) {
                Ok(user_id) => {
                    ctx.set_user_id(user_id);
                    next.run(ctx, request).await
                }
                Err(e) => {
                    tracing::debug!(path = request.path(), "rejected: {e}");
                    e.into_response()
                }
            }
        })
    }
}
