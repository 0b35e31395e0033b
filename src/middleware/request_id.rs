//! Request ID middleware.
//!
//! Generates a fresh UUID for every request, stores it in the [`Context`]
//! and echoes it back as `X-Request-ID` so clients can correlate their
//! calls with server logs. Incoming `X-Request-ID` headers are ignored.

use http::HeaderValue;
use http::header::HeaderName;
use uuid::Uuid;

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone, Debug, Default)]
pub struct RequestId;

impl RequestId {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestId {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            ctx.set_request_id(id.clone());

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(&id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}
