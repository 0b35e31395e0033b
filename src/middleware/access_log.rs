//! Access log middleware.
//!
//! Emits one event when a request starts and one when its response is
//! ready. Events go to the [`Dispatch`] handed in at construction, not to
//! whatever subscriber happens to be global, so the sink is explicit and
//! tests can capture it. Preflight (`OPTIONS`) requests are not logged.

use std::time::Instant;

use http::Method;
use tracing::Dispatch;

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Debug)]
pub struct AccessLog {
    sink: Dispatch,
}

impl AccessLog {
    pub fn new(sink: Dispatch) -> Self {
        Self { sink }
    }
}

impl Middleware for AccessLog {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if *request.method() == Method::OPTIONS {
                return next.run(ctx, request).await;
            }

            let remote_addr = request
                .peer_addr()
                .map_or_else(|| "-".to_owned(), |a| a.to_string());
            let request_id = ctx.request_id().unwrap_or("-").to_owned();

            tracing::dispatcher::with_default(&self.sink, || {
                tracing::info!(
                    method = %request.method(),
                    uri = request.target(),
                    remote_addr = %remote_addr,
                    request_id = %request_id,
                    "started",
                );
            });

            let start = Instant::now();
            let response = next.run(ctx, request).await;
            let elapsed = start.elapsed();

            let status = response.status_code();
            tracing::dispatcher::with_default(&self.sink, || {
                tracing::info!(
                    elapsed = ?elapsed,
                    status = status.as_u16(),
                    status_text = status.canonical_reason().unwrap_or(""),
                    remote_addr = %remote_addr,
                    request_id = %request_id,
                    "completed",
                );
            });

            response
        })
    }
}
