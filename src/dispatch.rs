//! Dispatcher.
//!
//! [`App`] owns the route table and the middleware stack. Both are filled in
//! during startup and only read afterwards, so one `App` behind an `Arc`
//! serves any number of concurrent requests without locking. Per-request
//! state lives in a [`Context`] created inside [`App::dispatch`].

use std::sync::{Arc, LazyLock};

use http::{Method, StatusCode};

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, Next, Stack};
use crate::request::Request;
use crate::response::Response;
use crate::router::{MethodFilter, RouteTable};

/// Endpoint for `OPTIONS` on a path bound only under other methods. CORS
/// normally answers first; without it the request still gets a plain 200.
static PREFLIGHT: LazyLock<BoxedHandler> = LazyLock::new(|| {
    (|_req: Request, _ctx: Context| async { StatusCode::OK }).into_boxed_handler()
});

/// Routes plus middleware: the whole request pipeline.
#[derive(Default)]
pub struct App {
    routes: RouteTable,
    stack: Stack,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` (`"*"` for any) and `path`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid method or a duplicate `(method, path)` pair.
    /// Use [`App::try_route`] to handle those as errors.
    pub fn route(self, method: &str, path: &str, handler: impl Handler) -> Self {
        self.try_route(method, path, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_route(mut self, method: &str, path: &str, handler: impl Handler) -> Result<Self, Error> {
        self.routes.insert(MethodFilter::parse(method)?, path, handler)?;
        Ok(self)
    }

    /// Registers `handler` for one concrete method.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(method.as_str(), path, handler)
    }

    /// Registers `handler` for every method on `path`.
    pub fn any(self, path: &str, handler: impl Handler) -> Self {
        self.route("*", path, handler)
    }

    /// Appends a middleware that wraps every route.
    pub fn use_global(mut self, middleware: impl Middleware) -> Self {
        self.stack.use_global(middleware);
        self
    }

    /// Appends a middleware that wraps routes whose path starts with `prefix`.
    pub fn use_with_prefix(mut self, prefix: &str, middleware: impl Middleware) -> Self {
        self.stack.use_with_prefix(prefix, middleware);
        self
    }

    pub fn routes(&self) -> &RouteTable { &self.routes }
    pub fn stack(&self) -> &Stack { &self.stack }

    /// Resolves the route, builds its chain and runs it.
    ///
    /// Unknown routes get a bare `404` without entering any middleware.
    pub async fn dispatch(&self, request: Request) -> Response {
        let (path, endpoint) = match self.routes.resolve(request.method(), request.path()) {
            Some(route) => (route.path(), route.handler()),
            None if *request.method() == Method::OPTIONS && self.routes.has_path(request.path()) => {
                (request.path(), &*PREFLIGHT)
            }
            None => return Response::status(StatusCode::NOT_FOUND),
        };

        let stages = self.stack.chain_for(path);
        let mut ctx = Context::new();
        Next::new(&stages, endpoint).run(&mut ctx, request).await
    }

    pub(crate) fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
