//! Middleware layer.
//!
//! A middleware is an object with a single `process(ctx, request, next)`
//! capability. It may inspect or rewrite the request, record values in the
//! [`Context`], call `next.run(..)` to continue, rewrite the response on the
//! way back, or return a response of its own without calling `next` at all.
//!
//! Bindings come in two scopes:
//!
//! - [`Scope::Global`] applies to every resolved route.
//! - [`Scope::Prefix`] applies when the route path starts with the prefix.
//!   The comparison is a plain, case-sensitive string prefix: `/private`
//!   covers `/privateX` as well as `/private/x`.
//!
//! For a given route the chain is: global bindings in registration order
//! (outermost first), then matching prefix bindings in registration order,
//! then the route handler.

use std::sync::Arc;

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::Response;

pub mod access_log;
pub mod auth;
pub mod cors;
pub mod request_id;

pub use access_log::AccessLog;
pub use auth::AuthGate;
pub use cors::Cors;
pub use request_id::{REQUEST_ID_HEADER, RequestId};

/// A request/response transformer.
///
/// Implementations must call `next.run` at most once. Not calling it
/// short-circuits the chain.
pub trait Middleware: Send + Sync + 'static {
    /// Stable name for logs and debugging.
    fn name(&self) -> &'static str;

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The rest of the chain after the current middleware.
///
/// Consumed by [`Next::run`], so it can only be invoked once.
pub struct Next<'a> {
    stages: &'a [&'a dyn Middleware],
    endpoint: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [&'a dyn Middleware], endpoint: &'a BoxedHandler) -> Self {
        Self { stages, endpoint }
    }

    /// Invokes the next middleware, or the handler once none are left.
    pub async fn run(self, ctx: &mut Context, request: Request) -> Response {
        match self.stages.split_first() {
            Some((head, rest)) => {
                let next = Next { stages: rest, endpoint: self.endpoint };
                head.process(ctx, request, next).await
            }
            None => self.endpoint.call(request, ctx.clone()).await,
        }
    }
}

/// Where a binding applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Global,
    Prefix(String),
}

impl Scope {
    pub fn applies_to(&self, path: &str) -> bool {
        match self {
            Self::Global => true,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

struct Binding {
    scope: Scope,
    middleware: Arc<dyn Middleware>,
}

/// Ordered middleware bindings. Populated at startup, read-only afterwards.
#[derive(Default)]
pub struct Stack {
    bindings: Vec<Binding>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_global(&mut self, middleware: impl Middleware) {
        self.push(Scope::Global, Arc::new(middleware));
    }

    pub fn use_with_prefix(&mut self, prefix: impl Into<String>, middleware: impl Middleware) {
        self.push(Scope::Prefix(prefix.into()), Arc::new(middleware));
    }

    pub fn push(&mut self, scope: Scope, middleware: Arc<dyn Middleware>) {
        self.bindings.push(Binding { scope, middleware });
    }

    /// Effective chain for a route path, outermost first.
    pub fn chain_for(&self, path: &str) -> Vec<&dyn Middleware> {
        let global = self
            .bindings
            .iter()
            .filter(|b| b.scope == Scope::Global);
        let scoped = self
            .bindings
            .iter()
            .filter(|b| b.scope != Scope::Global && b.scope.applies_to(path));

        global.chain(scoped).map(|b| b.middleware.as_ref()).collect()
    }

    /// Names of the chain for `path`, outermost first.
    pub fn names_for(&self, path: &str) -> Vec<&'static str> {
        self.chain_for(path).iter().map(|m| m.name()).collect()
    }
}
