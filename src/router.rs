//! Route table.
//!
//! One radix tree per method key, exact-string paths, plus a `*` key that
//! matches any method. Built once at startup, read-only afterwards, so
//! resolution needs no locking.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::{InsertError, Router as MatchitRouter};

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};

/// Method slot a route is registered under.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MethodFilter {
    /// `*`: matches every method.
    Any,
    Exact(Method),
}

impl MethodFilter {
    /// Parses `"*"` or a method token such as `"POST"`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s == "*" {
            return Ok(Self::Any);
        }
        Method::from_bytes(s.as_bytes())
            .map(Self::Exact)
            .map_err(|_| Error::InvalidMethod(s.to_owned()))
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Any => "*",
            Self::Exact(m) => m.as_str(),
        }
    }
}

/// A registered `(method, path) → handler` binding.
pub struct Route {
    method: MethodFilter,
    path: Arc<str>,
    handler: BoxedHandler,
}

impl Route {
    pub fn method(&self) -> &MethodFilter { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub(crate) fn handler(&self) -> &BoxedHandler { &self.handler }
}

#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<MethodFilter, MatchitRouter<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `(method, path)`.
    ///
    /// Fails if the exact pair is already bound. Paths are matched as plain
    /// strings: `{` and `}` carry no parameter meaning here.
    pub fn insert(
        &mut self,
        method: MethodFilter,
        path: &str,
        handler: impl Handler,
    ) -> Result<(), Error> {
        let route = Route {
            method: method.clone(),
            path: Arc::from(path),
            handler: handler.into_boxed_handler(),
        };
        let label = method.as_str().to_owned();

        self.routes
            .entry(method)
            .or_default()
            .insert(escape(path), route)
            .map_err(|e| match e {
                InsertError::Conflict { .. } => Error::DuplicateRoute {
                    method: label,
                    path: path.to_owned(),
                },
                other => Error::InvalidRoute {
                    method: label,
                    path: path.to_owned(),
                    reason: other.to_string(),
                },
            })
    }

    /// Exact `(method, path)` first, then `("*", path)`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&Route> {
        self.lookup(&MethodFilter::Exact(method.clone()), path)
            .or_else(|| self.lookup(&MethodFilter::Any, path))
    }

    /// Whether `path` is bound under any method at all.
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.values().any(|tree| tree.at(path).is_ok())
    }

    fn lookup(&self, method: &MethodFilter, path: &str) -> Option<&Route> {
        let tree = self.routes.get(method)?;
        tree.at(path).ok().map(|m| m.value)
    }
}

/// Escapes matchit's parameter syntax so the pattern matches literally.
fn escape(path: &str) -> String {
    path.replace('{', "{{").replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::request::Request;
    use crate::response::Response;
    use bytes::Bytes;

    fn tagged(tag: &'static str) -> impl Handler {
        move |_req: Request, _ctx: Context| async move { Response::text(tag) }
    }

    async fn call(route: &Route) -> String {
        let req = Request::from_http(http::Request::new(Bytes::new()), None);
        let res = route.handler().call(req, Context::new()).await;
        String::from_utf8(res.body().to_vec()).unwrap()
    }

    fn table() -> RouteTable {
        let mut t = RouteTable::new();
        t.insert(MethodFilter::parse("GET").unwrap(), "/users", tagged("get")).unwrap();
        t.insert(MethodFilter::parse("POST").unwrap(), "/users", tagged("post")).unwrap();
        t.insert(MethodFilter::Any, "/users", tagged("any")).unwrap();
        t.insert(MethodFilter::Any, "/only-any", tagged("only-any")).unwrap();
        t
    }

    #[tokio::test]
    async fn exact_method_wins_over_wildcard() {
        let t = table();
        assert_eq!(call(t.resolve(&Method::GET, "/users").unwrap()).await, "get");
        assert_eq!(call(t.resolve(&Method::POST, "/users").unwrap()).await, "post");
    }

    #[tokio::test]
    async fn wildcard_catches_other_methods() {
        let t = table();
        assert_eq!(call(t.resolve(&Method::DELETE, "/users").unwrap()).await, "any");
        assert_eq!(call(t.resolve(&Method::GET, "/only-any").unwrap()).await, "only-any");
    }

    #[test]
    fn unknown_path_is_not_found() {
        let t = table();
        assert!(t.resolve(&Method::GET, "/nope").is_none());
        assert!(t.resolve(&Method::GET, "/users/").is_none());
        assert!(t.resolve(&Method::GET, "/user").is_none());
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let mut t = table();
        let err = t.insert(MethodFilter::parse("GET").unwrap(), "/users", tagged("again"));
        assert!(matches!(err, Err(Error::DuplicateRoute { .. })));

        let err = t.insert(MethodFilter::Any, "/users", tagged("again"));
        assert!(matches!(err, Err(Error::DuplicateRoute { .. })));
    }

    #[tokio::test]
    async fn braces_match_literally() {
        let mut t = RouteTable::new();
        t.insert(MethodFilter::Any, "/users/{id}", tagged("literal")).unwrap();
        assert!(t.resolve(&Method::GET, "/users/42").is_none());
        assert_eq!(call(t.resolve(&Method::GET, "/users/{id}").unwrap()).await, "literal");
    }

    #[test]
    fn has_path_ignores_method() {
        let t = table();
        assert!(t.has_path("/users"));
        assert!(!t.has_path("/nope"));
    }

    #[test]
    fn method_parsing() {
        assert_eq!(MethodFilter::parse("*").unwrap(), MethodFilter::Any);
        assert_eq!(MethodFilter::parse("PUT").unwrap(), MethodFilter::Exact(Method::PUT));
        assert!(matches!(MethodFilter::parse("BAD METHOD"), Err(Error::InvalidMethod(_))));
    }
}
