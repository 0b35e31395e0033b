//! Per-request context.
//!
//! A [`Context`] is created fresh by the dispatcher for every request and
//! handed down the middleware chain by `&mut`. Middleware fills it in on the
//! way in; the handler receives its own copy once the chain is exhausted.
//! It is never shared between requests.

/// Values derived while a request moves through the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    request_id: Option<String>,
    user_id: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correlation id assigned by the request-id middleware.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn set_request_id(&mut self, id: impl Into<String>) {
        self.request_id = Some(id.into());
    }

    /// Subject of a verified session token. `None` on unauthenticated routes.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn set_user_id(&mut self, id: impl Into<String>) {
        self.user_id = Some(id.into());
    }
}
