//! # forum
//!
//! Request dispatch for the forum backend: a route table, an ordered
//! middleware pipeline, and stateless cookie-token sessions.
//!
//! ## Pipeline
//!
//! ```text
//! request ─► route lookup ──(none)──► 404
//!                 │
//!                 ▼
//!    request-id ► access-log ► cors ► [prefix middleware…] ► handler
//! ```
//!
//! - Routes match on exact path, with `"*"` as an any-method fallback.
//! - Global middleware wraps every route in registration order; prefix
//!   middleware wraps only routes whose path starts with the prefix.
//! - Each request gets a fresh [`Context`] carrying its request id and, once
//!   the [`AuthGate`](middleware::AuthGate) has accepted a session, the user id.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use forum::{App, Context, Request, Response, Server};
//! use forum::middleware::RequestId;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = App::new()
//!         .use_global(RequestId::new())
//!         .route("GET", "/hello", hello);
//!
//!     Server::bind("127.0.0.1:3000".parse().unwrap()).serve(app).await.unwrap();
//! }
//!
//! async fn hello(_req: Request, ctx: Context) -> Response {
//!     Response::text(format!("hello, request {}", ctx.request_id().unwrap_or("-")))
//! }
//! ```

mod context;
mod dispatch;
mod error;
mod handler;
mod request;
mod response;
mod server;

pub mod api;
pub mod config;
pub mod middleware;
pub mod router;
pub mod session;
pub mod store;
pub mod token;

pub use config::Config;
pub use context::Context;
pub use dispatch::App;
pub use error::{ApiError, Error};
pub use handler::{BoxFuture, Handler};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use server::Server;
