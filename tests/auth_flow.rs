//! End-to-end behaviour of the HTTP surface, driven through `App::dispatch`.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{TimeDelta, Utc};
use forum::api::{self, CHECK_COOKIE, CREATE_USER, FIND_BY_ID, LOGIN};
use forum::middleware::REQUEST_ID_HEADER;
use forum::store::{MemoryStore, User, UserStore};
use forum::token::TokenCodec;
use forum::{App, Config, Request, Response};
use http::{Method, StatusCode, header};
use serde_json::{Value, json};

const SECRET: &str = "integration-secret";

struct Harness {
    app: App,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_secret(Some(SECRET))
    }

    fn with_secret(secret: Option<&'static str>) -> Self {
        let config = Config::from_lookup(|k| match k {
            "JWT_SECRET" => secret.map(str::to_owned),
            _ => None,
        })
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        let app = api::app(&config, store.clone()).unwrap();
        Self { app, store }
    }

    fn seed(&self, email: &str, password: &str) -> User {
        self.store
            .create(User { email: email.into(), password: password.into(), ..User::default() })
            .unwrap()
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>, cookie: Option<&str>) -> Response {
        let mut builder = http::Request::builder().method(method).uri(path);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        let body = body.map_or_else(Bytes::new, |b| Bytes::from(b.to_string()));
        let req = Request::from_http(builder.body(body).unwrap(), Some("127.0.0.1:40000".parse().unwrap()));
        self.app.dispatch(req).await
    }

    async fn login(&self, email: &str, password: &str) -> Response {
        self.send(Method::POST, LOGIN, Some(json!({ "email": email, "password": password })), None)
            .await
    }
}

fn json_body(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

/// `name=value` part of the first `Set-Cookie` header.
fn session_pair(res: &Response) -> String {
    let header = res.headers()[header::SET_COOKIE].to_str().unwrap();
    header.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn login_sets_secure_session_cookie() {
    let h = Harness::new();
    let user = h.seed("ada@example.com", "lovelace");

    let res = h.login("ada@example.com", "lovelace").await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Expires="));

    // The body carries the same token, and it names the user.
    let token = json_body(&res).as_str().unwrap().to_owned();
    assert_eq!(session_pair(&res), format!("session={token}"));
    let claims = TokenCodec::new(SECRET.as_bytes()).verify(&token, Utc::now()).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.exp - claims.iat, 5 * 60 * 60);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let h = Harness::new();
    h.seed("ada@example.com", "lovelace");

    let res = h.login("ada@example.com", "babbage").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&res), json!({ "error": "invalid login credentials" }));
    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_for_unknown_user_is_unauthorized() {
    let h = Harness::new();
    let res = h.login("nobody@example.com", "").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&res), json!({ "error": "invalid login credentials" }));
}

#[tokio::test]
async fn login_with_garbage_body_is_bad_request() {
    let h = Harness::new();
    let res = h.send(Method::POST, LOGIN, Some(json!("not an object")), None).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(json_body(&res)["error"].is_string());
}

#[tokio::test]
async fn login_without_secret_is_internal_error() {
    let h = Harness::with_secret(None);
    h.seed("ada@example.com", "lovelace");

    let res = h.login("ada@example.com", "lovelace").await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(&res)["error"].is_string());
}

#[tokio::test]
async fn private_route_requires_session() {
    let h = Harness::new();
    let user = h.seed("ada@example.com", "lovelace");
    let lookup = json!({ "id": user.id });

    let res = h.send(Method::GET, FIND_BY_ID, Some(lookup.clone()), None).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert!(json_body(&res)["error"].is_string());

    let login = h.login("ada@example.com", "lovelace").await;
    let cookie = session_pair(&login);

    let res = h.send(Method::GET, FIND_BY_ID, Some(lookup.clone()), Some(cookie.as_str())).await;
    assert!(res.status_code().is_success());
    assert_eq!(json_body(&res), json!({ "id": user.id, "email": "ada@example.com" }));

    // Wildcard route: any method works once authenticated.
    let res = h.send(Method::POST, FIND_BY_ID, Some(lookup), Some(cookie.as_str())).await;
    assert!(res.status_code().is_success());
}

#[tokio::test]
async fn private_route_rejects_expired_session() {
    let h = Harness::new();
    let user = h.seed("ada@example.com", "lovelace");

    let expired = TokenCodec::new(SECRET.as_bytes())
        .issue(&user.id, Utc::now() - TimeDelta::hours(6), TimeDelta::hours(5))
        .unwrap();
    let cookie = format!("session={}", expired.token);

    let res = h.send(Method::GET, FIND_BY_ID, Some(json!({ "id": user.id })), Some(cookie.as_str())).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&res), json!({ "error": "token has expired" }));
}

#[tokio::test]
async fn private_route_rejects_tampered_session() {
    let h = Harness::new();
    let user = h.seed("ada@example.com", "lovelace");

    let forged = TokenCodec::new(b"not-the-secret")
        .issue(&user.id, Utc::now(), TimeDelta::hours(5))
        .unwrap();
    let cookie = format!("session={}", forged.token);

    let res = h.send(Method::GET, FIND_BY_ID, Some(json!({ "id": user.id })), Some(cookie.as_str())).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn private_lookup_of_unknown_id_is_not_found() {
    let h = Harness::new();
    h.seed("ada@example.com", "lovelace");
    let cookie = session_pair(&h.login("ada@example.com", "lovelace").await);

    let res = h.send(Method::GET, FIND_BY_ID, Some(json!({ "id": "missing" })), Some(cookie.as_str())).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(&res), json!({ "error": "record not found" }));
}

#[tokio::test]
async fn check_cookie_reports_presence_only() {
    let h = Harness::new();

    let res = h.send(Method::GET, CHECK_COOKIE, None, None).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_body(&res), json!({ "cookiePresent": false }));

    let res = h.send(Method::GET, CHECK_COOKIE, None, Some("session=not-even-a-token")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_body(&res), json!({ "cookiePresent": true }));

    let res = h.send(Method::GET, CHECK_COOKIE, None, Some("other=1")).await;
    assert_eq!(json_body(&res), json!({ "cookiePresent": false }));
}

#[tokio::test]
async fn create_user_then_log_in() {
    let h = Harness::new();

    let res = h
        .send(Method::POST, CREATE_USER, Some(json!({ "email": "grace@example.com", "password": "hopper1" })), None)
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body = json_body(&res);
    assert_eq!(body["email"], "grace@example.com");
    assert!(body.get("password").is_none());

    let res = h.login("grace@example.com", "hopper1").await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn create_user_validation_failure_is_unprocessable() {
    let h = Harness::new();
    let res = h
        .send(Method::POST, CREATE_USER, Some(json!({ "email": "no-at-sign", "password": "hopper1" })), None)
        .await;
    assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(&res)["error"].is_string());
}

#[tokio::test]
async fn every_routed_response_has_request_id_and_cors() {
    let h = Harness::new();

    for res in [
        h.send(Method::GET, CHECK_COOKIE, None, None).await,
        h.login("nobody@example.com", "x").await,
        h.send(Method::GET, FIND_BY_ID, None, None).await,
    ] {
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}

#[tokio::test]
async fn preflight_never_reaches_handlers() {
    let h = Harness::new();

    for path in [LOGIN, CREATE_USER, CHECK_COOKIE, FIND_BY_ID] {
        let res = h.send(Method::OPTIONS, path, None, None).await;
        assert_eq!(res.status_code(), StatusCode::OK, "{path}");
        assert!(res.body().is_empty(), "{path}");
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, GET, OPTIONS, PUT, DELETE"
        );
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Access-Control-Allow-Headers, Authorization, X-Requested-With"
        );
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let h = Harness::new();

    let res = h.send(Method::GET, "/api/v1/nothing", None, None).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    // Registered path, wrong method, no wildcard binding.
    let res = h.send(Method::GET, LOGIN, None, None).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}
