use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{StatusCode, header::LOCATION};
use serde_json::json;

use sitegate_api::{
    app::{AppDeps, build_app_with},
    config::ApiConfig,
    limiter::{RateLimitDecision, RateLimiter},
    mailer::{EmailMessage, EmailReceipt, MailError, Mailer},
};
use sitegate_auth::{PermissionModel, Role, SessionClaims};
use sitegate_core::{FORBIDDEN_MESSAGE, UserId};

const SECRET: &str = "test-secret";

/// Allows the first `limit` hits, then limits; remembers every key.
#[derive(Default)]
struct CountingLimiter {
    limit: usize,
    hits: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

#[async_trait]
impl RateLimiter for CountingLimiter {
    async fn hit(&self, key: &str) -> anyhow::Result<RateLimitDecision> {
        self.keys.lock().unwrap().push(key.to_string());
        let seen = self.hits.fetch_add(1, Ordering::SeqCst);
        if seen < self.limit {
            Ok(RateLimitDecision::Allowed)
        } else {
            Ok(RateLimitDecision::Limited { retry_after_secs: 60 })
        }
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<EmailReceipt, MailError> {
        self.sent.lock().unwrap().push(message);
        Ok(EmailReceipt { id: uuid::Uuid::now_v7() })
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    limiter: Arc<CountingLimiter>,
    mailer: Arc<RecordingMailer>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_limit(usize::MAX).await
    }

    async fn spawn_with_limit(limit: usize) -> Self {
        let limiter = Arc::new(CountingLimiter { limit, ..Default::default() });
        let mailer = Arc::new(RecordingMailer::default());

        let mut config = ApiConfig::new(SECRET);
        config.contact_inbox = "team@example.com".to_string();
        let deps = AppDeps {
            model: Arc::new(PermissionModel::standard()),
            mailer: mailer.clone(),
            limiter: limiter.clone(),
        };

        // Same router as prod, bound to an ephemeral port.
        let app = build_app_with(&config, deps);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self { base_url, client, limiter, mailer, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint(role: Role) -> (UserId, String) {
    mint_with(role, SECRET, ChronoDuration::minutes(10))
}

fn mint_with(role: Role, secret: &str, ttl: ChronoDuration) -> (UserId, String) {
    let now = Utc::now();
    let sub = UserId::new();
    let claims = SessionClaims {
        sub,
        role,
        email: Some(format!("{role}@example.com")),
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + ttl,
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt");
    (sub, token)
}

async fn json_body(res: reqwest::Response) -> serde_json::Value {
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn privileged_routes_require_a_session() {
    let srv = TestServer::spawn().await;

    for path in ["/whoami", "/users", "/contact", "/admin/authz/explain?permission=x"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body = json_body(res).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn invalid_or_expired_tokens_are_no_session() {
    let srv = TestServer::spawn().await;

    let (_, wrong_key) = mint_with(Role::Admin, "other-secret", ChronoDuration::minutes(10));
    let (_, expired) = mint_with(Role::Admin, SECRET, ChronoDuration::minutes(-5));

    for token in [wrong_key, expired, "garbage".to_string()] {
        let res = srv
            .client
            .get(srv.url("/whoami"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn whoami_reflects_the_token_and_cookie_works() {
    let srv = TestServer::spawn().await;
    let (sub, token) = mint(Role::User);

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("cookie", format!("theme=dark; session={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["value"]["user_id"], sub.to_string());
    assert_eq!(body["value"]["role"], "user");
    let permissions = body["value"]["permissions"].as_array().unwrap();
    assert!(permissions.iter().any(|p| p == "content.read"));
    assert!(!permissions.iter().any(|p| p == "users.manage"));
}

#[tokio::test]
async fn denials_are_uniform_and_precede_validation() {
    let srv = TestServer::spawn().await;
    let (_, token) = mint(Role::User);

    let attempts = [
        srv.client.post(srv.url("/content")).json(&json!({ "title": "", "body": "" })),
        srv.client.post(srv.url("/content/not-a-uuid/publish")),
        srv.client.post(srv.url("/media")).body("{ not json"),
        srv.client.delete(srv.url(&format!("/media/{}", uuid::Uuid::now_v7()))),
        srv.client.get(srv.url("/users")),
        srv.client.put(srv.url("/users/whatever/role")).json(&json!({ "role": "admin" })),
        srv.client.post(srv.url("/email")).json(&json!({})),
        srv.client.get(srv.url("/contact")),
        srv.client.get(srv.url("/admin/authz/explain?permission=users.manage")),
    ];

    for req in attempts {
        let res = req.bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body = json_body(res).await;
        assert_eq!(body["code"], "FORBIDDEN");
        assert_eq!(body["message"], FORBIDDEN_MESSAGE);
        assert!(body.get("fieldErrors").is_none());
    }
}

#[tokio::test]
async fn content_lifecycle_hides_drafts_from_the_public() {
    let srv = TestServer::spawn().await;
    let (_, admin) = mint(Role::Admin);

    let res = srv
        .client
        .post(srv.url("/content"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Hello", "body": "First post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = json_body(res).await["value"]["id"].as_str().unwrap().to_string();

    let res = srv.client.get(srv.url(&format!("/content/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let listed = json_body(srv.client.get(srv.url("/content")).send().await.unwrap()).await;
    assert_eq!(listed["value"].as_array().unwrap().len(), 0);

    let publish = srv.url(&format!("/content/{id}/publish"));
    let res = srv.client.post(&publish).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["value"]["published"], true);

    let res = srv.client.post(&publish).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv.client.get(srv.url(&format!("/content/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["value"]["title"], "Hello");
}

#[tokio::test]
async fn validation_failures_carry_field_errors() {
    let srv = TestServer::spawn().await;
    let (_, admin) = mint(Role::Admin);

    let res = srv
        .client
        .post(srv.url("/media"))
        .bearer_auth(&admin)
        .json(&json!({
            "file_name": "a/b.exe",
            "content_type": "application/x-sh",
            "size_bytes": 0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(res).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Validation failed");
    for field in ["file_name", "content_type", "size_bytes"] {
        assert!(body["fieldErrors"][field].is_array(), "{field}");
    }
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let (_, admin) = mint(Role::Admin);

    let res = srv
        .client
        .post(srv.url("/content"))
        .bearer_auth(&admin)
        .header("content-type", "application/json")
        .body("{ \"title\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn user_management_flow() {
    let srv = TestServer::spawn().await;
    let (admin_id, admin) = mint(Role::Admin);

    let create = |email: &str| {
        srv.client
            .post(srv.url("/users"))
            .bearer_auth(&admin)
            .json(&json!({ "email": email, "display_name": "Ada", "role": "user" }))
    };

    let res = create("ada@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let ada = json_body(res).await["value"]["id"].as_str().unwrap().to_string();

    let res = create("ADA@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(json_body(res).await["fieldErrors"]["email"].is_array());

    let res = srv
        .client
        .put(srv.url(&format!("/users/{ada}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["value"]["role"], "admin");

    let res = srv
        .client
        .put(srv.url(&format!("/users/{admin_id}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let listed = json_body(
        srv.client.get(srv.url("/users")).bearer_auth(&admin).send().await.unwrap(),
    )
    .await;
    assert_eq!(listed["value"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn contact_submissions_are_scoped_rate_limited_and_forwarded() {
    let srv = TestServer::spawn_with_limit(1).await;
    let submission =
        json!({ "name": "Grace", "email": "Grace@Example.com", "message": "Hi there" });

    let res = srv
        .client
        .post(srv.url("/contact"))
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .header("user-agent", "test-agent")
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv
        .client
        .post(srv.url("/contact"))
        .header("x-forwarded-for", "203.0.113.7")
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(res).await["code"], "RATE_LIMITED");

    let keys = srv.limiter.keys.lock().unwrap().clone();
    assert!(keys[0].starts_with("sitegate:contact:203.0.113.7:"));
    assert!(keys[0].ends_with(":grace@example.com"));
    assert!(!keys[0].contains("::"));

    let sent = srv.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "team@example.com");
    assert_eq!(sent[0].reply_to.as_deref(), Some("Grace@Example.com"));

    let (_, admin) = mint(Role::Admin);
    let inbox = json_body(
        srv.client.get(srv.url("/contact")).bearer_auth(&admin).send().await.unwrap(),
    )
    .await;
    assert_eq!(inbox["value"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_contact_is_422_after_the_limiter() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/contact"))
        .json(&json!({ "name": "", "email": "nope", "message": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(res).await;
    assert!(body["fieldErrors"]["email"].is_array());

    assert_eq!(srv.limiter.hits.load(Ordering::SeqCst), 1);
    assert!(srv.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn redirect_rejects_external_and_unreachable_targets() {
    let srv = TestServer::spawn().await;
    let (_, user) = mint(Role::User);
    let (_, admin) = mint(Role::Admin);

    let cases = [
        (&user, "https://evil.example/phish", "/account"),
        (&user, "//evil.example", "/account"),
        (&user, "/admin/users", "/account"),
        (&user, "/account/settings", "/account/settings"),
        (&admin, "/admin/users", "/admin/users"),
    ];
    for (token, to, expected) in cases {
        let res = srv
            .client
            .get(srv.url("/auth/redirect"))
            .query(&[("to", to)])
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{to}");
        assert_eq!(res.headers()[LOCATION], expected, "{to}");
    }

    let res = srv.client.get(srv.url("/auth/redirect")).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.headers()[LOCATION], "/admin");

    let res = srv.client.get(srv.url("/auth/redirect")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admins_can_send_email_and_explain_decisions() {
    let srv = TestServer::spawn().await;
    let (_, admin) = mint(Role::Admin);

    let res = srv
        .client
        .post(srv.url("/email"))
        .bearer_auth(&admin)
        .json(&json!({ "to": "reader@example.com", "subject": "News", "body": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let sent = srv.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent[0].reply_to.as_deref(), Some("admin@example.com"));

    let res = srv
        .client
        .get(srv.url("/admin/authz/explain?permission=users.manage&role=user"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["value"]["granted"], false);
    assert_eq!(body["value"]["role"], "user");
    assert_eq!(body["value"]["granting_roles"], json!(["admin"]));
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["code"], "NOT_FOUND");
}
