#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shopforge::config::Config;
use shopforge::email::{EmailDispatcher, EmailError, EmailMessage, EmailSender};
use shopforge::reset::{InMemoryResetCodeStore, ManualClock, ResetCodeRegistry};
use shopforge::state::{AppState, Stores};
use shopforge::store::UserStore;

/// Builds the full app around `$state`, the way `main` does.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(actix_web::middleware::Logger::default())
                .service(shopforge::routes::health::health)
                .service(actix_web::web::scope("/api").configure(shopforge::routes::config)),
        )
        .await
    };
}

/// Records every message; optionally fails every send.
pub struct Outbox {
    name: &'static str,
    fail: bool,
    attempts: AtomicUsize,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl Outbox {
    pub fn working(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail: false,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn broken(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail: true,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for Outbox {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmailError::Transport("provider unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub clock: Arc<ManualClock>,
    pub reset_codes: Arc<InMemoryResetCodeStore>,
    pub registry: Arc<ResetCodeRegistry>,
}

pub struct TestSetup {
    env: Vec<(&'static str, &'static str)>,
    senders: Vec<Arc<dyn EmailSender>>,
    fixed_codes: Option<Vec<&'static str>>,
    users: Option<Arc<dyn UserStore>>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            env: vec![("JWT_SECRET", "integration-test-secret")],
            senders: Vec::new(),
            fixed_codes: None,
            users: None,
        }
    }

    pub fn env(mut self, key: &'static str, value: &'static str) -> Self {
        self.env.push((key, value));
        self
    }

    pub fn sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.senders.push(sender);
        self
    }

    /// Replaces the in-memory credential store.
    pub fn users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    /// Reset codes are handed out from `codes` in order.
    pub fn codes(mut self, codes: Vec<&'static str>) -> Self {
        self.fixed_codes = Some(codes);
        self
    }

    pub fn build(self) -> TestContext {
        let env = self.env;
        let config = Config::from_lookup(|key| {
            env.iter()
                .rev()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .expect("test configuration");

        let clock = Arc::new(ManualClock::default());
        let reset_codes = Arc::new(InMemoryResetCodeStore::new());
        let mut registry = ResetCodeRegistry::new(
            reset_codes.clone(),
            clock.clone(),
            chrono::Duration::minutes(config.reset_code_ttl_minutes),
        );
        if let Some(codes) = self.fixed_codes {
            let queue = Mutex::new(codes.into_iter().map(String::from).collect::<Vec<_>>());
            registry = registry.with_code_generator(move || {
                let mut queue = queue.lock().unwrap();
                assert!(!queue.is_empty(), "test ran out of fixed reset codes");
                queue.remove(0)
            });
        }

        let registry = Arc::new(registry);
        let mut stores = Stores::in_memory();
        if let Some(users) = self.users {
            stores.users = users;
        }
        let state = AppState::new(
            &config,
            stores,
            Arc::new(EmailDispatcher::new(self.senders)),
            registry.clone(),
        );

        TestContext {
            state: web::Data::new(state),
            clock,
            reset_codes,
            registry,
        }
    }
}

/// Sends `req` and returns the status and JSON body (or `Value::Null` for non-JSON bodies).
///
/// Errors raised by middleware are rendered the way the HTTP server would render them.
pub async fn call_json<S, B>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}

pub async fn post_json<S, B>(app: &S, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .set_json(&body)
        .to_request();
    call_json(app, req).await
}

/// Registers a customer and returns `(user_id, token)`.
pub async fn register<S, B>(app: &S, name: &str, email: &str, password: &str) -> (String, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        json!({ "name": name, "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    (
        body["user_id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}
