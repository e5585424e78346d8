use chrono::Duration;
use std::sync::Arc;

use crate::config::Config;
use crate::email::{EmailDispatcher, EmailSender, HttpApiSender, SmtpSender};
use crate::error::AppError;
use crate::models::product::demo_catalogue;
use crate::reset::{
    InMemoryResetCodeStore, PasswordResetService, ResetCodeRegistry, SystemClock,
};
use crate::store::memory::{
    InMemoryContactStore, InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore,
};
use crate::store::postgres::PgStore;
use crate::store::{ContactStore, OrderStore, ProductStore, UserStore};

/// The persistence backends the handlers talk to.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub contacts: Arc<dyn ContactStore>,
}

impl Stores {
    /// Volatile stores with the demo catalogue loaded.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            products: Arc::new(InMemoryProductStore::with_products(demo_catalogue())),
            orders: Arc::new(InMemoryOrderStore::new()),
            contacts: Arc::new(InMemoryContactStore::new()),
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            products: store.clone(),
            orders: store.clone(),
            contacts: store,
        }
    }
}

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub mailer: Arc<EmailDispatcher>,
    pub password_reset: Arc<PasswordResetService>,
    pub jwt_secret: String,
    pub contact_inbox: Option<String>,
}

impl AppState {
    pub fn new(
        config: &Config,
        stores: Stores,
        mailer: Arc<EmailDispatcher>,
        registry: Arc<ResetCodeRegistry>,
    ) -> Self {
        let password_reset = PasswordResetService::new(registry, stores.users.clone(), mailer.clone())
            .exposing_codes(config.exposes_reset_codes());
        Self {
            users: stores.users,
            products: stores.products,
            orders: stores.orders,
            contacts: stores.contacts,
            mailer,
            password_reset: Arc::new(password_reset),
            jwt_secret: config.jwt_secret.clone(),
            contact_inbox: config.contact_inbox.clone(),
        }
    }
}

/// In-memory registry on the system clock with the configured code lifetime.
pub fn default_registry(config: &Config) -> ResetCodeRegistry {
    ResetCodeRegistry::new(
        Arc::new(InMemoryResetCodeStore::new()),
        Arc::new(SystemClock),
        Duration::minutes(config.reset_code_ttl_minutes),
    )
}

/// Builds the provider chain: transactional API first, SMTP second, each only if configured.
pub fn email_dispatcher(config: &Config) -> Result<EmailDispatcher, AppError> {
    let mut senders: Vec<Arc<dyn EmailSender>> = Vec::new();

    if let Some(api) = &config.email_api {
        let sender = HttpApiSender::new(&api.url, &api.api_key, &config.email_from)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        senders.push(Arc::new(sender));
    }
    if let Some(smtp) = &config.smtp {
        senders.push(Arc::new(SmtpSender::new(
            &smtp.host,
            smtp.port,
            &smtp.username,
            &smtp.password,
            &config.email_from,
        )));
    }

    Ok(EmailDispatcher::new(senders))
}
