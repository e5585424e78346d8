//! Persistence seams.
//!
//! Handlers and services only ever see these traits, held as `Arc<dyn ...>` in
//! [`crate::state::AppState`]. Two backends exist: [`memory`] for development and
//! tests, and [`postgres`] for deployments with a `DATABASE_URL`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ContactMessage, NewOrder, NewProduct, NewUser, Order, Product, ProductQuery, User,
};

/// Credential store. Emails passed in are normalised by the implementation.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Fails with `AppError::BadRequest` when the email is already registered.
    async fn create(&self, input: NewUser) -> Result<User, AppError>;

    /// Fails with `AppError::NotFound` when no such user exists.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching `query`, ordered by name.
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn create(&self, input: NewProduct) -> Result<Product, AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, input: NewOrder) -> Result<Order, AppError>;

    /// Orders placed by `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn save(&self, message: ContactMessage) -> Result<(), AppError>;
}
