use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContactStore, OrderStore, ProductStore, UserStore};
use crate::error::AppError;
use crate::models::{
    normalize_email, ContactMessage, NewOrder, NewProduct, NewUser, Order, Product, ProductQuery,
    User,
};

/// Users keyed by id. Email uniqueness is checked under the write lock.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, input: NewUser) -> Result<User, AppError> {
        let user = User::new(input);
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest("Email already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".into())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryProductStore {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `products`.
    pub fn with_products(products: Vec<NewProduct>) -> Self {
        let products = products
            .into_iter()
            .map(Product::new)
            .map(|p| (p.id, p))
            .collect();
        Self {
            products: RwLock::new(products),
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, AppError> {
        let products = self.products.read().await;
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| p.matches(query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn create(&self, input: NewProduct) -> Result<Product, AppError> {
        let product = Product::new(input);
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, input: NewOrder) -> Result<Order, AppError> {
        let order = Order::new(input);
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        let orders = self.orders.read().await;
        // Pushed in placement order, so reversing yields newest first.
        Ok(orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryContactStore {
    messages: RwLock<Vec<ContactMessage>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<ContactMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn save(&self, message: ContactMessage) -> Result<(), AppError> {
        self.messages.write().await.push(message);
        Ok(())
    }
}
