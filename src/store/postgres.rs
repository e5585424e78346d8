use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ContactStore, OrderStore, ProductStore, UserStore};
use crate::error::AppError;
use crate::models::{
    normalize_email, ContactMessage, NewOrder, NewProduct, NewUser, Order, OrderItem, OrderStatus,
    Product, ProductQuery, User,
};

/// All persistent collections backed by one PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))
    }

    /// Inserts `products` when the catalogue table is empty. Returns how many were added.
    pub async fn seed_products(&self, products: Vec<NewProduct>) -> Result<usize, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(0);
        }
        let seeded = products.len();
        for product in products {
            ProductStore::create(self, product).await?;
        }
        Ok(seeded)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, input: NewUser) -> Result<User, AppError> {
        let user = User::new(input);
        // Unique violations on email surface as BadRequest via From<sqlx::Error>.
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, AppError> {
        let search = query.search.as_ref().map(|s| format!("%{}%", s));
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, category, price_cents, image_url, created_at \
             FROM products \
             WHERE ($1::text IS NULL OR lower(category) = lower($1)) \
               AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2) \
             ORDER BY name",
        )
        .bind(query.category.as_deref())
        .bind(search)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, category, price_cents, image_url, created_at \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create(&self, input: NewProduct) -> Result<Product, AppError> {
        let product = Product::new(input);
        sqlx::query(
            "INSERT INTO products (id, name, description, category, price_cents, image_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(&product.image_url)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(product)
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    items: Json<Vec<OrderItem>>,
    total_cents: i64,
    status: String,
    shipping_address: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            AppError::DatabaseError(format!("Unknown order status {:?}", row.status))
        })?;
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            total_cents: row.total_cents,
            status,
            shipping_address: row.shipping_address,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, input: NewOrder) -> Result<Order, AppError> {
        let order = Order::new(input);
        sqlx::query(
            "INSERT INTO orders (id, user_id, items, total_cents, status, shipping_address, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.total_cents)
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(order)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, items, total_cents, status, shipping_address, created_at \
             FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn save(&self, message: ContactMessage) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, message, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
