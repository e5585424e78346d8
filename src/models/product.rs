use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A catalogue entry. Prices are held in integer cents.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
}

/// Query parameters accepted by the product listing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive match against name and description.
    pub search: Option<String>,
    /// Exact (case-insensitive) category match.
    pub category: Option<String>,
}

impl Product {
    pub fn new(input: NewProduct) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            category: input.category,
            price_cents: input.price_cents,
            image_url: input.image_url,
            created_at: Utc::now(),
        }
    }

    pub fn matches(&self, query: &ProductQuery) -> bool {
        if let Some(category) = &query.category {
            if !self.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        match &query.search {
            Some(term) => {
                let term = term.to_lowercase();
                self.name.to_lowercase().contains(&term)
                    || self
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&term))
                        .unwrap_or(false)
            }
            None => true,
        }
    }
}

/// Starter catalogue used when the server runs without a database.
pub fn demo_catalogue() -> Vec<NewProduct> {
    vec![
        NewProduct {
            name: "Canvas Tote".to_string(),
            description: Some("Heavy cotton tote bag with inside pocket".to_string()),
            category: "bags".to_string(),
            price_cents: 1_800,
            image_url: None,
        },
        NewProduct {
            name: "Enamel Mug".to_string(),
            description: Some("Camp-style enamel mug, 350ml".to_string()),
            category: "kitchen".to_string(),
            price_cents: 1_250,
            image_url: None,
        },
        NewProduct {
            name: "Wool Beanie".to_string(),
            description: Some("Ribbed merino beanie".to_string()),
            category: "apparel".to_string(),
            price_cents: 2_400,
            image_url: None,
        },
    ]
}
