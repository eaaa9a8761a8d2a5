use super::user::RemoteUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub category: Option<String>,
    /// Id of the user in the user service who created the product
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.price.is_finite() && self.price >= 0.0 && self.stock >= 0
    }

    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(custom(function = "non_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be zero or more"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i32,
    pub category: Option<String>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub category: Option<String>,
    pub created_by: i64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_user: Option<RemoteUser>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            available: p.is_available(),
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            category: p.category,
            created_by: p.created_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
            created_by_user: None,
        }
    }
}

impl ProductResponse {
    pub fn with_creator(mut self, user: RemoteUser) -> Self {
        self.created_by_user = Some(user);
        self
    }
}

/// A creator, live or degraded, next to the products they created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorProducts {
    pub user: RemoteUser,
    pub products: Vec<ProductResponse>,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }
    Ok(())
}
