/// Product store operations
use crate::error::{AppError, Result};
use crate::models::{Product, ProductRequest};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>>;
    async fn list(&self) -> Result<Vec<Product>>;
    async fn list_available(&self) -> Result<Vec<Product>>;
    async fn list_by_creator(&self, user_id: i64) -> Result<Vec<Product>>;
    async fn insert(&self, req: ProductRequest) -> Result<Product>;
    async fn update(&self, id: i64, req: ProductRequest) -> Result<Product>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[derive(Debug)]
pub struct InMemoryProductRepository {
    products: DashMap<i64, Product>,
    next_id: AtomicI64,
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self {
            products: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| keep(p.value()))
            .map(|p| p.value().clone())
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }
}

fn invalid() -> AppError {
    AppError::InvalidInput("Product needs a name, a price >= 0 and stock >= 0".to_string())
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.products.get(&id).map(|p| p.clone()))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.collect(|_| true))
    }

    async fn list_available(&self) -> Result<Vec<Product>> {
        Ok(self.collect(Product::is_available))
    }

    async fn list_by_creator(&self, user_id: i64) -> Result<Vec<Product>> {
        Ok(self.collect(|p| p.created_by == user_id))
    }

    async fn insert(&self, req: ProductRequest) -> Result<Product> {
        let now = Utc::now();
        let product = Product {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: req.name.trim().to_string(),
            description: req.description,
            price: req.price,
            stock: req.stock,
            category: req.category,
            created_by: req.created_by,
            created_at: now,
            updated_at: now,
        };
        if !product.is_valid() {
            return Err(invalid());
        }
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: i64, req: ProductRequest) -> Result<Product> {
        let mut entry = self
            .products
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;

        let updated = Product {
            name: req.name.trim().to_string(),
            description: req.description,
            price: req.price,
            stock: req.stock,
            category: req.category,
            created_by: req.created_by,
            updated_at: Utc::now(),
            ..entry.value().clone()
        };
        if !updated.is_valid() {
            return Err(invalid());
        }
        *entry.value_mut() = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
    }
}
