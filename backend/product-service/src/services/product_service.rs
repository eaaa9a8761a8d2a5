use crate::clients::{CallContext, UserClient};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::{CreatorProducts, ProductRequest, ProductResponse};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    users: Arc<UserClient>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>, users: Arc<UserClient>) -> Self {
        Self { repo, users }
    }

    pub fn users(&self) -> &UserClient {
        &self.users
    }

    pub async fn list(&self) -> Result<Vec<ProductResponse>> {
        Ok(self.repo.list().await?.into_iter().map(Into::into).collect())
    }

    pub async fn list_available(&self) -> Result<Vec<ProductResponse>> {
        Ok(self
            .repo
            .list_available()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Products created by `user_id`, with the creator looked up first
    ///
    /// An unknown or unreachable creator still lists the products, next to a
    /// degraded user.
    pub async fn list_by_creator(&self, user_id: i64, ctx: &CallContext) -> Result<CreatorProducts> {
        let user = self.users.fetch_user(user_id, ctx).await;
        let products = self
            .repo
            .list_by_creator(user_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(CreatorProducts { user, products })
    }

    /// Product plus its creator; the creator may come back degraded
    pub async fn get_with_creator(&self, id: i64, ctx: &CallContext) -> Result<ProductResponse> {
        let product = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;

        let creator = self.users.fetch_user(product.created_by, ctx).await;
        Ok(ProductResponse::from(product).with_creator(creator))
    }

    pub async fn create(&self, req: ProductRequest) -> Result<ProductResponse> {
        req.validate()?;
        let product = self.repo.insert(req).await?;
        info!(product_id = product.id, "Product created");
        Ok(product.into())
    }

    pub async fn update(&self, id: i64, req: ProductRequest) -> Result<ProductResponse> {
        req.validate()?;
        let product = self.repo.update(id, req).await?;
        info!(product_id = id, "Product updated");
        Ok(product.into())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.repo.delete(id).await?;
        info!(product_id = id, "Product deleted");
        Ok(())
    }
}
