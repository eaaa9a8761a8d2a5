/// User resource operations behind the HTTP handlers
use crate::db::UserRepository;
use crate::error::{AuthError, Result};
use crate::models::{
    CreateUserRequest, NewUser, UpdateUserRequest, UserChanges, UserResponse, DEFAULT_ROLE,
};
use crate::security::hash_password;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: i64) -> Result<UserResponse> {
        self.repo
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<UserResponse> {
        self.repo
            .find_by_email(email)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>> {
        Ok(self
            .repo
            .list()
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect())
    }

    pub async fn create(&self, req: CreateUserRequest) -> Result<UserResponse> {
        req.validate()?;

        let roles = match req.roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => vec![DEFAULT_ROLE.to_string()],
        };
        let user = self
            .repo
            .insert(NewUser {
                name: req.name.trim().to_string(),
                email: req.email,
                password_hash: hash_password(&req.password)?,
                phone: req.phone,
                address: req.address,
                roles,
            })
            .await?;

        info!(user_id = user.id, "User created");
        Ok(user.into())
    }

    pub async fn update(&self, id: i64, req: UpdateUserRequest) -> Result<UserResponse> {
        req.validate()?;
        if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AuthError::Validation("Name must not be blank".to_string()));
        }

        let password_hash = req.password.as_deref().map(hash_password).transpose()?;
        let user = self
            .repo
            .update(
                id,
                UserChanges {
                    name: req.name.map(|n| n.trim().to_string()),
                    email: req.email,
                    password_hash,
                    phone: req.phone,
                    address: req.address,
                    roles: req.roles,
                },
            )
            .await?;

        info!(user_id = id, "User updated");
        Ok(user.into())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.repo.delete(id).await?;
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserRepository;

    fn create_req(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: "Ana".into(),
            email: email.into(),
            password: "pw".into(),
            phone: Some("555".into()),
            address: None,
            roles: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_role() {
        let svc = UserService::new(Arc::new(InMemoryUserRepository::new()));
        let user = svc.create(create_req("a@x.com")).await.unwrap();
        assert_eq!(user.roles, vec![DEFAULT_ROLE.to_string()]);
        assert_eq!(user.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let svc = UserService::new(Arc::new(InMemoryUserRepository::new()));
        let user = svc.create(create_req("a@x.com")).await.unwrap();

        let updated = svc
            .update(
                user.id,
                UpdateUserRequest {
                    name: Some("Ana Maria".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.email, "a@x.com");

        let blank = svc
            .update(
                user.id,
                UpdateUserRequest {
                    name: Some("  ".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(blank, Err(AuthError::Validation(_))));

        svc.delete(user.id).await.unwrap();
        assert!(matches!(svc.get(user.id).await, Err(AuthError::UserNotFound)));
    }
}
