/// Login and registration: authenticate, then mint
use crate::db::UserRepository;
use crate::error::Result;
use crate::models::{LoginRequest, LoginResponse, NewUser, RegisterRequest, User, DEFAULT_ROLE};
use crate::security::password::{hash_password, reject_unknown_user, verify_password};
use crypto_core::TokenCodec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    codec: Arc<TokenCodec>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, codec: Arc<TokenCodec>, token_ttl: Duration) -> Self {
        Self {
            repo,
            codec,
            token_ttl,
        }
    }

    /// Unknown email and wrong password both end in `InvalidCredentials`
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        req.validate()?;

        let Some(user) = self.repo.find_by_email(&req.email).await? else {
            warn!("Login attempt for unknown account");
            return Err(reject_unknown_user(&req.password));
        };

        if let Err(e) = verify_password(&req.password, &user.password_hash) {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(e);
        }

        info!(user_id = user.id, "User logged in");
        self.issue(&user)
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<LoginResponse> {
        req.validate()?;

        let user = self
            .repo
            .insert(NewUser {
                name: req.name.trim().to_string(),
                email: req.email,
                password_hash: hash_password(&req.password)?,
                phone: None,
                address: None,
                roles: vec![DEFAULT_ROLE.to_string()],
            })
            .await?;

        info!(user_id = user.id, "User registered");
        self.issue(&user)
    }

    fn issue(&self, user: &User) -> Result<LoginResponse> {
        let token = self.codec.mint(&user.email, &user.roles, self.token_ttl)?;
        Ok(LoginResponse::bearer(token, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserRepository;
    use crate::error::AuthError;

    fn service() -> AuthService {
        let codec = TokenCodec::new(b"k3Jp9QzX7vR2mW8tL5yN4bH6cF1dG0sA").unwrap();
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(codec),
            Duration::from_secs(3600),
        )
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ana".into(),
            email: email.into(),
            password: "right".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let svc = service();
        let registered = svc.register(register_req("a@x.com")).await.unwrap();
        assert_eq!(registered.roles, vec![DEFAULT_ROLE.to_string()]);

        let resp = svc
            .login(LoginRequest {
                email: "a@x.com".into(),
                password: "right".into(),
            })
            .await
            .unwrap();
        let claims = svc.codec.parse(&resp.token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(resp.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_alike() {
        let svc = service();
        svc.register(register_req("a@x.com")).await.unwrap();

        let wrong = svc
            .login(LoginRequest {
                email: "a@x.com".into(),
                password: "wrong".into(),
            })
            .await;
        let unknown = svc
            .login(LoginRequest {
                email: "b@x.com".into(),
                password: "right".into(),
            })
            .await;

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let svc = service();
        svc.register(register_req("a@x.com")).await.unwrap();
        assert!(matches!(
            svc.register(register_req("a@x.com")).await,
            Err(AuthError::EmailAlreadyExists)
        ));
    }
}
