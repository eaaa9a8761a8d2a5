/// User store operations
use crate::error::{AuthError, Result};
use crate::models::{NewUser, User, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicI64, Ordering};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    /// Fails with `EmailAlreadyExists` when the address is taken
    async fn insert(&self, user: NewUser) -> Result<User>;
    async fn update(&self, id: i64, changes: UserChanges) -> Result<User>;
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Process-local store keyed by id, with a case-insensitive email index
#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: DashMap<i64, User>,
    by_email: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            by_email: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.by_email.get(&email_key(email)).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    // Lock order is always `users` then `by_email`
    async fn insert(&self, new: NewUser) -> Result<User> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let Entry::Vacant(record) = self.users.entry(id) else {
            return Err(AuthError::Internal(format!("user id {id} reused")));
        };
        match self.by_email.entry(email_key(&new.email)) {
            Entry::Occupied(_) => Err(AuthError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id,
                    name: new.name,
                    email: new.email.trim().to_string(),
                    password_hash: new.password_hash,
                    phone: new.phone,
                    address: new.address,
                    roles: new.roles,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(id);
                record.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User> {
        // Held for the whole update so a concurrent delete waits for it
        let mut user = self.users.get_mut(&id).ok_or(AuthError::UserNotFound)?;

        if let Some(email) = changes.email {
            let old_key = email_key(&user.email);
            let new_key = email_key(&email);
            if new_key != old_key {
                // Entry guard must be released before touching another key
                match self.by_email.entry(new_key) {
                    Entry::Occupied(_) => return Err(AuthError::EmailAlreadyExists),
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
                self.by_email.remove(&old_key);
            }
            user.email = email.trim().to_string();
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if changes.phone.is_some() {
            user.phone = changes.phone;
        }
        if changes.address.is_some() {
            user.address = changes.address;
        }
        if let Some(roles) = changes.roles {
            user.roles = roles;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let (_, user) = self.users.remove(&id).ok_or(AuthError::UserNotFound)?;
        self.by_email.remove(&email_key(&user.email));
        Ok(())
    }
}
