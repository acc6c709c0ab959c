use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{NewUser, User};
use super::repository::UserRepository;
use crate::errors::AppError;

/// 进程内用户存储
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let email = normalize_email(&user.email);
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(AppError::BadRequest("Email already exists".into()));
        }

        let created = User {
            id: Uuid::new_v4().to_string(),
            email,
            name: user.name.trim().to_string(),
            role: user.role,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(created.id.clone(), created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(users)
    }
}
