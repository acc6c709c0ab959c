use async_trait::async_trait;

use super::models::{NewUser, User};
use crate::errors::AppError;

/// 用户仓储
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，邮箱已存在时返回 `BadRequest`
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    /// 邮箱比较不区分大小写
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
}
