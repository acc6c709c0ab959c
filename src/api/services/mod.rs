pub mod admin_user_service;
pub mod auth_service;
pub mod health;

// 认证服务
pub use auth_service::{login, logout, me, register};

// 健康检查
pub use health::{health_check, liveness};

// 管理员用户管理服务
pub use admin_user_service::list_users as admin_list_users;
