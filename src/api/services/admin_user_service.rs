use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::errors::AppError;
use crate::storage::{UserRepository, UserSummary};

/// GET /api/admin/users
pub async fn list_users(
    storage: web::Data<Arc<dyn UserRepository>>,
) -> Result<HttpResponse, AppError> {
    let users: Vec<UserSummary> = storage
        .list()
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}
