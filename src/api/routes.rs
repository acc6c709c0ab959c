use actix_web::web;
use std::sync::Arc;

use crate::api::{middleware, services};
use crate::config::AuthConfig;
use crate::security::JwtManager;
use crate::storage::UserRepository;

/// 注册全部路由及共享状态
pub fn configure(
    cfg: &mut web::ServiceConfig,
    storage: Arc<dyn UserRepository>,
    jwt_manager: Arc<JwtManager>,
    auth: AuthConfig,
) {
    let cookie_name = auth.cookie_name.clone();

    cfg.app_data(web::Data::new(storage.clone()))
        .app_data(web::Data::new(jwt_manager.clone()))
        .app_data(web::Data::new(auth))
        // 健康检查端点（无需认证）
        .service(
            web::scope("/health")
                .route("", web::get().to(services::health_check))
                .route("/live", web::get().to(services::liveness)),
        )
        // 认证 API
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(services::register))
                .route("/login", web::post().to(services::login))
                .route("/logout", web::post().to(services::logout))
                .route(
                    "/me",
                    web::get()
                        .to(services::me)
                        .wrap(middleware::JwtAuth::new(jwt_manager.clone(), &cookie_name)),
                ),
        )
        // 管理员 API（需要管理员权限）
        .service(
            web::scope("/api/admin")
                .wrap(middleware::AdminOnly::new(jwt_manager, &cookie_name, storage))
                .route("/users", web::get().to(services::admin_list_users)),
        );
}
