use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::middleware::extract_claims;
use crate::config::AuthConfig;
use crate::errors::AppError;
use crate::security::{Claims, JwtManager, PasswordManager};
use crate::storage::{NewUser, Role, User, UserRepository, UserSummary};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

/// POST /api/auth/register
pub async fn register(
    req: web::Json<RegisterRequest>,
    storage: web::Data<Arc<dyn UserRepository>>,
    jwt_manager: web::Data<Arc<JwtManager>>,
    config: web::Data<AuthConfig>,
) -> Result<HttpResponse, AppError> {
    let RegisterRequest {
        email,
        password,
        name,
    } = req.into_inner();

    // 1. 验证邮箱格式
    let email = email.trim().to_string();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(AppError::BadRequest("Invalid email format".into())),
    }

    // 2. 验证名称
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }

    // 3. 验证密码长度
    if password.chars().count() < config.min_password_length {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            config.min_password_length
        )));
    }

    // 4. 验证邮箱唯一性
    if storage.find_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email already exists".into()));
    }

    // 5. 加密密码（阻塞线程池）
    let password_hash = web::block(move || PasswordManager::hash_password(&password)).await?;

    // 6. 创建用户
    let user = storage
        .create(NewUser {
            email,
            name,
            role: Role::Customer,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let (session, cookie) = start_session(&user, &jwt_manager, &config)?;
    Ok(HttpResponse::Created().cookie(cookie).json(session))
}

/// POST /api/auth/login
pub async fn login(
    req: web::Json<LoginRequest>,
    storage: web::Data<Arc<dyn UserRepository>>,
    jwt_manager: web::Data<Arc<JwtManager>>,
    config: web::Data<AuthConfig>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = req.into_inner();

    // 1. 查找用户
    let Some(user) = storage.find_by_email(&email).await? else {
        // 未知账号同样执行一次派生，避免通过耗时区分账号是否存在
        web::block(move || PasswordManager::hash_password(&password)).await?;
        return Err(AppError::InvalidCredentials);
    };

    // 2. 验证密码（阻塞线程池）
    let record = user.password_hash.clone();
    let matched =
        web::block(move || PasswordManager::verify_password(&password, &record)).await?;
    if !matched {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(AppError::InvalidCredentials);
    }

    // 3. 签发 Token
    let (session, cookie) = start_session(&user, &jwt_manager, &config)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(HttpResponse::Ok().cookie(cookie).json(session))
}

/// POST /api/auth/logout
///
/// 仅清除 Cookie，Token 在过期前仍然有效。
pub async fn logout(config: web::Data<AuthConfig>) -> HttpResponse {
    let mut cookie = session_cookie(&config, String::new(), 0);
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "message": "Logged out" }))
}

/// GET /api/auth/me
pub async fn me(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req)?;
    Ok(HttpResponse::Ok().json(claims))
}

/// 为用户签发会话 Token 并生成对应 Cookie
fn start_session(
    user: &User,
    jwt_manager: &JwtManager,
    config: &AuthConfig,
) -> Result<(SessionResponse, Cookie<'static>), AppError> {
    let mut claims = Claims::new(user.id.clone(), user.role.as_str());
    claims.email = Some(user.email.clone());
    claims.name = Some(user.name.clone());

    let token = jwt_manager.issue_claims(&claims)?;
    let expires_in = jwt_manager.lifetime_secs();
    let cookie = session_cookie(config, token.clone(), expires_in);

    Ok((
        SessionResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
            user: UserSummary::from(user),
        },
        cookie,
    ))
}

fn session_cookie(config: &AuthConfig, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), value)
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs.max(0)))
        .finish()
}
