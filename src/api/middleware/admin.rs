use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use super::auth::authenticate;
use crate::errors::AppError;
use crate::security::{Claims, JwtManager};
use crate::storage::{Role, UserRepository};

/// 管理员权限中间件
/// 要求用户必须是管理员角色才能访问
pub struct AdminOnly {
    jwt_manager: Arc<JwtManager>,
    cookie_name: Rc<str>,
    storage: Arc<dyn UserRepository>,
}

impl AdminOnly {
    pub fn new(
        jwt_manager: Arc<JwtManager>,
        cookie_name: &str,
        storage: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            jwt_manager,
            cookie_name: Rc::from(cookie_name),
            storage,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminOnly
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminOnlyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminOnlyMiddleware {
            service: Rc::new(service),
            jwt_manager: self.jwt_manager.clone(),
            cookie_name: self.cookie_name.clone(),
            storage: self.storage.clone(),
        }))
    }
}

pub struct AdminOnlyMiddleware<S> {
    service: Rc<S>,
    jwt_manager: Arc<JwtManager>,
    cookie_name: Rc<str>,
    storage: Arc<dyn UserRepository>,
}

impl<S, B> Service<ServiceRequest> for AdminOnlyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = authenticate(&self.jwt_manager, &req, &self.cookie_name);
        let storage = self.storage.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let checked = match claims {
                Ok(claims) => require_admin(storage.as_ref(), claims).await,
                Err(e) => Err(e),
            };

            match checked {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(e) => Ok(req.error_response(e).map_into_right_body()),
            }
        })
    }
}

/// 从存储确认用户仍存在且为管理员，Token 中的角色可能已过时
async fn require_admin(storage: &dyn UserRepository, claims: Claims) -> Result<Claims, AppError> {
    let user = storage
        .find_by_id(&claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.role != Role::Admin {
        tracing::warn!(user_id = %user.id, "Non-admin user attempted admin access");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(claims)
}
