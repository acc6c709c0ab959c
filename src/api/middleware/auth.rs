use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::errors::AppError;
use crate::security::{Claims, JwtManager};

/// JWT 认证中间件
///
/// 依次从 `Authorization: Bearer` 与认证 Cookie 中读取 Token，
/// 验证通过后把 [`Claims`] 注入请求扩展。
pub struct JwtAuth {
    jwt_manager: Arc<JwtManager>,
    cookie_name: Rc<str>,
}

impl JwtAuth {
    pub fn new(jwt_manager: Arc<JwtManager>, cookie_name: &str) -> Self {
        Self {
            jwt_manager,
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            jwt_manager: self.jwt_manager.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    jwt_manager: Arc<JwtManager>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
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
        let service = self.service.clone();

        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(e) => Ok(req.error_response(e).map_into_right_body()),
            }
        })
    }
}

/// 从请求中提取 Token：先 Bearer header，后 Cookie
pub(crate) fn extract_token(req: &ServiceRequest, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        req.cookie(cookie_name)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// 验证请求携带的 Token
///
/// Token 失败对外都是 `Unauthorized`，具体原因只进入 debug 日志。
/// 密钥配置错误等非认证错误原样返回。
pub(crate) fn authenticate(
    jwt_manager: &JwtManager,
    req: &ServiceRequest,
    cookie_name: &str,
) -> Result<Claims, AppError> {
    let token = extract_token(req, cookie_name).ok_or(AppError::Unauthorized)?;

    jwt_manager
        .verify_claims::<Claims>(&token)
        .map_err(|e| match e {
            e if e.is_authentication_failure() => {
                tracing::debug!(reason = e.tag(), path = req.path(), "Token rejected");
                AppError::Unauthorized
            }
            e => e,
        })
}

/// 从请求扩展中提取 Claims
pub fn extract_claims(req: &HttpRequest) -> Result<Claims, AppError> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or(AppError::Unauthorized)
}
