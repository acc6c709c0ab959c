use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // 认证错误
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // 通用错误
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "E003",
            AppError::TokenExpired => "E004",
            AppError::InvalidToken => "E005",
            AppError::Unauthorized => "E006",
            AppError::InvalidSignature => "E007",
            AppError::NotFound => "E012",
            AppError::BadRequest(_) => "E013",
            AppError::Internal(_) => "E014",
            AppError::Config(_) => "E015",
            AppError::Forbidden(_) => "E016",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "Invalid Credentials",
            AppError::TokenExpired => "Token Expired",
            AppError::InvalidToken => "Invalid Token",
            AppError::InvalidSignature => "Invalid Signature",
            AppError::Unauthorized => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound => "Not Found",
            AppError::BadRequest(_) => "Bad Request",
            AppError::Internal(_) => "Internal Server Error",
            AppError::Config(_) => "Configuration Error",
        }
    }

    /// 诊断用标签，仅用于日志，不得返回给终端用户
    pub fn tag(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::TokenExpired => "token_expired",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidSignature => "invalid_signature",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// 是否属于"未认证"一类（调用方应统一处理）
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AppError::InvalidToken
                | AppError::InvalidSignature
                | AppError::TokenExpired
                | AppError::Unauthorized
        )
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// 格式化为彩色输出（用于日志）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::InvalidSignature
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,

            AppError::Forbidden(_) => StatusCode::FORBIDDEN,

            AppError::NotFound => StatusCode::NOT_FOUND,

            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            AppError::Internal(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Token 失败原因只写日志，对外统一为 unauthorized
        let (error_type, message) = match self {
            e if e.is_authentication_failure() => {
                tracing::debug!(reason = e.tag(), "Rejected request credential");
                ("unauthorized", "Unauthorized".to_string())
            }
            AppError::InvalidCredentials => ("invalid_credentials", self.to_string()),
            AppError::Forbidden(_) => ("forbidden", "Forbidden".to_string()),
            AppError::NotFound => ("not_found", self.to_string()),
            AppError::BadRequest(_) => ("bad_request", self.to_string()),
            _ => {
                tracing::error!("{}", self.format_simple());
                ("internal_error", "Internal server error".to_string())
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message,
        })
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}
