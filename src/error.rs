use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::TokenError;
use crate::credentials::CredentialError;
use crate::store::StoreError;

/// 字段级校验错误 / Field-level validation failure
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new<T: Into<String>, U: Into<String>>(field: T, message: U) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 统一的应用错误类型
/// Unified application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] crate::comm::config::ConfigError),

    #[error("{}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("数据库错误: {message}")]
    Database { message: String },

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("field {} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// 创建单字段校验错误
    pub fn validation<T: Into<String>, U: Into<String>>(field: T, message: U) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// 创建认证错误
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// 创建权限错误
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// 是否为服务端错误（需隐藏细节）
    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::Database { .. } | AppError::Internal(_)
        )
    }

    /// 返回给客户端的消息 / Message exposed to the client
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // 记录错误日志
        if self.is_internal() {
            tracing::error!(error = %self, "request failed with internal error");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "client error");
        }

        let body = match self {
            AppError::Validation(fields) => json!({
                "status": "Error",
                "error": self.to_string(),
                "fields": fields,
            }),
            _ => json!({
                "status": "Error",
                "error": self.public_message(),
            }),
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UsernameTaken => AppError::conflict("username already exists"),
            StoreError::UserNotFound => AppError::not_found("user"),
            StoreError::UnknownOwner => AppError::unauthorized("invalid token"),
            StoreError::NoteNotFound => AppError::not_found("note"),
            StoreError::Forbidden => AppError::forbidden("forbidden access"),
            StoreError::Database(err) => AppError::database(err.to_string()),
            StoreError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::UsernameTaken => AppError::conflict("username already exists"),
            CredentialError::InvalidCredentials => {
                AppError::unauthorized("invalid username or password")
            }
            CredentialError::Hash(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            CredentialError::Store(err) => err.into(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            _ => AppError::unauthorized("invalid token"),
        }
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 成功响应 `{"status":"OK", ...payload}`
/// Success envelope `{"status":"OK", ...payload}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = "OK")]
    pub status: &'static str,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: "OK", data }
    }
}

/// 只有状态位的成功响应 / Success envelope without payload
pub fn ok_envelope() -> serde_json::Value {
    json!({ "status": "OK" })
}

/// 错误响应结构，仅用于文档 / Error envelope, documentation only
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Error")]
    pub status: String,
    pub error: String,
    pub fields: Option<Vec<FieldError>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::validation("title", "is required").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("note").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::database("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(AppError::from(StoreError::Forbidden), AppError::Forbidden { .. }));
        assert!(matches!(AppError::from(StoreError::NoteNotFound), AppError::NotFound { .. }));
        assert!(matches!(AppError::from(StoreError::UsernameTaken), AppError::Conflict { .. }));
        assert!(matches!(
            AppError::from(StoreError::UnknownOwner),
            AppError::Unauthorized { .. }
        ));
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::Unauthorized { .. }
        ));
    }

    #[actix_web::test]
    async fn test_error_envelope() {
        let (status, body) = body_json(AppError::not_found("note")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "Error");
        assert_eq!(body["error"], "note not found");
    }

    #[actix_web::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_json(AppError::database("connection refused on 10.0.0.3")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal error");
    }

    #[actix_web::test]
    async fn test_validation_lists_fields() {
        let err = AppError::Validation(vec![
            FieldError::new("username", "is required"),
            FieldError::new("password", "must be at least 6 characters"),
        ]);
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"].as_array().unwrap().len(), 2);
        assert_eq!(body["fields"][0]["field"], "username");
        assert!(body["error"].as_str().unwrap().contains("field password"));
    }

    #[test]
    fn test_ok_envelope_flattens_payload() {
        #[derive(Serialize)]
        struct Token {
            token: String,
        }
        let v = serde_json::to_value(ApiResponse::ok(Token { token: "abc".into() })).unwrap();
        assert_eq!(v, json!({"status": "OK", "token": "abc"}));
        assert_eq!(ok_envelope(), json!({"status": "OK"}));
    }
}
