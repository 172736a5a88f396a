// 用户注册与登录 / Registration and login
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::validate_trimmed;
use super::AppState;
use crate::error::{ApiResponse, AppResult, ErrorBody};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 64, message = "must be 1-64 characters"),
        custom(function = "validate_trimmed")
    )]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 6, max = 128, message = "must be 6-128 characters"))]
    #[schema(example = "secret1")]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, max = 64, message = "must be 1-64 characters"),
        custom(function = "validate_trimmed")
    )]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, message = "is required"))]
    #[schema(example = "secret1")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPayload {
    pub token: String,
}

/// 注册并返回令牌 / Register a user and return a token
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<TokenPayload>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Username already exists", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    // 参数校验 / Validate request params
    body.validate()?;
    let req = body.into_inner();

    let user_id = state.credentials.create_user(&req.username, &req.password).await?;
    let token = state.tokens.issue(user_id, &req.username)?;
    info!(op = "register", user_id, username = %req.username, "user registered");

    Ok(HttpResponse::Created().json(ApiResponse::ok(TokenPayload { token })))
}

/// 登录并返回令牌 / Log in and return a token
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenPayload>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Invalid username or password", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let req = body.into_inner();

    let user = state.credentials.authenticate(&req.username, &req.password).await?;
    let token = state.tokens.issue(user.id, &user.username)?;
    info!(op = "login", user_id = user.id, "user logged in");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(TokenPayload { token })))
}
