//! 令牌认证中间件
//! Bearer-token authentication middleware
//!
//! 校验 `Authorization: Bearer <token>`，成功时把 [`AuthUser`] 放入请求扩展，
//! 失败时直接返回 401，不会调用后续处理器。
//! Validates `Authorization: Bearer <token>`. On success an [`AuthUser`] is
//! stored in the request extensions; on failure a 401 is returned and the
//! wrapped handler never runs.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, warn};

use crate::auth::TokenService;
use crate::error::AppError;

/// 已认证用户 / The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("missing authorization header")),
        )
    }
}

/// 从请求头解析出令牌 / Pull the token out of the Authorization header
fn bearer_token(req: &ServiceRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid authorization header"))?;

    // 必须恰好是 "Bearer" + 单个空格 + 非空令牌
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::unauthorized("invalid authorization header")),
    }
}

/// 认证中间件 / Authentication middleware
pub struct JwtAuth {
    tokens: Arc<TokenService>,
}

impl JwtAuth {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = JwtAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let tokens = self.tokens.clone();

        Box::pin(async move {
            let identity = bearer_token(&req).and_then(|token| {
                tokens.verify(&token).map_err(|e| {
                    debug!(reason = %e, "token rejected");
                    AppError::unauthorized("invalid token")
                })
            });

            match identity {
                Ok(identity) => {
                    req.extensions_mut().insert(AuthUser {
                        user_id: identity.user_id,
                        username: identity.username,
                    });
                    let res = service.call(req).await?;
                    Ok(res.map_into_boxed_body())
                }
                Err(err) => {
                    warn!("认证失败: {} {} - {}", req.method(), req.path(), err);
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_boxed_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(TokenConfig::new(
            "middleware-test-secret-000",
            3600,
        )))
    }

    async fn whoami(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "id": user.user_id,
            "username": user.username,
        }))
    }

    macro_rules! app {
        ($tokens:expr) => {
            test::init_service(
                App::new().service(
                    web::scope("/private")
                        .wrap(JwtAuth::new($tokens))
                        .route("/me", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    async fn error_of(resp: ServiceResponse) -> String {
        let body: serde_json::Value = test::read_body_json(resp).await;
        body["error"].as_str().unwrap_or_default().to_string()
    }

    #[actix_web::test]
    async fn test_valid_token_passes_identity() {
        let tokens = tokens();
        let token = tokens.issue(7, "alice").unwrap();
        let app = app!(tokens);

        let req = test::TestRequest::get()
            .uri("/private/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["username"], "alice");
    }

    #[actix_web::test]
    async fn test_missing_header() {
        let app = app!(tokens());
        let req = test::TestRequest::get().uri("/private/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(resp).await, "missing authorization header");
    }

    #[actix_web::test]
    async fn test_wrong_scheme_or_shape() {
        let tokens = tokens();
        let token = tokens.issue(7, "alice").unwrap();
        let app = app!(tokens);

        for value in [
            format!("Basic {}", token),
            token.clone(),
            format!("Bearer {} extra", token),
            format!("Bearer  {}", token),
            format!("Bearer\t{}", token),
            "Bearer".to_string(),
            "Bearer ".to_string(),
        ] {
            let req = test::TestRequest::get()
                .uri("/private/me")
                .insert_header((AUTHORIZATION, value))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(error_of(resp).await, "invalid authorization header");
        }
    }

    #[actix_web::test]
    async fn test_bad_or_expired_token() {
        let tokens = tokens();
        let expired = TokenService::new(TokenConfig::new("middleware-test-secret-000", -300))
            .issue(7, "alice")
            .unwrap();
        let app = app!(tokens);

        for value in ["Bearer garbage".to_string(), format!("Bearer {}", expired)] {
            let req = test::TestRequest::get()
                .uri("/private/me")
                .insert_header((AUTHORIZATION, value))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(error_of(resp).await, "invalid token");
        }
    }
}
