//! HTTP 接口 / HTTP surface

pub mod health;
pub mod notes;
pub mod openapi;
pub mod users;
pub mod validation;

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use tracing::debug;

use crate::auth::TokenService;
use crate::credentials::CredentialStore;
use crate::error::AppError;
use crate::middleware::JwtAuth;
use crate::model::ListParams;
use crate::store::{HealthCheck, NoteStore, Storage};

/// 列表分页配置 / Listing page-size settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_limit: ListParams::DEFAULT_LIMIT,
            max_limit: ListParams::MAX_LIMIT,
        }
    }
}

/// 处理器共享状态，启动后只读
/// Shared handler state, read-only once the server starts
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub credentials: CredentialStore,
    pub notes: Arc<dyn NoteStore>,
    pub health: Arc<dyn HealthCheck>,
    pub backend: &'static str,
    pub paging: Paging,
}

impl AppState {
    pub fn new(storage: Storage, tokens: Arc<TokenService>, paging: Paging) -> Self {
        Self {
            tokens,
            credentials: CredentialStore::new(storage.users),
            notes: storage.notes,
            health: storage.health,
            backend: storage.backend,
            paging,
        }
    }
}

fn extractor_error(
    err: impl std::fmt::Display,
    field: &str,
    message: &str,
) -> actix_web::Error {
    debug!(error = %err, field, "request extraction failed");
    AppError::validation(field, message).into()
}

/// 注册全部路由 / Register every route
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let tokens = state.tokens.clone();

    cfg.app_data(state)
        .app_data(web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
            extractor_error(err, "body", "must be a valid JSON object")
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
            extractor_error(err, "path", "ids must be integers")
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
            extractor_error(err, "query", "is malformed")
        }))
        .route("/health", web::get().to(health::health))
        .route("/api-doc/openapi.json", web::get().to(openapi::openapi_json))
        .service(
            web::scope("/users")
                .route("/register", web::post().to(users::register))
                .route("/login", web::post().to(users::login))
                .service(
                    web::scope("/{id}/notes")
                        .wrap(JwtAuth::new(tokens))
                        .route("", web::post().to(notes::create_note))
                        .route("", web::get().to(notes::list_notes))
                        .route("/{note_id}", web::get().to(notes::get_note))
                        .route("/{note_id}", web::put().to(notes::update_note))
                        .route("/{note_id}", web::delete().to(notes::delete_note)),
                ),
        );
}

/// 未匹配路由 / Fallback for unknown routes
pub async fn not_found() -> HttpResponse {
    AppError::not_found("route").error_response()
}
