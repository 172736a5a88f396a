use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Bearer 令牌认证方案 / Bearer token security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI 文档聚合
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::users::register,
        crate::api::users::login,
        crate::api::notes::create_note,
        crate::api::notes::list_notes,
        crate::api::notes::get_note,
        crate::api::notes::update_note,
        crate::api::notes::delete_note,
        crate::api::health::health,
    ),
    components(
        schemas(
            crate::model::Note,
            crate::error::FieldError,
            crate::error::ErrorBody,
            crate::api::users::RegisterRequest,
            crate::api::users::LoginRequest,
            crate::api::users::TokenPayload,
            crate::api::notes::NoteRequest,
            crate::api::notes::CreatedPayload,
            crate::api::notes::NotesPayload,
            crate::api::notes::NotePayload,
            crate::api::health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "注册与登录 / Registration and login"),
        (name = "notes", description = "笔记增删改查 / Note CRUD"),
        (name = "health", description = "健康检查 / Health check")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for p in [
            "/users/register",
            "/users/login",
            "/users/{id}/notes",
            "/users/{id}/notes/{note_id}",
            "/health",
        ] {
            assert!(paths.contains_key(p), "missing {}", p);
        }
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
