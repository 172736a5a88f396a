//! 笔记接口 / Note handlers
//!
//! 路径中的 `{id}` 必须与令牌中的用户一致，否则返回 403。
//! 笔记归属由存储层校验。
//! The `{id}` path segment must match the token's user or the request is
//! rejected with 403. Note ownership itself is enforced by the store.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::validate_not_blank;
use super::{AppState, Paging};
use crate::error::{ok_envelope, ApiResponse, AppError, AppResult, ErrorBody};
use crate::middleware::AuthUser;
use crate::model::{ListParams, Note, SortDirection};

/// 新建与更新共用；缺省的 `content` 视为空串
/// Shared by create and update; an omitted `content` is empty
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct NoteRequest {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    #[schema(example = "t1")]
    pub title: String,
    #[validate(length(max = 65536, message = "must be at most 65536 characters"))]
    #[schema(example = "c1")]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedPayload {
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotesPayload {
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotePayload {
    pub note: Note,
}

/// 列表查询参数，宽松解析 / Listing query, parsed leniently
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 每页数量 / page size
    pub limit: Option<String>,
    pub offset: Option<String>,
    /// `asc` 或 `desc` / `asc` or `desc`
    pub sort: Option<String>,
}

impl ListQuery {
    /// 无法解析或越界的值回退到默认值
    /// Unparsable or out-of-range values fall back to defaults
    pub fn to_params(&self, paging: Paging) -> ListParams {
        let limit = match self.limit.as_deref().and_then(|s| s.trim().parse::<i64>().ok()) {
            Some(n) if n > 0 => n.min(paging.max_limit),
            _ => paging.default_limit,
        };
        let offset = self
            .offset
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(0)
            .max(0);
        ListParams::new(limit, offset, SortDirection::parse_lenient(self.sort.as_deref()))
    }
}

/// 路径用户必须是调用者本人 / The path user must be the caller
fn ensure_path_user(path_user_id: i64, user: &AuthUser) -> AppResult<()> {
    if path_user_id != user.user_id {
        warn!(
            path_user_id,
            user_id = user.user_id,
            "path user does not match token"
        );
        return Err(AppError::forbidden("forbidden access"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/users/{id}/notes",
    params(("id" = i64, Path, description = "Caller's user id")),
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Note created", body = ApiResponse<CreatedPayload>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Path user is not the caller", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub async fn create_note(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<NoteRequest>,
) -> AppResult<HttpResponse> {
    ensure_path_user(path.into_inner(), &user)?;
    body.validate()?;
    let req = body.into_inner();

    let note = state.notes.create(user.user_id, &req.title, &req.content).await?;
    info!(op = "create_note", user_id = user.user_id, note_id = note.id, "note created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(CreatedPayload { id: note.id })))
}

#[utoipa::path(
    get,
    path = "/users/{id}/notes",
    params(("id" = i64, Path, description = "Caller's user id"), ListQuery),
    responses(
        (status = 200, description = "A page of the caller's notes", body = ApiResponse<NotesPayload>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Path user is not the caller", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub async fn list_notes(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    ensure_path_user(path.into_inner(), &user)?;
    let params = query.to_params(state.paging);
    let notes = state.notes.list(user.user_id, params).await?;
    info!(op = "list_notes", user_id = user.user_id, count = notes.len(), "notes listed");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(NotesPayload { notes })))
}

#[utoipa::path(
    get,
    path = "/users/{id}/notes/{note_id}",
    params(
        ("id" = i64, Path, description = "Caller's user id"),
        ("note_id" = i64, Path, description = "Note id"),
    ),
    responses(
        (status = 200, description = "The note", body = ApiResponse<NotePayload>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Note belongs to another user", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub async fn get_note(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (path_user_id, note_id) = path.into_inner();
    ensure_path_user(path_user_id, &user)?;
    let note = state.notes.get(user.user_id, note_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(NotePayload { note })))
}

#[utoipa::path(
    put,
    path = "/users/{id}/notes/{note_id}",
    params(
        ("id" = i64, Path, description = "Caller's user id"),
        ("note_id" = i64, Path, description = "Note id"),
    ),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Note updated"),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Note belongs to another user", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub async fn update_note(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
    body: web::Json<NoteRequest>,
) -> AppResult<HttpResponse> {
    let (path_user_id, note_id) = path.into_inner();
    ensure_path_user(path_user_id, &user)?;
    body.validate()?;
    let req = body.into_inner();

    state
        .notes
        .update(note_id, user.user_id, &req.title, &req.content)
        .await?;
    info!(op = "update_note", user_id = user.user_id, note_id, "note updated");

    Ok(HttpResponse::Ok().json(ok_envelope()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/notes/{note_id}",
    params(
        ("id" = i64, Path, description = "Caller's user id"),
        ("note_id" = i64, Path, description = "Note id"),
    ),
    responses(
        (status = 200, description = "Note deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Note belongs to another user", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub async fn delete_note(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (path_user_id, note_id) = path.into_inner();
    ensure_path_user(path_user_id, &user)?;
    state.notes.delete(note_id, user.user_id).await?;
    info!(op = "delete_note", user_id = user.user_id, note_id, "note deleted");

    Ok(HttpResponse::Ok().json(ok_envelope()))
}
