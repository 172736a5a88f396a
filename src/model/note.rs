// 笔记模型 / Note model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 笔记记录，`owner_id` 创建后不可变
/// Note record; `owner_id` never changes after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    #[sqlx(rename = "user_id")]
    #[serde(rename = "user_id")]
    pub owner_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 列表排序方向（按创建时间） / Listing order by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// `asc` 以外的任何值都视为降序 / anything other than `asc` means descending
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// 分页参数 / Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub limit: i64,
    pub offset: i64,
    pub sort: SortDirection,
}

impl ListParams {
    pub const DEFAULT_LIMIT: i64 = 3;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(limit: i64, offset: i64, sort: SortDirection) -> Self {
        Self {
            limit,
            offset,
            sort,
        }
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0, SortDirection::Desc)
    }
}
