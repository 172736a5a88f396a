// 用户模型 / User model
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 持久化的用户记录 / Persisted user record
///
/// `password_hash` 为 PHC 格式字符串，绝不序列化到响应中
/// `password_hash` is a PHC string and is never serialized into responses
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
