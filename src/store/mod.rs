//! 持久化层 / Persistence layer
//!
//! 处理器只依赖这里的两个 Trait，具体后端可以是 PostgreSQL 或内存实现。
//! Handlers depend only on the two traits below; the backend is either
//! PostgreSQL or the in-process memory store.
//!
//! 所有权校验在此层完成：`get`/`update`/`delete` 在笔记存在但属于他人时
//! 返回 `Forbidden`，不存在时返回 `NoteNotFound`。
//! Ownership is enforced here: `get`/`update`/`delete` return `Forbidden` when
//! the note exists but belongs to someone else and `NoteNotFound` when it does
//! not exist at all.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ListParams, Note, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("user not found")]
    UserNotFound,
    /// 笔记所属用户已不存在，例如令牌签发后数据库被重置
    #[error("note owner does not exist")]
    UnknownOwner,
    #[error("note not found")]
    NoteNotFound,
    #[error("note belongs to another user")]
    Forbidden,
    #[error("数据库错误 / database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("存储内部错误 / storage error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 用户记录存储 / User record storage
///
/// 用户名唯一性由存储约束保证，插入冲突返回 `UsernameTaken`，
/// 不做先查后插。
/// Username uniqueness is enforced by the store's constraint; a conflicting
/// insert yields `UsernameTaken`. There is no check-then-insert.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 插入用户，返回新 id / Insert a user and return its id
    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<i64>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<User>;
}

/// 笔记存储 / Note storage
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, owner_id: i64, title: &str, content: &str) -> StoreResult<Note>;

    async fn get(&self, owner_id: i64, note_id: i64) -> StoreResult<Note>;

    /// 只返回调用者自己的笔记，结果为空时返回空列表
    /// Only the caller's notes; an empty page is `Ok(vec![])`
    async fn list(&self, owner_id: i64, params: ListParams) -> StoreResult<Vec<Note>>;

    /// 所有权校验与修改在同一原子操作内完成
    /// The ownership check and the mutation happen atomically
    async fn update(
        &self,
        note_id: i64,
        acting_user_id: i64,
        title: &str,
        content: &str,
    ) -> StoreResult<()>;

    async fn delete(&self, note_id: i64, acting_user_id: i64) -> StoreResult<()>;
}

/// 健康检查 / Health probe for a storage backend
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check_health(&self) -> StoreResult<()>;
}

/// 同一后端的三种视图 / The three views onto one backend
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub notes: Arc<dyn NoteStore>,
    pub health: Arc<dyn HealthCheck>,
    pub backend: &'static str,
}

impl Storage {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            notes: store.clone(),
            health: store,
            backend: "memory",
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            notes: store.clone(),
            health: store,
            backend: "postgres",
        }
    }
}
