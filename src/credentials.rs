//! 凭据存储
//! Credential store
//!
//! 在 `UserStore` 之上负责密码的加盐慢哈希（Argon2id）与校验。
//! 哈希计算放在阻塞线程池中执行。
//! Salted slow hashing (Argon2id) and verification on top of `UserStore`.
//! Hashing runs on the blocking thread pool.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;
use tracing::warn;

use crate::model::User;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("密码哈希失败 / password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 使用 Argon2id 哈希密码，返回 PHC 字符串
/// Hash a password with Argon2id, returning a PHC-format string
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// 校验密码与 PHC 哈希 / Verify a password against a PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(hash).map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// 注册用户 / Register a user
    ///
    /// 用户名冲突由存储的唯一约束检测
    /// Username conflicts are detected by the store's unique constraint
    pub async fn create_user(&self, username: &str, raw_password: &str) -> Result<i64, CredentialError> {
        let password = raw_password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))??;

        match self.users.insert_user(username, &hash).await {
            Ok(id) => Ok(id),
            Err(StoreError::UsernameTaken) => Err(CredentialError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<User, CredentialError> {
        Ok(self.users.find_user_by_username(username).await?)
    }

    /// 校验用户名与密码；用户不存在与密码错误返回同一错误
    /// Check a username/password pair; an unknown user and a wrong password
    /// produce the same error
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> Result<User, CredentialError> {
        let user = match self.users.find_user_by_username(username).await {
            Ok(user) => user,
            Err(StoreError::UserNotFound) => {
                warn!(username, "login for unknown user");
                return Err(CredentialError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let password = raw_password.to_string();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))??;
        if !ok {
            warn!(username, "login with wrong password");
            return Err(CredentialError::InvalidCredentials);
        }
        Ok(user)
    }
}
