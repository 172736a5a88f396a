//! 根据配置装配令牌服务与存储
//! Builds the token service and the storage backend from configuration

use std::sync::Arc;

use tracing::info;

use crate::api::Paging;
use crate::auth::{TokenConfig, TokenService};
use crate::comm::config::ConfigError;
use crate::comm::config_validator::AppConfiguration;
use crate::error::{AppError, AppResult};
use crate::store::{PgStore, Storage};

/// 签名密钥在启动时读取一次，之后不可变
/// The signing key is read once at startup and immutable afterwards
pub fn init_token_service(config: &AppConfiguration) -> AppResult<Arc<TokenService>> {
    let secret = config
        .jwt_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Config(ConfigError::KeyNotFound {
                key: "jwt.secret".to_string(),
            })
        })?;
    let token_config = TokenConfig::new(secret, config.jwt_expiration);
    info!("令牌服务已初始化: {:?}", token_config);
    Ok(Arc::new(TokenService::new(token_config)))
}

pub fn paging(config: &AppConfiguration) -> Paging {
    Paging {
        default_limit: config.notes_default_limit,
        max_limit: config.notes_max_limit,
    }
}

/// 连接 PostgreSQL / Connect to PostgreSQL
pub async fn connect_postgres(config: &AppConfiguration) -> AppResult<PgStore> {
    let url = config.database_connection_url().ok_or_else(|| {
        AppError::Config(ConfigError::KeyNotFound {
            key: "database.url".to_string(),
        })
    })?;
    let store = PgStore::connect(&url, config.database_max_connections).await?;
    info!(
        max_connections = config.database_max_connections,
        "数据库连接池已建立"
    );
    Ok(store)
}

/// 按 `storage.backend` 选择存储；postgres 后端会先执行建表
/// Pick the backend named by `storage.backend`; postgres runs the schema
/// bootstrap first
pub async fn init_storage(config: &AppConfiguration) -> AppResult<Storage> {
    match config.storage_backend.as_str() {
        "postgres" => {
            let store = connect_postgres(config).await?;
            store.migrate().await?;
            Ok(Storage::postgres(store))
        }
        "memory" => {
            info!("使用内存存储，重启后数据丢失");
            Ok(Storage::memory())
        }
        other => Err(AppError::Config(ConfigError::Invalid {
            key: "storage.backend".to_string(),
            message: format!("未知的存储后端: {}", other),
        })),
    }
}
