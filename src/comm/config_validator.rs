use config::FileFormat;
use serde::{Deserialize, Serialize};

use crate::comm::config::{ConfigSource, ENV_PREFIX};
use crate::error::{AppError, AppResult};
use crate::store::postgres::build_postgres_url;

/// 所有可识别的配置键 / Every recognised configuration key
pub const KNOWN_KEYS: &[&str] = &[
    "server.host",
    "server.port",
    "server.workers",
    "server.debug",
    "storage.backend",
    "database.url",
    "database.host",
    "database.port",
    "database.user",
    "database.pass",
    "database.name",
    "database.max_connections",
    "logging.level",
    "logging.json_format",
    "jwt.secret",
    "jwt.expiration",
    "notes.default_limit",
    "notes.max_limit",
];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const STORAGE_BACKENDS: &[&str] = &["postgres", "memory"];
const MIN_SECRET_BYTES: usize = 16;

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfiguration {
    pub server_host: String,
    pub server_port: u16,
    pub server_workers: Option<usize>,
    pub server_debug: bool,
    pub storage_backend: String,
    pub database_url: Option<String>,
    pub database_host: Option<String>,
    pub database_port: Option<u16>,
    pub database_user: Option<String>,
    pub database_pass: Option<String>,
    pub database_name: Option<String>,
    pub database_max_connections: u32,
    pub logging_level: String,
    pub logging_json_format: bool,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiration: i64,
    pub notes_default_limit: i64,
    pub notes_max_limit: i64,
}

impl Default for AppConfiguration {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            server_workers: Some(4),
            server_debug: false,
            storage_backend: "memory".to_string(),
            database_url: None,
            database_host: None,
            database_port: None,
            database_user: None,
            database_pass: None,
            database_name: None,
            database_max_connections: 10,
            logging_level: "info".to_string(),
            logging_json_format: false,
            jwt_secret: None,
            jwt_expiration: 3600,
            notes_default_limit: 3,
            notes_max_limit: 100,
        }
    }
}

impl AppConfiguration {
    /// 数据库连接串：优先 `database.url`，否则由各部分拼接
    /// Connection URL: `database.url` if set, otherwise assembled from parts
    pub fn database_connection_url(&self) -> Option<String> {
        if let Some(url) = self.database_url.as_ref().filter(|u| !u.is_empty()) {
            return Some(url.clone());
        }
        let host = self.database_host.as_ref()?;
        Some(build_postgres_url(
            host,
            &self.database_port.unwrap_or(5432).to_string(),
            self.database_user.as_deref().unwrap_or("postgres"),
            self.database_pass.as_deref().unwrap_or(""),
            self.database_name.as_deref().unwrap_or("notes"),
        ))
    }

    pub fn uses_postgres(&self) -> bool {
        self.storage_backend == "postgres"
    }

    /// 调试模式下至少输出 debug 日志 / Debug mode logs at debug or finer
    pub fn log_level(&self, force_debug: bool) -> &str {
        if (self.server_debug || force_debug) && self.logging_level != "trace" {
            "debug"
        } else {
            &self.logging_level
        }
    }
}

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// 验证整个配置
    pub fn validate_config(&self, config: &AppConfiguration) -> AppResult<()> {
        if config.server_host.is_empty() {
            return Err(AppError::validation("server.host", "服务器主机不能为空"));
        }

        if config.server_port < 1024 {
            return Err(AppError::validation("server.port", "端口必须在1024-65535范围内"));
        }

        if let Some(workers) = config.server_workers {
            if workers == 0 || workers > 32 {
                return Err(AppError::validation("server.workers", "工作线程数必须在1-32范围内"));
            }
        }

        if !STORAGE_BACKENDS.contains(&config.storage_backend.as_str()) {
            return Err(AppError::validation(
                "storage.backend",
                format!("存储后端必须是以下之一: {}", STORAGE_BACKENDS.join(", ")),
            ));
        }

        if config.database_max_connections == 0 || config.database_max_connections > 100 {
            return Err(AppError::validation(
                "database.max_connections",
                "数据库连接池大小必须在1-100范围内",
            ));
        }

        if config.uses_postgres() && config.database_connection_url().is_none() {
            return Err(AppError::validation(
                "database.url",
                "使用 postgres 后端时必须配置 database.url 或 database.host",
            ));
        }

        if !LOG_LEVELS.contains(&config.logging_level.as_str()) {
            return Err(AppError::validation(
                "logging.level",
                format!("日志级别必须是以下之一: {}", LOG_LEVELS.join(", ")),
            ));
        }

        match config.jwt_secret.as_deref() {
            None | Some("") => return Err(AppError::validation("jwt.secret", "签名密钥不能为空")),
            Some(s) if s.len() < MIN_SECRET_BYTES => {
                return Err(AppError::validation(
                    "jwt.secret",
                    format!("签名密钥至少 {} 字节", MIN_SECRET_BYTES),
                ))
            }
            Some(_) => {}
        }

        if config.jwt_expiration < 60 || config.jwt_expiration > 604_800 {
            return Err(AppError::validation("jwt.expiration", "令牌有效期必须在60-604800秒范围内"));
        }

        if config.notes_max_limit < 1 {
            return Err(AppError::validation("notes.max_limit", "分页上限必须大于0"));
        }
        if config.notes_default_limit < 1 || config.notes_default_limit > config.notes_max_limit {
            return Err(AppError::validation(
                "notes.default_limit",
                "默认分页大小必须在1与 notes.max_limit 之间",
            ));
        }

        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// 环境特定配置加载器
pub struct EnvironmentConfigLoader {
    environment: String,
}

impl EnvironmentConfigLoader {
    /// 从 `NOTES_ENV` 读取当前环境，默认 development
    pub fn new() -> Self {
        let environment = std::env::var(format!("{}_ENV", ENV_PREFIX))
            .ok()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "development".to_string());
        Self::with_environment(environment)
    }

    pub fn with_environment<T: Into<String>>(environment: T) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    /// 获取当前环境
    pub fn get_environment(&self) -> &str {
        &self.environment
    }

    /// 获取环境特定的配置文件路径（优先级从低到高）
    pub fn get_config_paths(&self) -> Vec<String> {
        vec![
            "config/default.toml".to_string(),
            format!("config/{}.toml", self.environment),
            "config/local.toml".to_string(),
        ]
    }

    /// 配置文件加环境变量 / Config files followed by environment variables
    pub fn default_sources(&self) -> Vec<ConfigSource> {
        let mut sources: Vec<ConfigSource> = self
            .get_config_paths()
            .into_iter()
            .map(|path| ConfigSource::File {
                path,
                format: Some(FileFormat::Toml),
                required: false,
            })
            .collect();
        sources.push(ConfigSource::env(ENV_PREFIX));
        sources
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for EnvironmentConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfiguration {
        AppConfiguration {
            jwt_secret: Some("0123456789abcdef".to_string()),
            ..AppConfiguration::default()
        }
    }

    fn rejected_field(config: &AppConfiguration) -> String {
        match ConfigValidator::new().validate_config(config) {
            Err(AppError::Validation(fields)) => fields[0].field.clone(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(ConfigValidator::new().validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_debug_raises_log_level() {
        let mut config = valid();
        config.logging_level = "warn".to_string();
        assert_eq!(config.log_level(false), "warn");
        assert_eq!(config.log_level(true), "debug");

        config.server_debug = true;
        assert_eq!(config.log_level(false), "debug");

        config.logging_level = "trace".to_string();
        assert_eq!(config.log_level(true), "trace");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = valid();
        config.server_port = 80;
        assert_eq!(rejected_field(&config), "server.port");
    }

    #[test]
    fn test_secret_rules() {
        let mut config = valid();
        config.jwt_secret = None;
        assert_eq!(rejected_field(&config), "jwt.secret");
        config.jwt_secret = Some("short".to_string());
        assert_eq!(rejected_field(&config), "jwt.secret");
    }

    #[test]
    fn test_expiration_bounds() {
        let mut config = valid();
        config.jwt_expiration = 59;
        assert_eq!(rejected_field(&config), "jwt.expiration");
        config.jwt_expiration = 604_801;
        assert_eq!(rejected_field(&config), "jwt.expiration");
    }

    #[test]
    fn test_postgres_requires_database() {
        let mut config = valid();
        config.storage_backend = "postgres".to_string();
        assert_eq!(rejected_field(&config), "database.url");

        config.database_host = Some("db".to_string());
        config.database_pass = Some("p@ss".to_string());
        assert!(ConfigValidator::new().validate_config(&config).is_ok());
        let url = config.database_connection_url().unwrap();
        assert_eq!(url, "postgres://postgres:p%40ss@db:5432/notes");
    }

    #[test]
    fn test_unknown_backend_and_level() {
        let mut config = valid();
        config.storage_backend = "sqlite".to_string();
        assert_eq!(rejected_field(&config), "storage.backend");

        let mut config = valid();
        config.logging_level = "verbose".to_string();
        assert_eq!(rejected_field(&config), "logging.level");
    }

    #[test]
    fn test_paging_bounds() {
        let mut config = valid();
        config.notes_default_limit = 200;
        assert_eq!(rejected_field(&config), "notes.default_limit");
    }

    #[test]
    fn test_environment_loader() {
        let loader = EnvironmentConfigLoader::with_environment("production");
        let paths = loader.get_config_paths();
        assert_eq!(paths[1], "config/production.toml");
        assert!(loader.is_production());
        assert_eq!(loader.default_sources().len(), 4);
    }
}
