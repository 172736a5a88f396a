use anyhow::{anyhow, Result};
use config::{Config, ConfigBuilder, File, FileFormat};
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::comm::config_validator::{EnvironmentConfigLoader, KNOWN_KEYS};

lazy_static! {
    static ref GLOBAL_CONFIG_MANAGER: RwLock<Option<Arc<ConfigManager>>> = RwLock::new(None);
}

/// 环境变量前缀 / Environment variable prefix
pub const ENV_PREFIX: &str = "NOTES";

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },
    #[error("配置项 '{key}' 不存在")]
    KeyNotFound { key: String },
    #[error("配置项 '{key}' 类型转换失败: {message}")]
    TypeConversionError { key: String, message: String },
    #[error("配置项 '{key}' 无效: {message}")]
    Invalid { key: String, message: String },
    #[error("配置初始化失败: {message}")]
    InitializationError { message: String },
}

/// 配置数据源信息
#[derive(Debug, Clone)]
pub struct ConfigSourceInfo {
    pub source_type: String,
    pub description: String,
    pub priority: u8,
    pub loaded: bool,
}

/// 配置源类型
pub enum ConfigSource {
    /// 文件配置源
    File {
        path: String,
        format: Option<FileFormat>,
        required: bool,
    },
    /// 环境变量配置源：`NOTES_JWT_SECRET` -> `jwt.secret`
    /// Environment source: `NOTES_JWT_SECRET` -> `jwt.secret`
    Env {
        prefix: String,
        vars: HashMap<String, String>,
    },
    /// 内存配置源（键为点分路径）
    Memory(HashMap<String, String>),
    /// 字符串配置源
    String { content: String, format: FileFormat },
}

impl ConfigSource {
    /// 读取当前进程的环境变量 / Snapshot the process environment
    pub fn env(prefix: &str) -> Self {
        ConfigSource::Env {
            prefix: prefix.to_string(),
            vars: std::env::vars().collect(),
        }
    }

    /// 获取配置源信息
    pub fn get_source_info(&self, priority: u8) -> ConfigSourceInfo {
        let (source_type, description) = match self {
            ConfigSource::File { path, required, .. } => (
                "File",
                format!("文件配置源: {} (必需: {})", path, required),
            ),
            ConfigSource::Env { prefix, .. } => {
                ("Environment", format!("环境变量配置源: 前缀={}_", prefix))
            }
            ConfigSource::Memory(map) => ("Memory", format!("内存配置源: {} 个配置项", map.len())),
            ConfigSource::String { .. } => ("String", "字符串配置源".to_string()),
        };
        ConfigSourceInfo {
            source_type: source_type.to_string(),
            description,
            priority,
            loaded: false,
        }
    }

    pub fn add_to_builder(
        self,
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ConfigBuilder<config::builder::DefaultState>> {
        match self {
            ConfigSource::File {
                path,
                format,
                required,
            } => {
                let file_source = match format {
                    Some(format) => File::with_name(&path).format(format),
                    None => File::with_name(&path),
                };
                Ok(builder.add_source(file_source.required(required)))
            }
            ConfigSource::Env { prefix, vars } => {
                let mut builder = builder;
                // 只映射已知键，键名中的下划线不会被误当作层级分隔符
                for key in KNOWN_KEYS {
                    let name = env_var_name(&prefix, key);
                    if let Some(value) = vars.get(&name).filter(|v| !v.is_empty()) {
                        builder = builder
                            .set_override(*key, value.clone())
                            .map_err(|e| anyhow!("设置环境变量 {} 失败: {}", name, e))?;
                    }
                }
                Ok(builder)
            }
            ConfigSource::Memory(map) => {
                let mut builder = builder;
                for (key, value) in map {
                    builder = builder
                        .set_override(key.as_str(), value)
                        .map_err(|e| anyhow!("设置内存配置 {} 失败: {}", key, e))?;
                }
                Ok(builder)
            }
            ConfigSource::String { content, format } => {
                Ok(builder.add_source(File::from_str(&content, format)))
            }
        }
    }
}

/// `jwt.secret` -> `NOTES_JWT_SECRET`
pub fn env_var_name(prefix: &str, key: &str) -> String {
    format!("{}_{}", prefix, key.replace('.', "_")).to_uppercase()
}

/// 配置管理器
pub struct ConfigManager {
    config: Config,
    sources_info: Vec<ConfigSourceInfo>,
}

impl ConfigManager {
    /// 按当前环境的默认配置源创建
    /// Build from the default sources of the current environment
    pub fn new() -> Result<Self> {
        let env_loader = EnvironmentConfigLoader::new();
        Self::with_sources(env_loader.default_sources())
    }

    /// 使用指定的配置源创建配置管理器，后添加者优先
    /// Build from the given sources; later sources take precedence
    pub fn with_sources(sources: Vec<ConfigSource>) -> Result<Self> {
        let mut builder = Config::builder();
        let mut sources_info = Vec::new();

        for (index, source) in sources.into_iter().enumerate() {
            let priority = (index + 1) as u8;
            let mut info = source.get_source_info(priority);

            if let ConfigSource::File { path, required, .. } = &source {
                if !std::path::Path::new(path).exists() {
                    if *required {
                        return Err(ConfigError::FileNotFound { path: path.clone() }.into());
                    }
                    sources_info.push(info);
                    continue;
                }
            }

            builder = source
                .add_to_builder(builder)
                .map_err(|e| anyhow!("添加配置源失败: {}", e))?;
            info.loaded = true;
            sources_info.push(info);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("构建配置失败: {}", e))?;
        Ok(Self {
            config,
            sources_info,
        })
    }

    /// 获取指定 key 的配置值
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.config
            .get(key)
            .map_err(|e| anyhow!("获取配置 '{}' 失败: {}", key, e))
    }

    /// 可选配置：不存在返回 `None`，存在但类型错误返回错误
    /// Optional key: `None` when absent, an error when present but mistyped
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> std::result::Result<Option<T>, ConfigError> {
        match self.get_safe(key) {
            Ok(v) => Ok(Some(v)),
            Err(ConfigError::KeyNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 安全获取配置值，返回详细错误信息
    pub fn get_safe<T: DeserializeOwned>(&self, key: &str) -> std::result::Result<T, ConfigError> {
        self.config.get(key).map_err(|e| match e {
            config::ConfigError::NotFound(_) => ConfigError::KeyNotFound {
                key: key.to_string(),
            },
            other => ConfigError::TypeConversionError {
                key: key.to_string(),
                message: other.to_string(),
            },
        })
    }

    /// 检查配置项是否存在
    pub fn exists(&self, key: &str) -> bool {
        self.config.get::<config::Value>(key).is_ok()
    }

    /// 获取配置源统计信息 (总数, 已加载, 未加载)
    pub fn get_sources_stats(&self) -> (usize, usize, usize) {
        let total = self.sources_info.len();
        let loaded = self.sources_info.iter().filter(|info| info.loaded).count();
        (total, loaded, total - loaded)
    }

    /// 记录配置源详细信息
    pub fn log_sources_info(&self) {
        for info in &self.sources_info {
            tracing::info!(
                source = %info.source_type,
                priority = info.priority,
                loaded = info.loaded,
                "{}",
                info.description
            );
        }
        let (total, loaded, skipped) = self.get_sources_stats();
        tracing::info!("配置源统计: 总计 {} 个，已加载 {} 个，跳过 {} 个", total, loaded, skipped);
    }
}

/// 获取全局配置管理器实例（单例模式）
pub fn get_global_config_manager() -> Result<Arc<ConfigManager>> {
    {
        let manager = GLOBAL_CONFIG_MANAGER
            .read()
            .map_err(|e| anyhow!("读取全局配置管理器锁失败: {}", e))?;
        if let Some(ref config_manager) = *manager {
            return Ok(Arc::clone(config_manager));
        }
    }
    let mut manager = GLOBAL_CONFIG_MANAGER
        .write()
        .map_err(|e| anyhow!("获取全局配置管理器写锁失败: {}", e))?;
    match manager.as_ref() {
        Some(existing) => Ok(Arc::clone(existing)),
        None => {
            let config_manager =
                Arc::new(ConfigManager::new().map_err(|e| anyhow!("创建配置管理器失败: {}", e))?);
            *manager = Some(Arc::clone(&config_manager));
            Ok(config_manager)
        }
    }
}
