use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{error, info, instrument};

use crate::api::{self, AppState};
use crate::command_registry::ServerOverrides;
use crate::comm::config::{get_global_config_manager, ConfigError};
use crate::comm::config_validator::{AppConfiguration, EnvironmentConfigLoader};
use crate::comm::tracing::init_tracing;
use crate::comm::EnhancedConfigManager;
use crate::conf;
use crate::error::{AppError, AppResult};

/// 服务器监听配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: Some(4),
        }
    }
}

impl From<&AppConfiguration> for AppConfig {
    fn from(c: &AppConfiguration) -> Self {
        Self {
            host: c.server_host.clone(),
            port: c.server_port,
            workers: c.server_workers,
        }
    }
}

impl AppConfig {
    /// 命令行参数优先于配置 / Command-line flags win over configuration
    pub fn apply_overrides(mut self, overrides: &ServerOverrides) -> Self {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(workers) = overrides.workers {
            self.workers = Some(workers);
        }
        self
    }
}

/// 读取全局配置、校验并初始化日志
/// Load the global configuration, validate it and install logging
///
/// `force_debug` 来自 `--debug`，与 `server.debug` 一样把日志提升到 debug
/// `force_debug` comes from `--debug` and, like `server.debug`, raises logging to debug
pub fn load_configuration(force_debug: bool) -> AppResult<EnhancedConfigManager> {
    let config_manager = get_global_config_manager().map_err(|e| {
        AppError::Config(ConfigError::InitializationError {
            message: e.to_string(),
        })
    })?;
    let manager = EnhancedConfigManager::from_manager(EnvironmentConfigLoader::new(), config_manager)?;
    manager.validate_required_config()?;

    let app_config = manager.get_app_config();
    init_tracing(app_config.log_level(force_debug), app_config.logging_json_format)?;
    manager.print_config_summary();
    Ok(manager)
}

/// 应用启动器
pub struct AppBootstrap {
    config: AppConfig,
    state: web::Data<AppState>,
}

impl AppBootstrap {
    pub fn new(config: AppConfig, state: web::Data<AppState>) -> Self {
        Self { config, state }
    }

    /// 由完整配置装配存储与令牌服务
    /// Assemble storage and the token service from configuration
    pub async fn from_configuration(
        app_config: &AppConfiguration,
        overrides: &ServerOverrides,
    ) -> AppResult<Self> {
        let tokens = conf::init_token_service(app_config)?;
        let storage = conf::init_storage(app_config).await?;
        let state = web::Data::new(AppState::new(storage, tokens, conf::paging(app_config)));
        let config = AppConfig::from(app_config).apply_overrides(overrides);
        Ok(Self::new(config, state))
    }

    /// 运行应用服务器
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let config = self.config.clone();
        info!("启动应用服务器，配置: {:?}", config);

        match self.start_http_server().await {
            Ok(()) => {
                info!("服务器已停止");
                Ok(())
            }
            Err(e) => {
                error!("服务器启动失败: {}", e);
                Err(e)
            }
        }
    }

    async fn start_http_server(self) -> AppResult<()> {
        let state = self.state;
        let config = self.config;
        info!(backend = state.backend, "服务器将在 {}:{} 上启动", config.host, config.port);

        let mut server = HttpServer::new(move || {
            let state = state.clone();
            App::new()
                .wrap(Logger::default())
                .configure(move |cfg| api::configure(cfg, state))
                .default_service(web::to(api::not_found))
        });
        if let Some(workers) = config.workers {
            server = server.workers(workers);
        }

        server
            .bind(format!("{}:{}", config.host, config.port))
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?
            .run()
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        Ok(())
    }
}

/// `server` 子命令
pub async fn handle_server_command(overrides: ServerOverrides) -> AppResult<()> {
    let manager = load_configuration(overrides.debug)?;
    AppBootstrap::from_configuration(manager.get_app_config(), &overrides)
        .await?
        .run()
        .await
}

/// `migrate` 子命令：只执行建表，不启动服务
pub async fn handle_migrate_command() -> AppResult<()> {
    let manager = load_configuration(false)?;
    let app_config = manager.get_app_config();
    if !app_config.uses_postgres() {
        return Err(AppError::Config(ConfigError::Invalid {
            key: "storage.backend".to_string(),
            message: "migrate 需要 postgres 后端".to_string(),
        }));
    }
    let store = conf::connect_postgres(app_config).await?;
    store.migrate().await?;
    info!("数据库迁移完成");
    Ok(())
}
