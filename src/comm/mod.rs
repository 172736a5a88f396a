/// 通用模块：配置与日志
/// Common infrastructure: configuration and logging

pub mod config;
pub mod config_validator;
pub mod enhanced_config;
pub mod tracing;

pub use enhanced_config::EnhancedConfigManager;
