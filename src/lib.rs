//! 笔记 REST 服务
//! Notes REST service: registration, token login and per-user notes

pub mod api;
pub mod auth;
pub mod comm;
pub mod conf;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod model;
pub mod store;

#[path = "bootstrap/app_bootstrap.rs"]
pub mod app_bootstrap;
#[path = "bootstrap/command_registry.rs"]
pub mod command_registry;

pub use app_bootstrap::{AppBootstrap, AppConfig};
pub use command_registry::build_app;
