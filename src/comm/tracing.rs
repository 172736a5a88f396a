use anyhow::{anyhow, Result};
use chrono::{Datelike, Timelike};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

struct LogTimer;

impl fmt::time::FormatTime for LogTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        let cs = now.timestamp_subsec_millis() / 10;
        let s = format!(
            "{:04}-{:02}-{:02}:{:02}:{:02}:{:02}:{:02}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            cs
        );
        w.write_str(&s)
    }
}

/// `RUST_LOG` 优先，其次是配置中的级别
/// `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},sqlx=warn", level)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志；`json` 为真时输出 bunyan JSON
/// Install the global subscriber; `json` selects bunyan output
///
/// 两种格式都用 `finish()` 构建再设置全局订阅者，`log` 桥接只安装一次
/// Both formats are built with `finish()` and installed through
/// `set_global_default`, so the `log` bridge is installed exactly once
pub fn init_tracing(level: &str, json: bool) -> Result<()> {
    // actix 的 Logger 走 log 门面，桥接到 tracing
    LogTracer::init().map_err(|e| anyhow!("设置 log 桥接失败: {}", e))?;
    let filter = build_filter(level);

    if json {
        let formatting_layer = BunyanFormattingLayer::new("notes-rust".into(), std::io::stdout);
        let subscriber = Registry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(formatting_layer);
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow!("设置日志订阅者失败: {}", e))?;
    } else {
        let subscriber = fmt::SubscriberBuilder::default()
            .with_env_filter(filter)
            .with_timer(LogTimer)
            .compact()
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow!("设置日志订阅者失败: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 全局订阅者每个进程只能设置一次，本模块只有这一个测试安装它
    #[test]
    fn test_init_plain_format_installs_once() {
        init_tracing("info", false).unwrap();
        tracing::info!("plain subscriber installed");

        // 第二次安装必须报错而不是静默成功
        assert!(init_tracing("debug", false).is_err());
    }
}
