//! Application configuration
//!
//! All settings come from defaults overridden by environment variables
//! (e.g. `SERVER__PORT=8080`, `DATABASE__URL=sqlite://tuangou.db`). The
//! loaded `AppConfig` is passed explicitly to the components that need it;
//! nothing reads the process environment after startup.

use serde::Deserialize;

use crate::errors::{Result, TuangouError};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// sqlite / mysql / postgres
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// 为空时输出到控制台
    pub file: Option<String>,
    pub enable_rotation: bool,
    pub max_backups: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// 活动状态轮询间隔（秒）
    pub status_interval_secs: u64,
}

/// Base URLs for the mobile pages embedded in customer notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct PagesConfig {
    pub order_page: String,
    pub publish_page: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Whether entering END recomputes the discount level and final price.
    /// The legacy behavior freezes the price at END, so this defaults off.
    pub recompute_price_on_end: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
    pub pages: PagesConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")
            .and_then(|b| b.set_default("server.port", 8080))
            .and_then(|b| b.set_default("database.url", "sqlite://tuangou.db"))
            .and_then(|b| b.set_default("database.backend", "sqlite"))
            .and_then(|b| b.set_default("logging.level", "info"))
            .and_then(|b| b.set_default("logging.file", ""))
            .and_then(|b| b.set_default("logging.enable_rotation", true))
            .and_then(|b| b.set_default("logging.max_backups", 7))
            .and_then(|b| b.set_default("schedule.status_interval_secs", 60))
            .and_then(|b| {
                b.set_default("pages.order_page", "http://localhost:3000/mobile/order")
            })
            .and_then(|b| {
                b.set_default("pages.publish_page", "http://localhost:3000/mobile/publish")
            })
            .and_then(|b| b.set_default("pricing.recompute_price_on_end", false))
            .map_err(|e| TuangouError::database_config(format!("配置默认值错误: {}", e)))?;

        let settings = builder
            .add_source(config::Environment::default().separator("__"))
            .build()
            .map_err(|e| TuangouError::database_config(format!("配置加载失败: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| TuangouError::database_config(format!("配置解析失败: {}", e)))
    }
}
