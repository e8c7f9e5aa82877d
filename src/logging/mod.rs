use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::ConfigError;

/// 日志格式配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式
    Json,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` 指令，例如 `info` 或 `plugkit=debug`；`RUST_LOG` 优先
    pub level: String,
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
            ansi: true,
        }
    }
}

impl LoggingSettings {
    /// 开发环境配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// 测试环境配置
    pub fn testing() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Compact,
            show_target: false,
            ansi: false,
        }
    }

    pub fn filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.level).map_err(|err| ConfigError::Invalid {
            field: "logging.level".to_string(),
            reason: err.to_string(),
        })
    }
}

/// 初始化日志系统
///
/// 已有全局 subscriber 时返回 `Ok(false)`，不会覆盖。
pub fn init_logging(settings: &LoggingSettings) -> Result<bool, ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => settings.filter()?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(settings.show_target)
                    .with_ansi(settings.ansi),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(settings.show_target)
                    .with_ansi(settings.ansi),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(settings.show_target))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed, keeping it");
        return Ok(false);
    }

    tracing::info!(
        level = %settings.level,
        format = ?settings.format,
        "Logging system initialized"
    );
    Ok(true)
}

/// 操作性能计时器
pub struct OperationTimer {
    start: Instant,
    operation: String,
    metadata: HashMap<String, String>,
    finished: bool,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
            finished: false,
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// 完成计时并记录日志
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let duration = self.start.elapsed();
        tracing::info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            metadata = ?self.metadata,
            "Operation completed"
        );
        duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::debug!(
            operation = %self.operation,
            duration_ms = self.start.elapsed().as_millis(),
            metadata = ?self.metadata,
            "Operation timer dropped"
        );
    }
}
