//! 日志初始化
//!
//! 认证事件（登录、刷新、重放拒绝）都在 `http_request` span 内打出，JSON 格式下
//! 每条事件都带上当前 span 的 trace_id / request_id，便于与错误响应体对照。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// 第三方组件默认压到 warn：sqlx 每条 users 查询都会打 info
const QUIET_DEPENDENCIES: &str = "sqlx=warn,tower_http=warn,hyper=warn";

/// 安装全局 subscriber；已安装时（测试里重复调用）直接忽略
pub fn init_telemetry(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.format.eq_ignore_ascii_case("pretty") {
        registry
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(false),
            )
            .try_init()
    };

    if installed.is_ok() {
        tracing::info!(level = %config.level, format = %config.format, "Logging initialized");
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{},{}", level.to_lowercase(), QUIET_DEPENDENCIES))
}
