//! 可观测性模块
//!
//! 提供 Prometheus 指标、结构化日志和健康检查。

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::api::app_state::AppState;
use crate::config::config::LoggingConfig;
use crate::models::adapter::CacheStatus;

// ===== Simple Metrics =====

/// 应用指标
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub events_total: AtomicU64,
    pub reactions_total: AtomicU64,
    pub generation_fallbacks_total: AtomicU64,
    pub dialogue_requests_total: AtomicU64,
    pub errors_total: AtomicU64,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64, failed: bool) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
        if failed {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_event(&self, reactions: usize) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.reactions_total
            .fetch_add(reactions as u64, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.generation_fallbacks_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dialogue(&self) {
        self.dialogue_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self, cache: &CacheStatus) -> String {
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP events_total World events dispatched
# TYPE events_total counter
events_total {}
# HELP reactions_total Agent reactions produced
# TYPE reactions_total counter
reactions_total {}
# HELP generation_fallbacks_total Reactions answered with the fallback phrase
# TYPE generation_fallbacks_total counter
generation_fallbacks_total {}
# HELP dialogue_requests_total Player dialogue requests
# TYPE dialogue_requests_total counter
dialogue_requests_total {}
# HELP errors_total Failed HTTP requests
# TYPE errors_total counter
errors_total {}
# HELP adapter_cache_size Resident personality adapters
# TYPE adapter_cache_size gauge
adapter_cache_size {}
# HELP adapter_cache_hits_total Adapter cache hits
# TYPE adapter_cache_hits_total counter
adapter_cache_hits_total {}
# HELP adapter_cache_misses_total Adapter cache misses
# TYPE adapter_cache_misses_total counter
adapter_cache_misses_total {}
# HELP adapter_cache_evictions_total Adapter cache evictions
# TYPE adapter_cache_evictions_total counter
adapter_cache_evictions_total {}
"#,
            self.http_requests_total.load(Ordering::Relaxed),
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            self.http_requests_total.load(Ordering::Relaxed),
            self.events_total.load(Ordering::Relaxed),
            self.reactions_total.load(Ordering::Relaxed),
            self.generation_fallbacks_total.load(Ordering::Relaxed),
            self.dialogue_requests_total.load(Ordering::Relaxed),
            self.errors_total.load(Ordering::Relaxed),
            cache.cache_size,
            cache.hits,
            cache.misses,
            cache.evictions,
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

impl HealthCheck {
    fn new(name: &str, healthy: bool, message: String, latency_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            message: Some(message),
            latency_ms: Some(latency_ms),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// 获取完整健康状态
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let database = match state.orchestrator.ping().await {
        Ok(()) => HealthCheck::new(
            "database",
            true,
            "Connected".to_string(),
            start.elapsed().as_millis() as u64,
        ),
        Err(e) => HealthCheck::new(
            "database",
            false,
            e.to_string(),
            start.elapsed().as_millis() as u64,
        ),
    };

    let cache = state.orchestrator.cache_status();
    let adapters = HealthCheck::new(
        "adapter_cache",
        true,
        format!("{}/{} adapters loaded", cache.cache_size, cache.max_cache_size),
        0,
    );

    let checks = vec![database, adapters];
    let all_healthy = checks.iter().all(HealthCheck::is_healthy);

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks,
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let output = state.metrics.gather(&state.orchestrator.cache_status());
    (StatusCode::OK, output)
}

/// 创建可观测性路由
pub fn create_observability_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
}

// ===== Structured Logging =====

/// 初始化日志
///
/// 返回的 guard 需要在进程结束前保持存活，否则文件日志会丢失。
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.level)));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "spector.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    let result = if config.structured {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }

    guard
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = Instant::now();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let failed = response.status().is_server_error();
    state.metrics.record_http_request(duration_ms, failed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_status() -> CacheStatus {
        CacheStatus {
            loaded_adapters: vec!["baker.lora".into()],
            cache_size: 1,
            max_cache_size: 3,
            utilization: 1.0 / 3.0,
            hits: 4,
            misses: 2,
            evictions: 1,
        }
    }

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::default();
        metrics.record_http_request(100, false);
        metrics.record_http_request(50, true);
        metrics.record_event(3);
        metrics.record_fallback();
        metrics.record_dialogue();

        let output = metrics.gather(&cache_status());
        assert!(output.contains("http_requests_total 2"));
        assert!(output.contains("http_request_duration_seconds_sum 0.15"));
        assert!(output.contains("events_total 1"));
        assert!(output.contains("reactions_total 3"));
        assert!(output.contains("generation_fallbacks_total 1"));
        assert!(output.contains("dialogue_requests_total 1"));
        assert!(output.contains("errors_total 1"));
        assert!(output.contains("adapter_cache_hits_total 4"));
        assert!(output.contains("adapter_cache_evictions_total 1"));
    }

    #[test]
    fn test_health_check_status() {
        let ok = HealthCheck::new("database", true, "Connected".into(), 3);
        let bad = HealthCheck::new("database", false, "closed".into(), 1);
        assert!(ok.is_healthy());
        assert!(!bad.is_healthy());
        assert_eq!(bad.status, "unhealthy");
    }
}
