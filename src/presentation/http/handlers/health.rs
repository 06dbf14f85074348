//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness check (is the process running?)
//! - `GET /health/ready` - Readiness check (can the gateway accept connections?)
//!
//! PostgreSQL is required: without it no message can be persisted, so a
//! failed check makes the gateway unready. Redis only holds typing markers,
//! which are best-effort, so losing it degrades the gateway instead.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::startup::AppState;

static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Pin the start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
    pub gateway: GatewayHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GatewayHealth {
    pub status: HealthStatus,
    pub online_users: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Returns 200 if ready (possibly degraded), 503 if PostgreSQL is unreachable
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let db_health = check_database(&state).await;
    let redis_health = check_redis(&state).await;

    let gateway_health = GatewayHealth {
        status: HealthStatus::Healthy,
        online_users: state.gateway.online_count(),
    };

    let overall_status = determine_overall_status(&db_health, &redis_health);

    let response = ReadinessResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks {
            database: db_health,
            redis: redis_health,
            gateway: gateway_health,
        },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

fn timed(start: Instant, degraded_after_ms: u64) -> ServiceHealth {
    let latency = start.elapsed().as_millis() as u64;
    ServiceHealth {
        status: if latency < degraded_after_ms {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        latency_ms: Some(latency),
        message: None,
    }
}

fn failed(message: String) -> ServiceHealth {
    ServiceHealth {
        status: HealthStatus::Unhealthy,
        latency_ms: None,
        message: Some(message),
    }
}

async fn check_database(state: &AppState) -> ServiceHealth {
    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => timed(start, 100),
        Err(e) => failed(format!("Database connection failed: {}", e)),
    }
}

async fn check_redis(state: &AppState) -> ServiceHealth {
    let start = Instant::now();
    let mut conn = match state.redis.get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => return failed(format!("Redis connection failed: {}", e)),
    };
    match redis::cmd("PING").query_async::<String>(&mut conn).await {
        Ok(_) => timed(start, 50),
        Err(e) => failed(format!("Redis ping failed: {}", e)),
    }
}

fn determine_overall_status(db: &ServiceHealth, redis: &ServiceHealth) -> HealthStatus {
    if db.status == HealthStatus::Unhealthy {
        return HealthStatus::Unhealthy;
    }

    if db.status == HealthStatus::Degraded || redis.status != HealthStatus::Healthy {
        return HealthStatus::Degraded;
    }

    HealthStatus::Healthy
}
