use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use tracing::trace;

use crate::api::helpers::success_response;
use crate::api::state::AppState;
use crate::api::types::HealthResponse;

/// Health Service
///
/// 只做存活检查：后端写入本身就是尽力而为，探针不依赖数据库往返。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
        trace!("Received health check request");

        let now = Utc::now();
        let uptime = (now - state.started_at).num_seconds().max(0) as u64;

        success_response(HealthResponse {
            status: "healthy".to_string(),
            backend: state.backend.backend_name().to_string(),
            geoip: state.geo.name().to_string(),
            timestamp: now.to_rfc3339(),
            uptime,
        })
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
