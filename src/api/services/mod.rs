pub mod health;
pub mod referral;
pub mod track;

use actix_web::{HttpRequest, HttpResponse, error, web};

use super::helpers::error_from_visitrack;
use crate::errors::VisitrackError;

pub use health::{HealthService, health_routes};
pub use referral::ReferralService;
pub use track::TrackService;

/// v1 路由
pub fn v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .route("/track", web::post().to(TrackService::track))
        .route(
            "/referral/handshake",
            web::get().to(ReferralService::handshake),
        )
        .route("/referral/lead", web::post().to(ReferralService::submit_lead))
}

/// JSON 解析失败时也返回统一信封
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            let resp = error_from_visitrack(&VisitrackError::validation(err.to_string()));
            error::InternalError::from_response(err, resp).into()
        })
}

async fn unknown_route(req: HttpRequest) -> HttpResponse {
    error_from_visitrack(&VisitrackError::not_found(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}

/// 注册所有路由（server 与测试共用）
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::scope("/health").service(health_routes()))
        .service(v1_routes())
        .default_service(web::to(unknown_route));
}
