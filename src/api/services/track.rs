use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::USER_AGENT;
use actix_web::{HttpRequest, Responder, web};
use chrono::Utc;
use tracing::trace;

use crate::api::error_code::ErrorCode;
use crate::api::helpers::{error_response, success_with_cookies};
use crate::api::state::AppState;
use crate::api::types::TrackRequest;
use crate::identity::CookieJarStore;
use crate::lifecycle::{PageView, VisitorLifecycle};

pub struct TrackService;

impl TrackService {
    /// 对一次路由变化执行会话判定
    ///
    /// 后端写入在响应发出后继续进行。
    pub async fn track(
        req: HttpRequest,
        state: web::Data<AppState>,
        body: web::Json<TrackRequest>,
    ) -> impl Responder {
        let body = body.into_inner();
        if body.url.trim().is_empty() {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::TrackInvalidUrl,
                "url is required",
            );
        }

        let config = &state.config;
        let store = Arc::new(CookieJarStore::from_request(&req, &config.cookies));
        let lifecycle = VisitorLifecycle::new(store.clone(), state.sync_client())
            .with_ttl_days(config.cookies.ttl_days);

        let user_agent = req.headers().get(USER_AGENT).and_then(|h| h.to_str().ok());
        let page = PageView::new(&body.url, &config.referral.param_name, Utc::now())
            .with_referrer(body.referrer.as_deref())
            .with_user_agent(user_agent)
            .with_client_ip(state.ip_resolver.resolve(&req));

        // 网络副作用在后台完成，不阻塞响应
        let (outcome, _effects) = lifecycle.on_route_change(&page);
        trace!(
            "Tracked {} for visitor {} (new_session={})",
            body.url, outcome.visitor_id, outcome.decision.new_session
        );

        success_with_cookies(outcome, store.delta_cookies())
    }
}
