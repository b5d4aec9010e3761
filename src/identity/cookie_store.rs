//! 基于 cookie 的身份存储
//!
//! 把请求携带的 cookie 装进 [`CookieJar`]，写入只进 delta，
//! 由 HTTP 层复制到响应的 `Set-Cookie`。

use actix_web::HttpRequest;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, CookieJar, SameSite};
use parking_lot::Mutex;
use tracing::warn;

use super::{HandshakeMarker, IdentityStore, VisitorIdentity, decode_identity, encode_identity};
use crate::config::{CookieConfig, SameSitePolicy};

const MARKER_VALUE: &str = "1";

pub struct CookieJarStore {
    jar: Mutex<CookieJar>,
    identity_name: String,
    marker_name: String,
    secure: bool,
    same_site: SameSite,
    domain: Option<String>,
}

impl CookieJarStore {
    pub fn new(config: &CookieConfig) -> Self {
        let same_site = match config.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };

        Self {
            jar: Mutex::new(CookieJar::new()),
            identity_name: config.identity_name.clone(),
            marker_name: config.marker_name.clone(),
            secure: config.secure,
            same_site,
            domain: config.domain.clone(),
        }
    }

    /// 用请求携带的 cookie 初始化
    pub fn from_request(req: &HttpRequest, config: &CookieConfig) -> Self {
        let store = Self::new(config);
        if let Ok(cookies) = req.cookies() {
            let mut jar = store.jar.lock();
            for cookie in cookies.iter() {
                jar.add_original(cookie.clone().into_owned());
            }
        }
        store
    }

    /// 手动放入一个原始 cookie（相当于浏览器带来的）
    pub fn add_original(&self, name: &str, value: &str) {
        self.jar
            .lock()
            .add_original(Cookie::new(name.to_string(), value.to_string()));
    }

    /// 本次请求写入、需要回写给浏览器的 cookie
    pub fn delta_cookies(&self) -> Vec<Cookie<'static>> {
        self.jar.lock().delta().cloned().collect()
    }

    fn build_cookie(&self, name: String, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        // 前端脚本需要读取身份和握手标记
        cookie.set_http_only(false);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

impl IdentityStore for CookieJarStore {
    fn load(&self) -> Option<VisitorIdentity> {
        let jar = self.jar.lock();
        jar.get(&self.identity_name)
            .and_then(|cookie| decode_identity(cookie.value()))
    }

    fn save(&self, identity: &VisitorIdentity, ttl_days: u32) {
        let encoded = match encode_identity(identity) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to serialize visitor identity: {}", e);
                return;
            }
        };

        let mut cookie = self.build_cookie(self.identity_name.clone(), encoded);
        cookie.set_max_age(CookieDuration::days(ttl_days as i64));
        self.jar.lock().add(cookie);
    }
}

impl HandshakeMarker for CookieJarStore {
    fn is_completed(&self) -> bool {
        self.jar
            .lock()
            .get(&self.marker_name)
            .is_some_and(|cookie| cookie.value() == MARKER_VALUE)
    }

    fn mark_completed(&self) {
        let mut cookie = self.build_cookie(self.marker_name.clone(), MARKER_VALUE.to_string());
        cookie.make_permanent();
        self.jar.lock().add(cookie);
    }
}
