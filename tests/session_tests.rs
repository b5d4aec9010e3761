//! Session boundary properties over a range of inputs

mod common;

use chrono::TimeDelta;

use visitrack::identity::{SessionRecord, VisitorIdentity};
use visitrack::session::{
    BoundaryReason, DeviceType, SESSION_IDLE_TIMEOUT_SECS, UrlParams, decide, normalize_referrer,
};

use common::base_time;

fn identity_with(utm: Option<&str>) -> VisitorIdentity {
    let mut identity = VisitorIdentity::with_id("visitor-1");
    identity.push_session(SessionRecord {
        session_id: "session-1".into(),
        last_activity: base_time(),
        utm_source: utm.map(String::from),
    });
    identity
}

fn params(query: &str) -> UrlParams {
    UrlParams::from_query(query, "ref")
}

#[test]
fn test_no_prior_cookie_is_new_exactly_once() {
    let first = decide(None, None, base_time(), &params(""), None);
    assert!(first.new_session);
    assert_eq!(first.reason, BoundaryReason::FirstVisit);

    // 首次访问之后立即再次访问，不应再开新会话
    let identity = identity_with(None);
    let second = decide(Some(&identity), None, base_time(), &params(""), None);
    assert!(!second.new_session);
}

#[test]
fn test_within_timeout_continues() {
    let identity = identity_with(Some("google"));
    for secs in [0, 1, 60, 29 * 60, SESSION_IDLE_TIMEOUT_SECS] {
        let now = base_time() + TimeDelta::seconds(secs);
        for query in ["", "utm_source=google", "utm_medium=cpc", "utm_source="] {
            let d = decide(Some(&identity), None, now, &params(query), None);
            assert!(!d.new_session, "elapsed={}s query={:?}", secs, query);
            assert_eq!(d.reason, BoundaryReason::Continue);
        }
    }
}

#[test]
fn test_past_timeout_is_new_regardless_of_utm() {
    let identity = identity_with(Some("google"));
    for secs in [SESSION_IDLE_TIMEOUT_SECS + 1, 3600, 86_400 * 40] {
        let now = base_time() + TimeDelta::seconds(secs);
        for query in ["", "utm_source=google", "utm_source=facebook"] {
            let d = decide(Some(&identity), None, now, &params(query), None);
            assert!(d.new_session, "elapsed={}s query={:?}", secs, query);
            assert_eq!(d.reason, BoundaryReason::IdleTimeout);
        }
    }
}

#[test]
fn test_different_campaign_is_new_at_zero_elapsed() {
    for stored in [None, Some("google")] {
        let identity = identity_with(stored);
        let d = decide(
            Some(&identity),
            None,
            base_time(),
            &params("utm_source=facebook"),
            None,
        );
        assert!(d.new_session);
        assert_eq!(d.reason, BoundaryReason::CampaignChange);
    }
}

#[test]
fn test_explicit_last_session_overrides_identity() {
    let identity = identity_with(Some("google"));
    let stale = SessionRecord {
        session_id: "older".into(),
        last_activity: base_time() - TimeDelta::hours(3),
        utm_source: None,
    };
    let d = decide(Some(&identity), Some(&stale), base_time(), &params(""), None);
    assert_eq!(d.reason, BoundaryReason::IdleTimeout);
}

#[test]
fn test_decision_is_idempotent() {
    let identity = identity_with(Some("google"));
    let now = base_time() + TimeDelta::minutes(5);
    let p = params("utm_source=newsletter&ref=abc");
    let a = decide(Some(&identity), None, now, &p, Some("https://mail.example.com/"));
    let b = decide(Some(&identity), None, now, &p, Some("https://mail.example.com/"));
    assert_eq!(a, b);
}

#[test]
fn test_referrer_never_moves_boundary() {
    let identity = identity_with(None);
    let now = base_time() + TimeDelta::minutes(1);
    for referrer in [None, Some("https://www.google.com/"), Some("https://t.co/x")] {
        let d = decide(Some(&identity), None, now, &params(""), referrer);
        assert!(!d.new_session);
    }
}

#[test]
fn test_url_params_and_referrer_normalization() {
    let p = UrlParams::from_url(
        "https://shop.example.com/p/42?utm_source=ig&utm_medium=story&utm_campaign=eid&ref=ref42",
        "ref",
    );
    assert_eq!(p.utm_source.as_deref(), Some("ig"));
    assert_eq!(p.utm_medium.as_deref(), Some("story"));
    assert_eq!(p.utm_campaign.as_deref(), Some("eid"));
    assert_eq!(p.referral_token.as_deref(), Some("ref42"));
    assert_eq!(p.path.as_deref(), Some("/p/42"));

    assert_eq!(normalize_referrer(Some("")), None);
    assert_eq!(normalize_referrer(None), None);
    assert_eq!(
        normalize_referrer(Some("https://l.facebook.com/")).as_deref(),
        Some("https://l.facebook.com/")
    );
}

#[test]
fn test_device_classification() {
    assert_eq!(
        DeviceType::classify(Some("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)")),
        DeviceType::Mobile
    );
    assert_eq!(
        DeviceType::classify(Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)")),
        DeviceType::Desktop
    );
    assert_eq!(DeviceType::Mobile.as_ref(), "mobile");
}
