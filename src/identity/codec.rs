//! 身份 cookie 编解码
//!
//! 写入的值是百分号编码后的 JSON。浏览器带回的 cookie 已被 actix 解码过一次，
//! 而本请求内刚写入 jar 的值仍是编码形式，所以解码只做一次：
//! 先按 JSON 解析，失败时才做一次百分号解码。

use tracing::debug;

use super::VisitorIdentity;
use crate::errors::Result;

/// 序列化为可直接放进 cookie 的字符串
pub fn encode_identity(identity: &VisitorIdentity) -> Result<String> {
    let json = serde_json::to_string(identity)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// 解析存储的身份值
///
/// 接受原始 JSON 或百分号编码的 JSON，百分号只解码一次。
/// 空值、格式错误、缺少 visitor_id 的一律返回 `None`；
/// 超长历史只保留最新的几条。
pub fn decode_identity(raw: &str) -> Option<VisitorIdentity> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = serde_json::from_str::<VisitorIdentity>(raw).or_else(|e| {
        // 编码后的 JSON 以 %7B 开头，不可能是合法 JSON
        match urlencoding::decode(raw) {
            Ok(decoded) if decoded != raw => serde_json::from_str(&decoded),
            _ => Err(e),
        }
    });

    let mut identity = match parsed {
        Ok(identity) => identity,
        Err(e) => {
            debug!("Discarding unreadable visitor identity: {}", e);
            return None;
        }
    };

    if identity.visitor_id.trim().is_empty() {
        debug!("Discarding visitor identity without visitor_id");
        return None;
    }

    identity.sessions.retain(|s| !s.session_id.is_empty());
    identity.trim_history();
    Some(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{MAX_SESSION_HISTORY, SessionRecord};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_encode_then_decode() {
        let mut identity = VisitorIdentity::with_id("visitor-1");
        identity.push_session(SessionRecord {
            session_id: "s1".into(),
            last_activity: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            utm_source: Some("newsletter spring".into()),
        });

        let encoded = encode_identity(&identity).unwrap();
        assert!(!encoded.contains('"'), "cookie value must not carry raw quotes");
        assert_eq!(decode_identity(&encoded), Some(identity));
    }

    #[test]
    fn test_percent_sequences_in_values_survive() {
        let mut identity = VisitorIdentity::with_id("visitor-2");
        identity.push_session(SessionRecord {
            session_id: "s1".into(),
            last_activity: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            utm_source: Some("a%41b \"q\" 100% café".into()),
        });

        // 本请求内写入的编码值
        let encoded = encode_identity(&identity).unwrap();
        assert_eq!(decode_identity(&encoded), Some(identity.clone()));

        // 浏览器带回后已被解码一次的值
        let once = urlencoding::decode(&encoded).unwrap().into_owned();
        assert_eq!(decode_identity(&once), Some(identity));
    }

    #[test]
    fn test_decode_accepts_raw_json() {
        let raw = r#"{"visitorId":"abc","sessions":[{"sessionId":"s","lastActivity":"2026-01-01T00:00:00Z"}]}"#;
        let identity = decode_identity(raw).unwrap();
        assert_eq!(identity.visitor_id, "abc");
        assert_eq!(identity.sessions.len(), 1);
        assert_eq!(identity.sessions[0].utm_source, None);
    }

    #[test]
    fn test_decode_missing_sessions_field() {
        let identity = decode_identity(r#"{"visitorId":"abc"}"#).unwrap();
        assert!(identity.sessions.is_empty());
    }

    #[test]
    fn test_decode_malformed_is_none() {
        for raw in [
            "",
            "   ",
            "not json",
            "{",
            "[]",
            "42",
            r#"{"sessions":[]}"#,
            r#"{"visitorId":""}"#,
            r#"{"visitorId":"abc","sessions":"nope"}"#,
            r#"{"visitorId":"abc","sessions":[{"sessionId":"s","lastActivity":"yesterday"}]}"#,
            "%7B%22visitorId",
        ] {
            assert_eq!(decode_identity(raw), None, "input {:?} should be discarded", raw);
        }
    }

    #[test]
    fn test_decode_trims_oversized_history() {
        let sessions: Vec<String> = (0..8)
            .map(|i| {
                format!(
                    r#"{{"sessionId":"s{}","lastActivity":"2026-01-01T00:0{}:00Z"}}"#,
                    i, i
                )
            })
            .collect();
        let raw = format!(r#"{{"visitorId":"abc","sessions":[{}]}}"#, sessions.join(","));

        let identity = decode_identity(&raw).unwrap();
        assert_eq!(identity.sessions.len(), MAX_SESSION_HISTORY);
        assert_eq!(identity.sessions[0].session_id, "s3");
        assert_eq!(identity.last_session().unwrap().session_id, "s7");
    }
}
