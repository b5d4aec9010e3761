//! 后端写入的重试策略
//!
//! 会话写入和线索写入走同一个策略：连接失败与锁冲突按指数退避重试，
//! 其余错误（唯一约束、记录不存在等）立即返回给调用方。

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use rand::RngExt;
use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// MySQL 1213/1205，PostgreSQL 40001/40P01，SQLite BUSY(5)/LOCKED(6)
const TRANSIENT_SQL_CODES: &[&str] = &["1213", "1205", "40001", "40P01", "5", "6"];

/// 没有错误码时按消息匹配
const TRANSIENT_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// Whether retrying `err` may succeed
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(inner) | DbErr::Query(inner) => is_transient(inner),
        _ => false,
    }
}

fn is_transient(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code());
            match code {
                Some(code) => TRANSIENT_SQL_CODES.iter().any(|c| *c == code),
                None => mentions_lock_conflict(&sqlx_err.to_string()),
            }
        }
        RuntimeErr::Internal(msg) => mentions_lock_conflict(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn mentions_lock_conflict(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|m| message.contains(m))
}

/// Backoff settings derived from `[database]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): doubling, capped, plus up to 25% jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = doubled.min(self.max_delay_ms);
        let jitter = rand::rng().random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// Run `operation`, retrying transient failures according to `policy`
pub async fn with_retry<T, F, Fut>(label: &str, policy: RetryPolicy, mut operation: F) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut retries = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} succeeded after {} retries", label, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable_error(&err) {
            debug!("{} failed permanently: {}", label, err);
            return Err(err);
        }
        if retries >= policy.max_retries {
            warn!("{} gave up after {} retries: {}", label, retries, err);
            return Err(err);
        }

        retries += 1;
        let delay = policy.backoff(retries);
        warn!(
            "{} hit a transient error ({}), retry {}/{} in {:?}",
            label, err, retries, policy.max_retries, delay
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::ConnAcquireErr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 5,
            max_delay_ms: 20,
        }
    }

    fn internal(msg: &str) -> RuntimeErr {
        RuntimeErr::Internal(msg.to_string())
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(is_retryable_error(&DbErr::ConnectionAcquire(
            ConnAcquireErr::Timeout
        )));
        assert!(is_retryable_error(&DbErr::Conn(internal("connection reset"))));
    }

    #[test]
    fn test_lock_conflicts_are_retryable() {
        assert!(is_retryable_error(&DbErr::Exec(internal(
            "Deadlock found when trying to get lock"
        ))));
        assert!(is_retryable_error(&DbErr::Query(internal(
            "database is locked"
        ))));
        assert!(is_retryable_error(&DbErr::Exec(internal(
            "Lock wait timeout exceeded"
        ))));
    }

    #[test]
    fn test_deterministic_errors_are_not_retryable() {
        assert!(!is_retryable_error(&DbErr::RecordNotFound("gone".into())));
        assert!(!is_retryable_error(&DbErr::Exec(internal(
            "UNIQUE constraint failed: visitor_sessions.session_id"
        ))));
    }

    #[test]
    fn test_policy_from_database_config() {
        let db = DatabaseConfig {
            retry_count: 5,
            retry_base_delay_ms: 20,
            retry_max_delay_ms: 400,
            ..Default::default()
        };
        assert_eq!(
            RetryPolicy::from(&db),
            RetryPolicy {
                max_retries: 5,
                base_delay_ms: 20,
                max_delay_ms: 400,
            }
        );
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        };
        let ms = |attempt| policy.backoff(attempt).as_millis() as u64;

        assert!((100..=125).contains(&ms(1)));
        assert!((200..=250).contains(&ms(2)));
        assert!((400..=500).contains(&ms(3)));
        assert!((2000..=2500).contains(&ms(10)));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("insert_session(s1)", fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout))
                } else {
                    Ok("stored")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "stored");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_when_budget_is_spent() {
        let calls = AtomicU32::new(0);
        let result = with_retry("record_lead(ref42)", fast_policy(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_returned_immediately() {
        let calls = AtomicU32::new(0);
        let result = with_retry("update_session(s1)", fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::RecordNotFound("s1".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
