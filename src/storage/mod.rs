//! Backend persistence for session rows, referral leads and profiles

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmBackend;
pub use models::{SessionPatch, SessionRow};

/// Hosted backend the engine writes to
///
/// Every call is one network round trip; callers on the session path log and
/// swallow errors, only lead submission surfaces them.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn insert_session(&self, row: SessionRow) -> Result<()>;

    /// Partial update keyed by `session_id`; a missing row is not an error
    async fn update_session(&self, session_id: &str, patch: SessionPatch) -> Result<()>;

    async fn fetch_display_name(&self, profile_id: &str) -> Result<Option<String>>;

    /// Insert a lead; status and creation time are assigned backend-side
    async fn record_lead(&self, referrer_id: &str, phone: &str, name: &str) -> Result<()>;

    fn backend_name(&self) -> &str;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmBackend>> {
        let database_url = &config.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = SeaOrmBackend::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(storage))
    }
}
