//! SeaORM storage backend
//!
//! Implements [`RemoteBackend`](crate::storage::RemoteBackend) over SQLite,
//! MySQL/MariaDB and PostgreSQL.

mod connection;
mod leads;
mod sessions;
pub mod retry;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{Result, VisitrackError};
use crate::storage::{RemoteBackend, SessionPatch, SessionRow};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(VisitrackError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based backend
#[derive(Clone)]
pub struct SeaOrmBackend {
    db: DatabaseConnection,
    backend_name: String,
    retry_policy: retry::RetryPolicy,
}

impl SeaOrmBackend {
    pub async fn new(database_url: &str, backend_name: &str, config: &DatabaseConfig) -> Result<Self> {
        if database_url.is_empty() {
            return Err(VisitrackError::database_config(
                "database_url 未设置".to_string(),
            ));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config.pool_size).await?
        };

        let backend = SeaOrmBackend {
            db,
            backend_name: backend_name.to_string(),
            retry_policy: retry::RetryPolicy::from(config),
        };

        run_migrations(&backend.db).await?;

        info!("{} backend initialized.", backend.backend_name.to_uppercase());
        Ok(backend)
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl RemoteBackend for SeaOrmBackend {
    async fn insert_session(&self, row: SessionRow) -> Result<()> {
        self.insert_session_row(row).await
    }

    async fn update_session(&self, session_id: &str, patch: SessionPatch) -> Result<()> {
        self.update_session_row(session_id, patch).await
    }

    async fn fetch_display_name(&self, profile_id: &str) -> Result<Option<String>> {
        self.find_display_name(profile_id).await
    }

    async fn record_lead(&self, referrer_id: &str, phone: &str, name: &str) -> Result<()> {
        self.insert_lead(referrer_id, phone, name).await
    }

    fn backend_name(&self) -> &str {
        &self.backend_name
    }
}
