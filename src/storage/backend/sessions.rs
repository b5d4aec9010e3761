//! Session row writes and lookups

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, UpdateMany};
use tracing::{debug, trace};

use super::SeaOrmBackend;
use super::retry;
use crate::errors::{Result, VisitrackError};
use crate::storage::{SessionPatch, SessionRow};

use migration::entities::visitor_session;

fn row_to_active_model(row: SessionRow) -> visitor_session::ActiveModel {
    visitor_session::ActiveModel {
        session_id: Set(row.session_id),
        visitor_id: Set(row.visitor_id),
        started_at: Set(row.started_at),
        last_activity: Set(row.last_activity),
        utm_source: Set(row.utm_source),
        utm_medium: Set(row.utm_medium),
        utm_campaign: Set(row.utm_campaign),
        referrer: Set(row.referrer),
        landing_path: Set(row.landing_path),
        device_type: Set(row.device_type),
        user_agent: Set(row.user_agent),
        city: Set(row.geo.city),
        country: Set(row.geo.country),
        country_code: Set(row.geo.country_code),
        ip_address: Set(row.geo.ip_address),
        ..Default::default()
    }
}

/// 只写入 patch 中存在的字段；geo 字段逐个合并，空值不覆盖
fn build_update(session_id: &str, patch: &SessionPatch) -> UpdateMany<visitor_session::Entity> {
    let mut update = visitor_session::Entity::update_many()
        .filter(visitor_session::Column::SessionId.eq(session_id));

    if let Some(last_activity) = patch.last_activity {
        update = update.col_expr(
            visitor_session::Column::LastActivity,
            Expr::value(last_activity),
        );
    }

    if let Some(ref geo) = patch.geo {
        let fields = [
            (visitor_session::Column::City, &geo.city),
            (visitor_session::Column::Country, &geo.country),
            (visitor_session::Column::CountryCode, &geo.country_code),
            (visitor_session::Column::IpAddress, &geo.ip_address),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                update = update.col_expr(column, Expr::value(value.clone()));
            }
        }
    }

    update
}

impl SeaOrmBackend {
    pub(super) async fn insert_session_row(&self, row: SessionRow) -> Result<()> {
        let db = &self.db;
        let session_id = row.session_id.clone();
        let model = row_to_active_model(row);

        retry::with_retry(
            &format!("insert_session({})", session_id),
            self.retry_policy,
            || {
                let model = model.clone();
                async move { visitor_session::Entity::insert(model).exec(db).await }
            },
        )
        .await
        .map_err(|e| {
            VisitrackError::database_operation(format!("插入会话 {} 失败: {}", session_id, e))
        })?;

        trace!("Session row inserted: {}", session_id);
        Ok(())
    }

    pub(super) async fn update_session_row(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let db = &self.db;
        let result = retry::with_retry(
            &format!("update_session({})", session_id),
            self.retry_policy,
            || {
                let update = build_update(session_id, &patch);
                async move { update.exec(db).await }
            },
        )
        .await
        .map_err(|e| {
            VisitrackError::database_operation(format!("更新会话 {} 失败: {}", session_id, e))
        })?;

        // 插入可能因瞬时故障丢失，不视为错误
        if result.rows_affected == 0 {
            debug!("update_session matched no row for {}", session_id);
        }
        Ok(())
    }

    /// Look up a session row by its session id
    pub async fn find_session(&self, session_id: &str) -> Result<Option<visitor_session::Model>> {
        visitor_session::Entity::find()
            .filter(visitor_session::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(|e| VisitrackError::database_operation(format!("查询会话失败: {}", e)))
    }

    /// All session rows of a visitor, oldest first
    pub async fn sessions_for_visitor(
        &self,
        visitor_id: &str,
    ) -> Result<Vec<visitor_session::Model>> {
        use sea_orm::QueryOrder;

        visitor_session::Entity::find()
            .filter(visitor_session::Column::VisitorId.eq(visitor_id))
            .order_by_asc(visitor_session::Column::StartedAt)
            .all(&self.db)
            .await
            .map_err(|e| VisitrackError::database_operation(format!("查询访客会话失败: {}", e)))
    }
}
