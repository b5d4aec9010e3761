//! Referral leads and referrer profiles

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use tracing::info;

use super::SeaOrmBackend;
use super::retry;
use crate::errors::{Result, VisitrackError};

use migration::entities::{profile, referral_lead};

/// Status assigned to freshly captured leads
pub const LEAD_STATUS_NEW: &str = "new";

impl SeaOrmBackend {
    pub(super) async fn insert_lead(&self, referrer_id: &str, phone: &str, name: &str) -> Result<()> {
        let db = &self.db;
        let model = referral_lead::ActiveModel {
            referrer_id: Set(referrer_id.to_string()),
            name: Set(name.to_string()),
            phone: Set(phone.to_string()),
            status: Set(LEAD_STATUS_NEW.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        retry::with_retry(
            &format!("record_lead({})", referrer_id),
            self.retry_policy,
            || {
                let model = model.clone();
                async move { referral_lead::Entity::insert(model).exec(db).await }
            },
        )
        .await
        .map_err(|e| VisitrackError::database_operation(format!("保存推荐线索失败: {}", e)))?;

        info!("Referral lead recorded for referrer {}", referrer_id);
        Ok(())
    }

    pub(super) async fn find_display_name(&self, profile_id: &str) -> Result<Option<String>> {
        let db = &self.db;
        let id = profile_id.to_string();

        let found = retry::with_retry("fetch_display_name", self.retry_policy, || {
            let id = id.clone();
            async move { profile::Entity::find_by_id(id).one(db).await }
        })
        .await
        .map_err(|e| VisitrackError::database_operation(format!("查询推荐人资料失败: {}", e)))?;

        Ok(found
            .and_then(|p| p.display_name)
            .filter(|name| !name.trim().is_empty()))
    }

    /// Insert or replace a profile's display name
    ///
    /// Profiles are owned by the storefront; this exists for seeding and
    /// operational fixes.
    pub async fn upsert_profile(&self, profile_id: &str, display_name: Option<&str>) -> Result<()> {
        let model = profile::ActiveModel {
            id: Set(profile_id.to_string()),
            display_name: Set(display_name.map(String::from)),
        };

        profile::Entity::insert(model)
            .on_conflict(
                OnConflict::column(profile::Column::Id)
                    .update_column(profile::Column::DisplayName)
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| VisitrackError::database_operation(format!("写入资料失败: {}", e)))?;
        Ok(())
    }

    /// Leads captured for a referrer, in insertion order
    pub async fn leads_for_referrer(&self, referrer_id: &str) -> Result<Vec<referral_lead::Model>> {
        use sea_orm::QueryOrder;

        referral_lead::Entity::find()
            .filter(referral_lead::Column::ReferrerId.eq(referrer_id))
            .order_by_asc(referral_lead::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| VisitrackError::database_operation(format!("查询推荐线索失败: {}", e)))
    }
}
