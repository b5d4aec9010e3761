//! Visitor session entity, one row per session boundary

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "visitor_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub session_id: String,
    pub visitor_id: String,
    pub started_at: DateTimeUtc,
    pub last_activity: DateTimeUtc,
    #[sea_orm(column_type = "Text", nullable)]
    pub utm_source: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub utm_medium: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub utm_campaign: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub referrer: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub landing_path: Option<String>,
    /// "mobile" or "desktop"
    pub device_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
