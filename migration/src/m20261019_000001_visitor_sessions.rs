//! 访客会话表迁移
//!
//! 创建 visitor_sessions 表，每个会话边界一行：
//! - 标识 (session_id, visitor_id)
//! - 时间 (started_at, last_activity)
//! - 归因 (utm_source, utm_medium, utm_campaign, referrer, landing_path)
//! - 设备 (device_type, user_agent)
//! - 地理位置 (city, country, country_code, ip_address)，异步补写

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VisitorSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitorSessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::SessionId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::VisitorId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::LastActivity)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // utm 取自 URL，长度不受控
                    .col(ColumnDef::new(VisitorSessions::UtmSource).text().null())
                    .col(ColumnDef::new(VisitorSessions::UtmMedium).text().null())
                    .col(ColumnDef::new(VisitorSessions::UtmCampaign).text().null())
                    .col(ColumnDef::new(VisitorSessions::Referrer).text().null())
                    .col(ColumnDef::new(VisitorSessions::LandingPath).text().null())
                    .col(
                        ColumnDef::new(VisitorSessions::DeviceType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VisitorSessions::UserAgent).text().null())
                    .col(ColumnDef::new(VisitorSessions::City).string_len(255).null())
                    .col(ColumnDef::new(VisitorSessions::Country).string_len(255).null())
                    .col(ColumnDef::new(VisitorSessions::CountryCode).string_len(2).null())
                    .col(ColumnDef::new(VisitorSessions::IpAddress).string_len(45).null())
                    .to_owned(),
            )
            .await?;

        // session_id 唯一索引（心跳和 geo 补写都按 session_id 更新）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visitor_sessions_session_id")
                    .table(VisitorSessions::Table)
                    .col(VisitorSessions::SessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visitor_sessions_visitor_time")
                    .table(VisitorSessions::Table)
                    .col(VisitorSessions::VisitorId)
                    .col(VisitorSessions::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_visitor_sessions_visitor_time")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_visitor_sessions_session_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(VisitorSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VisitorSessions {
    #[sea_orm(iden = "visitor_sessions")]
    Table,
    Id,
    SessionId,
    VisitorId,
    StartedAt,
    LastActivity,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    Referrer,
    LandingPath,
    DeviceType,
    UserAgent,
    City,
    Country,
    CountryCode,
    IpAddress,
}
