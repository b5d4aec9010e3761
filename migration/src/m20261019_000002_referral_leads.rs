//! 推荐线索表迁移
//!
//! referral_leads 不设唯一约束：同一浏览器"只提交一次"由客户端标记保证，
//! 服务端对重复提交照单全收。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReferralLeads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralLeads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReferralLeads::ReferrerId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReferralLeads::Name).string_len(255).not_null())
                    .col(ColumnDef::new(ReferralLeads::Phone).string_len(64).not_null())
                    .col(
                        ColumnDef::new(ReferralLeads::Status)
                            .string_len(32)
                            .not_null()
                            .default("new"),
                    )
                    .col(
                        ColumnDef::new(ReferralLeads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referral_leads_referrer_id")
                    .table(ReferralLeads::Table)
                    .col(ReferralLeads::ReferrerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_referral_leads_referrer_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ReferralLeads::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ReferralLeads {
    #[sea_orm(iden = "referral_leads")]
    Table,
    Id,
    ReferrerId,
    Name,
    Phone,
    Status,
    CreatedAt,
}
