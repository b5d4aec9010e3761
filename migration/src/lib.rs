pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261019_000001_visitor_sessions;
mod m20261019_000002_referral_leads;
mod m20261019_000003_profiles;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_visitor_sessions::Migration),
            Box::new(m20261019_000002_referral_leads::Migration),
            Box::new(m20261019_000003_profiles::Migration),
        ]
    }
}
