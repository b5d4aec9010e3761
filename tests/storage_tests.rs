//! SeaORM backend tests against a temporary SQLite database

mod common;

use chrono::TimeDelta;
use tempfile::TempDir;

use visitrack::config::DatabaseConfig;
use visitrack::identity::SessionRecord;
use visitrack::services::GeoInfo;
use visitrack::session::{UrlParams, build_session_row};
use visitrack::storage::{RemoteBackend, SeaOrmBackend, SessionPatch, SessionRow};

use common::{base_time, lahore};

async fn create_backend() -> (SeaOrmBackend, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("visitrack_test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    let backend = SeaOrmBackend::new(&url, "sqlite", &DatabaseConfig::default())
        .await
        .expect("Failed to create SQLite backend");
    (backend, temp_dir)
}

fn sample_row(session_id: &str, visitor_id: &str) -> SessionRow {
    let record = SessionRecord {
        session_id: session_id.to_string(),
        last_activity: base_time(),
        utm_source: Some("facebook".into()),
    };
    let params = UrlParams {
        utm_source: Some("facebook".into()),
        utm_medium: Some("cpc".into()),
        utm_campaign: Some("spring".into()),
        path: Some("/collections/new".into()),
        ..Default::default()
    };
    build_session_row(
        visitor_id,
        &record,
        &params,
        Some("https://l.facebook.com/"),
        Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148"),
    )
}

#[test]
fn test_url_derived_columns_are_unbounded_text() {
    use migration::entities::visitor_session::Column;
    use sea_orm::{ColumnTrait, ColumnType};

    for column in [
        Column::UtmSource,
        Column::UtmMedium,
        Column::UtmCampaign,
        Column::Referrer,
        Column::LandingPath,
        Column::UserAgent,
    ] {
        assert_eq!(
            column.def().get_column_type(),
            &ColumnType::Text,
            "{:?} must not be length-limited",
            column
        );
    }
}

#[tokio::test]
async fn test_long_campaign_values_are_stored_intact() {
    let (backend, _dir) = create_backend().await;
    let long_source = "x".repeat(300);
    let long_campaign = format!("eid_{}", "sale-".repeat(80));

    let mut row = sample_row("s-long", "v-1");
    row.utm_source = Some(long_source.clone());
    row.utm_campaign = Some(long_campaign.clone());
    backend.insert_session(row).await.unwrap();

    let stored = backend.find_session("s-long").await.unwrap().unwrap();
    assert_eq!(stored.utm_source, Some(long_source));
    assert_eq!(stored.utm_campaign, Some(long_campaign));
}

#[tokio::test]
async fn test_empty_url_is_rejected() {
    let result = SeaOrmBackend::new("", "sqlite", &DatabaseConfig::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_insert_and_find_session() {
    let (backend, _dir) = create_backend().await;
    assert_eq!(backend.backend_name(), "sqlite");

    backend
        .insert_session(sample_row("s-1", "v-1"))
        .await
        .unwrap();

    let stored = backend.find_session("s-1").await.unwrap().unwrap();
    assert_eq!(stored.visitor_id, "v-1");
    assert_eq!(stored.utm_source.as_deref(), Some("facebook"));
    assert_eq!(stored.utm_medium.as_deref(), Some("cpc"));
    assert_eq!(stored.utm_campaign.as_deref(), Some("spring"));
    assert_eq!(stored.referrer.as_deref(), Some("https://l.facebook.com/"));
    assert_eq!(stored.landing_path.as_deref(), Some("/collections/new"));
    assert_eq!(stored.device_type, "mobile");
    assert_eq!(stored.started_at, base_time());
    assert_eq!(stored.last_activity, base_time());
    assert!(stored.city.is_none());

    assert!(backend.find_session("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_heartbeat_moves_last_activity_only() {
    let (backend, _dir) = create_backend().await;
    backend
        .insert_session(sample_row("s-1", "v-1"))
        .await
        .unwrap();

    let later = base_time() + TimeDelta::minutes(12);
    backend
        .update_session("s-1", SessionPatch::heartbeat(later))
        .await
        .unwrap();

    let stored = backend.find_session("s-1").await.unwrap().unwrap();
    assert_eq!(stored.last_activity, later);
    assert_eq!(stored.started_at, base_time());
    assert_eq!(stored.utm_source.as_deref(), Some("facebook"));
}

#[tokio::test]
async fn test_geo_patch_merges_present_fields() {
    let (backend, _dir) = create_backend().await;
    backend
        .insert_session(sample_row("s-1", "v-1"))
        .await
        .unwrap();

    backend
        .update_session("s-1", SessionPatch::geo(lahore()))
        .await
        .unwrap();

    // 仅 country 的补丁不应清空已有字段
    let partial = GeoInfo {
        country: Some("Pakistan".into()),
        ..Default::default()
    };
    backend
        .update_session("s-1", SessionPatch::geo(partial))
        .await
        .unwrap();

    let stored = backend.find_session("s-1").await.unwrap().unwrap();
    assert_eq!(stored.city.as_deref(), Some("Lahore"));
    assert_eq!(stored.country.as_deref(), Some("Pakistan"));
    assert_eq!(stored.country_code.as_deref(), Some("PK"));
    assert_eq!(stored.ip_address.as_deref(), Some("39.45.1.2"));
    assert_eq!(stored.last_activity, base_time());
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_an_error() {
    let (backend, _dir) = create_backend().await;
    let result = backend
        .update_session("never-inserted", SessionPatch::heartbeat(base_time()))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_duplicate_session_id_fails() {
    let (backend, _dir) = create_backend().await;
    backend
        .insert_session(sample_row("s-1", "v-1"))
        .await
        .unwrap();
    assert!(
        backend
            .insert_session(sample_row("s-1", "v-2"))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_sessions_for_visitor_in_start_order() {
    let (backend, _dir) = create_backend().await;

    let mut second = sample_row("s-2", "v-1");
    second.started_at = base_time() + TimeDelta::hours(2);
    second.last_activity = second.started_at;

    backend.insert_session(second).await.unwrap();
    backend
        .insert_session(sample_row("s-1", "v-1"))
        .await
        .unwrap();
    backend
        .insert_session(sample_row("s-x", "someone-else"))
        .await
        .unwrap();

    let sessions = backend.sessions_for_visitor("v-1").await.unwrap();
    let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["s-1", "s-2"]);
}

#[tokio::test]
async fn test_record_lead_assigns_new_status() {
    let (backend, _dir) = create_backend().await;

    backend
        .record_lead("ref-42", "+923001234567", "Ayesha")
        .await
        .unwrap();

    let leads = backend.leads_for_referrer("ref-42").await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].name, "Ayesha");
    assert_eq!(leads[0].phone, "+923001234567");
    assert_eq!(leads[0].status, "new");

    assert!(backend.leads_for_referrer("ref-7").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_display_name_lookup() {
    let (backend, _dir) = create_backend().await;

    assert_eq!(backend.fetch_display_name("ref-42").await.unwrap(), None);

    backend.upsert_profile("ref-42", Some("Ayesha")).await.unwrap();
    assert_eq!(
        backend.fetch_display_name("ref-42").await.unwrap().as_deref(),
        Some("Ayesha")
    );

    backend.upsert_profile("ref-42", Some("Ayesha K.")).await.unwrap();
    assert_eq!(
        backend.fetch_display_name("ref-42").await.unwrap().as_deref(),
        Some("Ayesha K.")
    );

    // 空白名称按无名称处理
    backend.upsert_profile("ref-9", Some("   ")).await.unwrap();
    assert_eq!(backend.fetch_display_name("ref-9").await.unwrap(), None);
}
