//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use visitrack::errors::{Result, VisitrackError};
use visitrack::services::{GeoInfo, GeoLookup};
use visitrack::storage::{RemoteBackend, SessionPatch, SessionRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadCall {
    pub referrer_id: String,
    pub phone: String,
    pub name: String,
}

/// In-memory backend that records every call
#[derive(Default)]
pub struct MockBackend {
    pub inserts: Mutex<Vec<SessionRow>>,
    pub updates: Mutex<Vec<(String, SessionPatch)>>,
    pub leads: Mutex<Vec<LeadCall>>,
    pub display_name: Option<String>,
    pub fail_insert: bool,
    pub fail_lead: bool,
    pub insert_delay: Option<Duration>,
    /// 按到达顺序记录的写操作
    pub log: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn failing_leads(mut self) -> Self {
        self.fail_lead = true;
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    pub fn with_slow_inserts(mut self, millis: u64) -> Self {
        self.insert_delay = Some(Duration::from_millis(millis));
        self
    }

    pub fn write_log(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.lock().len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn lead_calls(&self) -> Vec<LeadCall> {
        self.leads.lock().clone()
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn insert_session(&self, row: SessionRow) -> Result<()> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_insert {
            return Err(VisitrackError::network("backend unreachable"));
        }
        self.log.lock().push("insert");
        self.inserts.lock().push(row);
        Ok(())
    }

    async fn update_session(&self, session_id: &str, patch: SessionPatch) -> Result<()> {
        self.log.lock().push("update");
        self.updates.lock().push((session_id.to_string(), patch));
        Ok(())
    }

    async fn fetch_display_name(&self, _profile_id: &str) -> Result<Option<String>> {
        Ok(self.display_name.clone())
    }

    async fn record_lead(&self, referrer_id: &str, phone: &str, name: &str) -> Result<()> {
        if self.fail_lead {
            return Err(VisitrackError::network("backend unreachable"));
        }
        self.leads.lock().push(LeadCall {
            referrer_id: referrer_id.to_string(),
            phone: phone.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

/// Geo lookup returning a fixed answer
pub struct StaticGeo(pub GeoInfo);

#[async_trait]
impl GeoLookup for StaticGeo {
    async fn fetch_geo(&self, client_ip: Option<&str>) -> GeoInfo {
        if client_ip.is_none() {
            return GeoInfo::default();
        }
        self.0.clone()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

pub fn lahore() -> GeoInfo {
    GeoInfo {
        city: Some("Lahore".into()),
        country: Some("Pakistan".into()),
        country_code: Some("PK".into()),
        ip_address: Some("39.45.1.2".into()),
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 10, 8, 30, 0).unwrap()
}

pub fn mock_backend() -> Arc<MockBackend> {
    Arc::new(MockBackend::new())
}

/// Wait until fire-and-forget effects have reached the mock
pub async fn wait_for<F>(mut done: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
