//! visitrack - visitor session and referral attribution engine
//!
//! Decides on every page view whether a visitor continues a session, starts
//! a new one, or arrives through a new campaign; persists that decision in a
//! cookie and as a backend session row; and turns referral clicks into
//! captured leads at most once per browser.
//!
//! # Architecture
//! - `identity`: durable visitor id and recent session history (cookie / memory stores)
//! - `session`: boundary detector, attribution parsing, backend sync client
//! - `services`: best-effort GeoIP enrichment
//! - `referral`: once-per-visitor referral handshake state machine
//! - `lifecycle`: per-route-change orchestration
//! - `storage`: `RemoteBackend` trait and SeaORM implementation
//! - `api`: actix-web HTTP surface
//! - `config`, `system`, `runtime`: configuration, logging, server startup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod identity;
pub mod lifecycle;
pub mod referral;
pub mod runtime;
pub mod services;
pub mod session;
pub mod storage;
pub mod system;
pub mod utils;
