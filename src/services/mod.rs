//! Outbound services used by the engine

pub mod geoip;

pub use geoip::{ExternalApiGeo, GeoInfo, GeoIpProvider, GeoLookup, NoopGeo};
