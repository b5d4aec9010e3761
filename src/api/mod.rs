//! HTTP surface of the engine
//!
//! Storefront pages call these endpoints; the visitor identity and the
//! handshake marker travel as cookies exactly as they would in a browser.

pub mod error_code;
pub mod helpers;
pub mod services;
pub mod state;
pub mod types;

pub use error_code::ErrorCode;
pub use services::configure_routes;
pub use state::AppState;
pub use types::ApiResponse;
