//! Endpoint constants and environment-backed configuration.

use std::time::Duration;

use crate::error::{Result, SmartcarError};

/// Default origin for the vehicle data API.
pub const API_ORIGIN: &str = "https://api.smartcar.com";
/// Default origin for application management endpoints.
pub const MANAGEMENT_API_ORIGIN: &str = "https://management.smartcar.com";
/// Origin serving the Smartcar Connect authorization flow.
pub const CONNECT_ORIGIN: &str = "https://connect.smartcar.com";
/// Origin serving OAuth token exchange.
pub const AUTH_ORIGIN: &str = "https://auth.smartcar.com";

/// API version used when a client does not override it.
pub const DEFAULT_API_VERSION: &str = "2.0";
/// Time to wait for a response before the transport gives up.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(310);
/// Username paired with an application management token for Basic auth.
pub const MANAGEMENT_AUTH_USER: &str = "default";

/// Read a required environment variable.
///
/// When `MODE=test` the lookup is prefixed with `INTEGRATION_`, so test
/// credentials live next to production ones without clobbering them.
pub fn get_config(name: &str) -> Result<String> {
    let resolved = if std::env::var("MODE").as_deref() == Ok("test") {
        format!("INTEGRATION_{name}")
    } else {
        name.to_string()
    };
    std::env::var(&resolved).map_err(|_| SmartcarError::ConfigNotFound(resolved))
}

/// The vehicle API origin, honoring the `SMARTCAR_API_ORIGIN` override.
pub fn api_origin() -> String {
    std::env::var("SMARTCAR_API_ORIGIN").unwrap_or_else(|_| API_ORIGIN.to_string())
}

/// The management API origin, honoring `SMARTCAR_MANAGEMENT_API_ORIGIN`.
pub fn management_api_origin() -> String {
    std::env::var("SMARTCAR_MANAGEMENT_API_ORIGIN")
        .unwrap_or_else(|_| MANAGEMENT_API_ORIGIN.to_string())
}
