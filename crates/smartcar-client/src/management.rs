//! Account-level API operations: user, vehicle listing, compatibility and
//! connection management.
//!
//! These endpoints are not scoped to a single vehicle. User and vehicle
//! listing authenticate with an access token; compatibility uses the
//! application's client credentials; connection management talks to the
//! management origin with the application management token.

use reqwest::Method;

use smartcar_core::{build_response, StructuredValue};

use crate::auth::ConnectMode;
use crate::client::{stringify_flags, ApiClient, AuthCredential, Paging};
use crate::config;
use crate::error::{Result, SmartcarError};

/// Options shared by the account-level calls.
#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub version: String,
    /// Origin override; defaults per endpoint (data vs. management API).
    pub origin: Option<String>,
    pub timeout: std::time::Duration,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            version: config::DEFAULT_API_VERSION.to_string(),
            origin: None,
            timeout: config::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Options for [`get_compatibility`].
#[derive(Debug, Clone, Default)]
pub struct CompatibilityOptions {
    /// Client id; falls back to the `SMARTCAR_CLIENT_ID` environment
    /// variable when absent.
    pub client_id: Option<String>,
    /// Client secret; falls back to `SMARTCAR_CLIENT_SECRET`.
    pub client_secret: Option<String>,
    pub flags: Vec<(String, String)>,
    pub mode: Option<ConnectMode>,
    /// Required when checking a real VIN in test mode; forces `mode=test`.
    pub test_mode_compatibility_level: Option<String>,
    pub api: ApiOptions,
}

/// Filter for connection listing and deletion. Deletion requires exactly
/// one of the two fields.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFilter {
    pub user_id: Option<String>,
    pub vehicle_id: Option<String>,
}

/// Cursor-based paging used by the connections endpoint.
#[derive(Debug, Clone, Default)]
pub struct CursorPaging {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// Fetch the id of the user the access token belongs to.
pub async fn get_user(token: &str, options: ApiOptions) -> Result<StructuredValue> {
    let api = data_api(&options)?;
    let auth = AuthCredential::Bearer(token.to_string());
    let (body, headers) = api
        .send(Method::GET, "/user", &[], None, &auth, None, &[])
        .await?;
    Ok(build_response(body, &headers))
}

/// Paged list of all vehicles connected to the application for the
/// current authorized user.
pub async fn get_vehicles(
    token: &str,
    paging: Option<Paging>,
    options: ApiOptions,
) -> Result<StructuredValue> {
    let api = data_api(&options)?;
    let auth = AuthCredential::Bearer(token.to_string());
    let mut query = Vec::new();
    if let Some(paging) = paging {
        paging.append_to(&mut query);
    }
    let (body, headers) = api
        .send(Method::GET, "/vehicles", &query, None, &auth, None, &[])
        .await?;
    Ok(build_response(body, &headers))
}

/// Check whether a VIN is compatible with the requested permission scope.
pub async fn get_compatibility(
    vin: &str,
    scope: &[&str],
    country: &str,
    options: CompatibilityOptions,
) -> Result<StructuredValue> {
    if vin.is_empty() {
        return Err(SmartcarError::InvalidParameterValue(
            "vin is a required field".into(),
        ));
    }
    if scope.is_empty() {
        return Err(SmartcarError::InvalidParameterValue(
            "scope is a required field".into(),
        ));
    }

    let client_id = resolve_credential(options.client_id, "SMARTCAR_CLIENT_ID")?;
    let client_secret = resolve_credential(options.client_secret, "SMARTCAR_CLIENT_SECRET")?;
    let auth = AuthCredential::basic_pair(&client_id, &client_secret);

    let mut query = vec![
        ("vin".to_string(), vin.to_string()),
        ("scope".to_string(), scope.join(" ")),
        ("country".to_string(), country.to_string()),
    ];
    if let Some(flags) = stringify_flags(&options.flags) {
        query.push(("flags".to_string(), flags));
    }
    let mut mode = options.mode;
    if let Some(level) = &options.test_mode_compatibility_level {
        query.push(("test_mode_compatibility_level".to_string(), level.clone()));
        mode = Some(ConnectMode::Test);
    }
    if let Some(mode) = mode {
        query.push(("mode".to_string(), mode.as_str().to_string()));
    }

    let api = data_api(&options.api)?;
    let (body, headers) = api
        .send(Method::GET, "/compatibility", &query, None, &auth, None, &[])
        .await?;
    Ok(build_response(body, &headers))
}

/// Paged list of all vehicle connections connected to the application.
pub async fn get_connections(
    amt: &str,
    filter: ConnectionFilter,
    paging: CursorPaging,
    options: ApiOptions,
) -> Result<StructuredValue> {
    let api = management_api(&options)?;
    let auth = AuthCredential::basic_pair(config::MANAGEMENT_AUTH_USER, amt);

    let mut query = Vec::new();
    if let Some(user_id) = filter.user_id {
        query.push(("user_id".to_string(), user_id));
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query.push(("vehicle_id".to_string(), vehicle_id));
    }
    query.push(("limit".to_string(), paging.limit.unwrap_or(10).to_string()));
    if let Some(cursor) = paging.cursor {
        query.push(("cursor".to_string(), cursor));
    }

    let (body, headers) = api
        .send(
            Method::GET,
            "/management/connections",
            &query,
            None,
            &auth,
            None,
            &[],
        )
        .await?;
    Ok(build_response(body, &headers))
}

/// Delete connections by user or by vehicle. The filter must carry exactly
/// one of the two ids.
pub async fn delete_connections(
    amt: &str,
    filter: ConnectionFilter,
    options: ApiOptions,
) -> Result<StructuredValue> {
    let query = match (&filter.user_id, &filter.vehicle_id) {
        (Some(_), Some(_)) => {
            return Err(SmartcarError::InvalidParameterValue(
                "Filter can contain EITHER user_id OR vehicle_id, not both.".into(),
            ))
        }
        (None, None) => {
            return Err(SmartcarError::InvalidParameterValue(
                "Filter needs one of user_id OR vehicle_id.".into(),
            ))
        }
        (Some(user_id), None) => vec![("user_id".to_string(), user_id.clone())],
        (None, Some(vehicle_id)) => vec![("vehicle_id".to_string(), vehicle_id.clone())],
    };

    let api = management_api(&options)?;
    let auth = AuthCredential::basic_pair(config::MANAGEMENT_AUTH_USER, amt);
    let (body, headers) = api
        .send(
            Method::DELETE,
            "/management/connections",
            &query,
            None,
            &auth,
            None,
            &[],
        )
        .await?;
    Ok(build_response(body, &headers))
}

fn data_api(options: &ApiOptions) -> Result<ApiClient> {
    let origin = options.origin.clone().unwrap_or_else(config::api_origin);
    ApiClient::new(&origin, options.version.clone(), options.timeout)
}

fn management_api(options: &ApiOptions) -> Result<ApiClient> {
    let origin = options
        .origin
        .clone()
        .unwrap_or_else(config::management_api_origin);
    ApiClient::new(&origin, options.version.clone(), options.timeout)
}

fn resolve_credential(explicit: Option<String>, env_name: &str) -> Result<String> {
    match explicit {
        Some(value) => Ok(value),
        None => config::get_config(env_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_connections_rejects_both_filters() {
        let filter = ConnectionFilter {
            user_id: Some("user".into()),
            vehicle_id: Some("vehicle".into()),
        };
        let result = delete_connections("amt", filter, ApiOptions::default()).await;
        match result {
            Err(SmartcarError::InvalidParameterValue(message)) => {
                assert_eq!(message, "Filter can contain EITHER user_id OR vehicle_id, not both.")
            }
            other => panic!("expected InvalidParameterValue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_connections_rejects_empty_filter() {
        let result =
            delete_connections("amt", ConnectionFilter::default(), ApiOptions::default()).await;
        match result {
            Err(SmartcarError::InvalidParameterValue(message)) => {
                assert_eq!(message, "Filter needs one of user_id OR vehicle_id.")
            }
            other => panic!("expected InvalidParameterValue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn compatibility_requires_vin_and_scope() {
        let result =
            get_compatibility("", &["read_odometer"], "US", CompatibilityOptions::default()).await;
        assert!(matches!(result, Err(SmartcarError::InvalidParameterValue(_))));

        let result = get_compatibility("vin", &[], "US", CompatibilityOptions::default()).await;
        assert!(matches!(result, Err(SmartcarError::InvalidParameterValue(_))));
    }
}
