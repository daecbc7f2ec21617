//! Smartcar HTTP client implementation.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use smartcar_core::{
    apply_aliases, build_meta, build_response, classify, normalize, AliasTable, Headers, Record,
    SmartcarApiError, StructuredValue, UNIT_SYSTEM_HEADER,
};

use crate::config;
use crate::error::{Result, SmartcarError};
use crate::registry::{self, ResourceSpec, Verb};

/// Unit system for numeric values in response bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

/// Offset-based paging options for list endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paging {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Paging {
    pub(crate) fn append_to(&self, query: &mut Vec<(String, String)>) {
        if let Some(limit) = self.limit {
            query.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".into(), offset.to_string()));
        }
    }
}

/// Per-call credential. Every request names its credential explicitly, so
/// a call that needs a different token (webhook unsubscribe uses the
/// application management token) passes one instead of mutating the client.
#[derive(Debug, Clone)]
pub(crate) enum AuthCredential {
    Bearer(String),
    /// Pre-encoded `base64(user:secret)` payload.
    Basic(String),
}

impl AuthCredential {
    pub(crate) fn basic_pair(user: &str, secret: &str) -> Self {
        use base64::Engine as _;
        AuthCredential::Basic(
            base64::engine::general_purpose::STANDARD.encode(format!("{user}:{secret}")),
        )
    }

    fn header_value(&self) -> String {
        match self {
            AuthCredential::Bearer(token) => format!("Bearer {token}"),
            AuthCredential::Basic(encoded) => format!("Basic {encoded}"),
        }
    }
}

/// Serialize feature flags the way the API expects them: space-joined
/// `key:value` pairs inside a single `flags` query parameter.
pub(crate) fn stringify_flags(flags: &[(String, String)]) -> Option<String> {
    if flags.is_empty() {
        return None;
    }
    Some(
        flags
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

// =============================================================================
// Request plumbing
// =============================================================================

/// Shared request plumbing for one API origin + version.
#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    http: Client,
    origin: Url,
    version: String,
}

impl ApiClient {
    pub(crate) fn new(origin: &str, version: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let origin = Url::parse(origin)?;
        Ok(Self {
            http,
            origin,
            version: version.into(),
        })
    }

    fn request_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self.origin.join(&format!("/v{}{}", self.version, path))?;
        // An empty query map must not leave a dangling `?` on the URL.
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(name, value)| (name.as_str(), value.as_str())));
        }
        Ok(url)
    }

    /// Issue one request and hand back the decoded body plus response
    /// headers. Any non-2xx response is classified and returned as
    /// [`SmartcarError::Api`] before the success path runs.
    #[instrument(skip(self, query, body, auth, extra_headers))]
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        auth: &AuthCredential,
        unit_system: Option<UnitSystem>,
        extra_headers: &[(String, String)],
    ) -> Result<(Value, Headers)> {
        let url = self.request_url(path, query)?;
        debug!("{} {}", method, url);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&auth.header_value())?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(unit_system) = unit_system {
            headers.insert(UNIT_SYSTEM_HEADER, HeaderValue::from_static(unit_system.as_str()));
        }
        // Caller-supplied headers override the defaults.
        for (name, value) in extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
                SmartcarError::InvalidParameterValue(format!("Invalid header name {name:?}: {source}"))
            })?;
            headers.insert(name, header_value(value)?);
        }

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let response_headers = convert_headers(response.headers());
        let text = response.text().await?;

        if let Some(error) = classify(status, &text, &response_headers) {
            return Err(error.into());
        }
        let body = decode_success_body(status, &text, &response_headers)?;
        Ok((body, response_headers))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|source| {
        SmartcarError::InvalidParameterValue(format!("Invalid header value: {source}"))
    })
}

fn convert_headers(map: &HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
        .collect()
}

fn decode_success_body(status: u16, text: &str, headers: &Headers) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|source| {
        SmartcarApiError::sdk(
            status,
            source.to_string(),
            headers.get(smartcar_core::REQUEST_ID_HEADER).map(str::to_string),
        )
        .into()
    })
}

// =============================================================================
// Vehicle facade
// =============================================================================

/// Options accepted by [`Vehicle::with_options`].
#[derive(Debug, Clone)]
pub struct VehicleOptions {
    pub unit_system: UnitSystem,
    pub version: String,
    /// Early-access feature flags, serialized as `key:value` pairs.
    pub flags: Vec<(String, String)>,
    /// API origin override; defaults to [`config::api_origin`].
    pub origin: Option<String>,
    pub timeout: Duration,
}

impl Default for VehicleOptions {
    fn default() -> Self {
        Self {
            unit_system: UnitSystem::default(),
            version: config::DEFAULT_API_VERSION.to_string(),
            flags: Vec::new(),
            origin: None,
            timeout: config::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

const SUBSCRIBE_ALIASES: &AliasTable = &[("webhookId", "webhook_id"), ("vehicleId", "vehicle_id")];

/// Client for a single vehicle granted to the application.
///
/// Holds no mutable state; clones share the underlying connection pool and
/// any number of calls may run concurrently against one instance.
#[derive(Debug, Clone)]
pub struct Vehicle {
    api: ApiClient,
    auth: AuthCredential,
    id: String,
    unit_system: UnitSystem,
    flags: Option<String>,
}

impl Vehicle {
    /// Create a client with default options (metric units, API v2.0).
    pub fn new(token: &str, id: &str) -> Result<Self> {
        Self::with_options(token, id, VehicleOptions::default())
    }

    pub fn with_options(token: &str, id: &str, options: VehicleOptions) -> Result<Self> {
        if token.is_empty() {
            return Err(SmartcarError::InvalidParameterValue(
                "Access token is a required field".into(),
            ));
        }
        if id.is_empty() {
            return Err(SmartcarError::InvalidParameterValue(
                "Vehicle id is a required field".into(),
            ));
        }
        let origin = options.origin.unwrap_or_else(config::api_origin);
        Ok(Self {
            api: ApiClient::new(&origin, options.version, options.timeout)?,
            auth: AuthCredential::Bearer(token.to_string()),
            id: id.to_string(),
            unit_system: options.unit_system,
            flags: stringify_flags(&options.flags),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn flags_query(&self) -> Vec<(String, String)> {
        match &self.flags {
            Some(flags) => vec![("flags".to_string(), flags.clone())],
            None => Vec::new(),
        }
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        extra_headers: &[(String, String)],
        auth_override: Option<&AuthCredential>,
    ) -> Result<(Value, Headers)> {
        self.api
            .send(
                method,
                path,
                query,
                body,
                auth_override.unwrap_or(&self.auth),
                Some(self.unit_system),
                extra_headers,
            )
            .await
    }

    // =========================================================================
    // Resource dispatch
    // =========================================================================

    /// Fetch or act on a resource by its logical registry name.
    ///
    /// Named wrappers below all route through here; the registry entry
    /// supplies the verb, path, fixed action body and alias table.
    pub async fn read_resource(&self, name: &str) -> Result<StructuredValue> {
        let spec = registry::lookup(name).ok_or_else(|| {
            SmartcarError::InvalidParameterValue(format!("Unknown resource: {name}"))
        })?;
        self.call_resource(spec).await
    }

    async fn call_resource(&self, spec: &ResourceSpec) -> Result<StructuredValue> {
        let path = registry::vehicle_path(&self.id, spec.path);
        let query = self.flags_query();
        let (body, headers) = match spec.verb {
            Verb::Get => {
                self.send(Method::GET, &path, &query, None, &[], None).await?
            }
            Verb::Post => {
                let action = spec.action.map(|action| json!({ "action": action }));
                self.send(Method::POST, &path, &query, action.as_ref(), &[], None)
                    .await?
            }
            Verb::Delete => {
                self.send(Method::DELETE, &path, &query, None, &[], None).await?
            }
        };
        Ok(apply_aliases(build_response(body, &headers), spec.aliases))
    }

    // =========================================================================
    // Data endpoints
    // =========================================================================

    /// Make, model, year and id of the vehicle.
    pub async fn attributes(&self) -> Result<StructuredValue> {
        self.read_resource("attributes").await
    }

    /// State of charge and remaining range of an electric or plug-in
    /// hybrid vehicle's battery.
    pub async fn battery(&self) -> Result<StructuredValue> {
        self.read_resource("battery").await
    }

    /// Capacity of the vehicle's battery.
    pub async fn battery_capacity(&self) -> Result<StructuredValue> {
        self.read_resource("battery_capacity").await
    }

    /// Current charge status.
    pub async fn charge(&self) -> Result<StructuredValue> {
        self.read_resource("charge").await
    }

    /// Configured charge limit, as a fraction between 0 and 1.
    pub async fn get_charge_limit(&self) -> Result<StructuredValue> {
        self.read_resource("charge_limit").await
    }

    /// Remaining life span of the engine oil.
    pub async fn engine_oil(&self) -> Result<StructuredValue> {
        self.read_resource("engine_oil").await
    }

    /// Status of the fuel remaining in the tank.
    pub async fn fuel(&self) -> Result<StructuredValue> {
        self.read_resource("fuel").await
    }

    /// Last known location in geographic coordinates.
    pub async fn location(&self) -> Result<StructuredValue> {
        self.read_resource("location").await
    }

    /// Last known odometer reading.
    pub async fn odometer(&self) -> Result<StructuredValue> {
        self.read_resource("odometer").await
    }

    /// Air pressure of each tire.
    pub async fn tire_pressure(&self) -> Result<StructuredValue> {
        self.read_resource("tire_pressure").await
    }

    /// Manufacturer identifier (VIN).
    pub async fn vin(&self) -> Result<StructuredValue> {
        self.read_resource("vin").await
    }

    /// Lock state of the vehicle and the open state of its doors, windows,
    /// storage units, sunroof and charging port where available.
    pub async fn lock_status(&self) -> Result<StructuredValue> {
        self.read_resource("lock_status").await
    }

    /// Overall status of vehicle subsystems.
    pub async fn diagnostic_system_status(&self) -> Result<StructuredValue> {
        self.read_resource("diagnostic_system_status").await
    }

    /// Active diagnostic trouble codes.
    pub async fn diagnostic_trouble_codes(&self) -> Result<StructuredValue> {
        self.read_resource("diagnostic_trouble_codes").await
    }

    /// Permissions the application has been granted for this vehicle.
    pub async fn permissions(&self, paging: Option<Paging>) -> Result<StructuredValue> {
        let mut query = self.flags_query();
        if let Some(paging) = paging {
            paging.append_to(&mut query);
        }
        let path = registry::vehicle_path(&self.id, "/permissions");
        let (body, headers) = self.send(Method::GET, &path, &query, None, &[], None).await?;
        Ok(build_response(body, &headers))
    }

    /// Service records for the vehicle, filtered to the given date range.
    /// When either bound is missing, the range defaults to the trailing
    /// 365 days.
    pub async fn service_history(
        &self,
        start_date: Option<chrono::NaiveDate>,
        end_date: Option<chrono::NaiveDate>,
    ) -> Result<StructuredValue> {
        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let end = Utc::now().date_naive();
                (end - chrono::Duration::days(365), end)
            }
        };
        let mut query = self.flags_query();
        query.push(("start_date".into(), start_date.to_string()));
        query.push(("end_date".into(), end_date.to_string()));
        let path = registry::vehicle_path(&self.id, "/service/history");
        let (body, headers) = self.send(Method::GET, &path, &query, None, &[], None).await?;
        Ok(build_response(body, &headers))
    }

    // =========================================================================
    // Control endpoints
    // =========================================================================

    /// Lock the vehicle.
    pub async fn lock(&self) -> Result<StructuredValue> {
        self.read_resource("lock").await
    }

    /// Unlock the vehicle.
    pub async fn unlock(&self) -> Result<StructuredValue> {
        self.read_resource("unlock").await
    }

    /// Start charging.
    pub async fn start_charge(&self) -> Result<StructuredValue> {
        self.read_resource("start_charge").await
    }

    /// Stop charging.
    pub async fn stop_charge(&self) -> Result<StructuredValue> {
        self.read_resource("stop_charge").await
    }

    /// Set the charge limit, a fraction between 0 and 1.
    pub async fn set_charge_limit(&self, limit: f64) -> Result<StructuredValue> {
        if !(0.0..=1.0).contains(&limit) {
            return Err(SmartcarError::InvalidParameterValue(format!(
                "Charge limit must be between 0 and 1, got {limit}"
            )));
        }
        let path = registry::vehicle_path(&self.id, "/charge/limit");
        let body = json!({ "limit": limit });
        let (body, headers) = self
            .send(Method::POST, &path, &self.flags_query(), Some(&body), &[], None)
            .await?;
        Ok(build_response(body, &headers))
    }

    /// Send coordinates to the vehicle's navigation system.
    pub async fn send_destination(&self, latitude: f64, longitude: f64) -> Result<StructuredValue> {
        let path = registry::vehicle_path(&self.id, "/navigation/destination");
        let body = json!({ "latitude": latitude, "longitude": longitude });
        let (body, headers) = self
            .send(Method::POST, &path, &self.flags_query(), Some(&body), &[], None)
            .await?;
        Ok(build_response(body, &headers))
    }

    /// Revoke the application's access to this vehicle.
    pub async fn disconnect(&self) -> Result<StructuredValue> {
        self.read_resource("disconnect").await
    }

    // =========================================================================
    // Webhook subscriptions
    // =========================================================================

    /// Subscribe the vehicle to a webhook.
    pub async fn subscribe(&self, webhook_id: &str) -> Result<StructuredValue> {
        let path = format!("/vehicles/{}/webhooks/{}", self.id, webhook_id);
        let (body, headers) = self
            .send(Method::POST, &path, &self.flags_query(), None, &[], None)
            .await?;
        Ok(apply_aliases(build_response(body, &headers), SUBSCRIBE_ALIASES))
    }

    /// Unsubscribe the vehicle from a webhook. This endpoint authenticates
    /// with the application management token instead of the vehicle access
    /// token; the credential is scoped to this one call.
    pub async fn unsubscribe(&self, amt: &str, webhook_id: &str) -> Result<StructuredValue> {
        let path = format!("/vehicles/{}/webhooks/{}", self.id, webhook_id);
        let amt_auth = AuthCredential::Bearer(amt.to_string());
        let (body, headers) = self
            .send(Method::DELETE, &path, &self.flags_query(), None, &[], Some(&amt_auth))
            .await?;
        Ok(build_response(body, &headers))
    }

    // =========================================================================
    // Escape hatch
    // =========================================================================

    /// General-purpose request against this vehicle, for brand-specific
    /// endpoints the named wrappers do not cover. Returns a `{body, meta}`
    /// envelope rather than merging `meta` into the body.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        extra_headers: &[(String, String)],
    ) -> Result<StructuredValue> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes()).map_err(|_| {
            SmartcarError::InvalidParameterValue(format!("Unsupported HTTP method: {method}"))
        })?;
        let full_path = format!("/vehicles/{}/{}", self.id, path.trim_start_matches('/'));
        let (raw, headers) = self
            .send(method, &full_path, &self.flags_query(), body.as_ref(), extra_headers, None)
            .await?;

        let mut envelope = Record::new();
        envelope.insert("body", normalize(raw));
        envelope.insert("meta", build_meta(&headers).to_value());
        Ok(StructuredValue::Record(envelope))
    }
}
