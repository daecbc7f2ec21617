//! OAuth2 authorization-code flow against Smartcar Connect.
//!
//! Builds the Connect authorization URL and exchanges codes and refresh
//! tokens at the auth origin. The token endpoint is a plain form POST with
//! Basic client credentials; its error responses go through the same
//! classifier as every other API response.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use smartcar_core::classify;

use crate::client::stringify_flags;
use crate::config;
use crate::error::{Result, SmartcarError};

/// Mode Smartcar Connect should be launched in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectMode {
    Test,
    #[default]
    Live,
    Simulated,
}

impl ConnectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectMode::Test => "test",
            ConnectMode::Live => "live",
            ConnectMode::Simulated => "simulated",
        }
    }
}

/// Options accepted by [`AuthClient::new`]. Credentials left as `None`
/// fall back to the `SMARTCAR_CLIENT_ID`, `SMARTCAR_CLIENT_SECRET` and
/// `SMARTCAR_REDIRECT_URI` environment variables.
#[derive(Debug, Clone)]
pub struct AuthClientOptions {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub mode: ConnectMode,
    /// Override for the Connect origin (authorization URL).
    pub connect_origin: Option<String>,
    /// Override for the auth origin (token endpoint).
    pub auth_origin: Option<String>,
    pub timeout: Duration,
}

impl Default for AuthClientOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            mode: ConnectMode::default(),
            connect_origin: None,
            auth_origin: None,
            timeout: config::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Behavior of the vehicle grant dialog shown to the user.
#[derive(Debug, Clone, Default)]
pub struct SingleSelect {
    /// Limit the user to selecting a single vehicle.
    pub enabled: bool,
    /// Only authorize the vehicle with this VIN; implies `enabled`.
    pub vin: Option<String>,
}

/// Options for [`AuthClient::authorization_url`].
#[derive(Debug, Clone, Default)]
pub struct AuthUrlOptions {
    /// Show the approval screen even when the user already consented to
    /// this exact scope.
    pub force_prompt: bool,
    /// Opaque state passed back to the redirect URI.
    pub state: Option<String>,
    /// Skip the brand selection screen for this make.
    pub make_bypass: Option<String>,
    pub single_select: Option<SingleSelect>,
    pub flags: Vec<(String, String)>,
}

/// A token set returned by code exchange or refresh.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expires_in: i64,
    /// Absolute expiry computed at exchange time.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    refresh_token: String,
    expires_in: i64,
}

/// Client for the two-phase Connect flow: build URL, exchange code,
/// periodically refresh.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    mode: ConnectMode,
    connect_origin: String,
    auth_origin: String,
    http: Client,
}

impl AuthClient {
    pub fn new(options: AuthClientOptions) -> Result<Self> {
        let client_id = resolve(options.client_id, "SMARTCAR_CLIENT_ID")?;
        let client_secret = resolve(options.client_secret, "SMARTCAR_CLIENT_SECRET")?;
        let redirect_uri = resolve(options.redirect_uri, "SMARTCAR_REDIRECT_URI")?;
        let http = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            mode: options.mode,
            connect_origin: options
                .connect_origin
                .unwrap_or_else(|| config::CONNECT_ORIGIN.to_string()),
            auth_origin: options
                .auth_origin
                .unwrap_or_else(|| config::AUTH_ORIGIN.to_string()),
            http,
        })
    }

    /// Build the Connect authorization URL for the given permission scope.
    pub fn authorization_url(&self, scope: &[&str], options: &AuthUrlOptions) -> Result<String> {
        let mut url = Url::parse(&self.connect_origin)?.join("/oauth/authorize")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.client_id);
            query.append_pair("redirect_uri", &self.redirect_uri);
            query.append_pair("mode", self.mode.as_str());
            query.append_pair(
                "approval_prompt",
                if options.force_prompt { "force" } else { "auto" },
            );
            query.append_pair("scope", &scope.join(" "));
            if let Some(state) = &options.state {
                query.append_pair("state", state);
            }
            if let Some(make) = &options.make_bypass {
                query.append_pair("make", make);
            }
            if let Some(single_select) = &options.single_select {
                match &single_select.vin {
                    Some(vin) => {
                        query.append_pair("single_select_vin", vin);
                        query.append_pair("single_select", "true");
                    }
                    None => {
                        query.append_pair("single_select", if single_select.enabled { "true" } else { "false" });
                    }
                }
            }
            if let Some(flags) = stringify_flags(&options.flags) {
                query.append_pair("flags", &flags);
            }
        }
        Ok(url.into())
    }

    /// Exchange the code returned by the Connect redirect for tokens.
    #[instrument(skip(self, code, flags))]
    pub async fn exchange_code(
        &self,
        code: &str,
        flags: &[(String, String)],
    ) -> Result<TokenSet> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
        ];
        self.token_request(&form, flags).await
    }

    /// Refresh an expired access token.
    #[instrument(skip(self, refresh_token, flags))]
    pub async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
        flags: &[(String, String)],
    ) -> Result<TokenSet> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&form, flags).await
    }

    /// Whether a token set's expiry has passed.
    pub fn is_expired(expires_at: DateTime<Utc>) -> bool {
        expires_at <= Utc::now()
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        flags: &[(String, String)],
    ) -> Result<TokenSet> {
        let mut url = Url::parse(&self.auth_origin)?.join("/oauth/token")?;
        if let Some(flags) = stringify_flags(flags) {
            url.query_pairs_mut().append_pair("flags", &flags);
        }
        debug!("POST {}", url);

        let exchanged_at = Utc::now();
        let response = self
            .http
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers: smartcar_core::Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
            .collect();
        let text = response.text().await?;
        if let Some(error) = classify(status, &text, &headers) {
            return Err(error.into());
        }

        let token: TokenResponse = serde_json::from_str(&text).map_err(|source| {
            SmartcarError::from(smartcar_core::SmartcarApiError::sdk(
                status,
                source.to_string(),
                None,
            ))
        })?;
        Ok(TokenSet {
            expires_at: exchanged_at + chrono::Duration::seconds(token.expires_in),
            access_token: token.access_token,
            token_type: token.token_type,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        })
    }
}

fn resolve(explicit: Option<String>, env_name: &str) -> Result<String> {
    match explicit {
        Some(value) => Ok(value),
        None => config::get_config(env_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AuthClient {
        AuthClient::new(AuthClientOptions {
            client_id: Some("client_id".into()),
            client_secret: Some("client_secret".into()),
            redirect_uri: Some("https://example.com/callback".into()),
            ..AuthClientOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn authorization_url_carries_required_parameters() {
        let url = client()
            .authorization_url(&["read_odometer", "read_vehicle_info"], &AuthUrlOptions::default())
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.origin().ascii_serialization(), config::CONNECT_ORIGIN);
        assert_eq!(parsed.path(), "/oauth/authorize");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        let get = |name: &str| {
            pairs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, value)| value.as_str())
        };
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("client_id"), Some("client_id"));
        assert_eq!(get("mode"), Some("live"));
        assert_eq!(get("approval_prompt"), Some("auto"));
        assert_eq!(get("scope"), Some("read_odometer read_vehicle_info"));
        assert_eq!(get("state"), None);
    }

    #[test]
    fn authorization_url_honors_options() {
        let options = AuthUrlOptions {
            force_prompt: true,
            state: Some("session-77".into()),
            make_bypass: Some("TESLA".into()),
            single_select: Some(SingleSelect {
                enabled: false,
                vin: Some("1234567890ABCDEFG".into()),
            }),
            flags: vec![("country".into(), "DE".into())],
        };
        let url = client().authorization_url(&["read_odometer"], &options).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let query: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        assert!(query.contains(&("approval_prompt".into(), "force".into())));
        assert!(query.contains(&("state".into(), "session-77".into())));
        assert!(query.contains(&("make".into(), "TESLA".into())));
        assert!(query.contains(&("single_select_vin".into(), "1234567890ABCDEFG".into())));
        assert!(query.contains(&("single_select".into(), "true".into())));
        assert!(query.contains(&("flags".into(), "country:DE".into())));
    }

    #[test]
    fn single_select_without_vin_uses_enabled_flag() {
        let options = AuthUrlOptions {
            single_select: Some(SingleSelect {
                enabled: true,
                vin: None,
            }),
            ..AuthUrlOptions::default()
        };
        let url = client().authorization_url(&["read_odometer"], &options).unwrap();
        assert!(url.contains("single_select=true"));
        assert!(!url.contains("single_select_vin"));
    }

    #[test]
    fn expiry_check_is_strict() {
        assert!(AuthClient::is_expired(Utc::now() - chrono::Duration::seconds(1)));
        assert!(!AuthClient::is_expired(Utc::now() + chrono::Duration::seconds(7200)));
    }
}
