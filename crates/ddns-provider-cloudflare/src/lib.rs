// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Behavior
//
// - ✅ One HTTP request per trait call (list, create or update)
// - ✅ Bearer token authentication, token never logged
// - ✅ HTTP timeout configured (10 seconds)
// - ✅ Specific error handling for HTTP status codes (401, 403, 429, 5xx)
// - ✅ Cloudflare envelope checked: `success: false` is an error
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (a failed run is simply run again later)
// - ❌ NO comparison of record content (owned by the Reconciler)
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token or zone id is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::traits::{DnsProvider, RemoteRecord};
use ddns_core::{AddressFamily, Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER: &str = "cloudflare";

/// Cloudflare API v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Body of a create or update request
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    proxied: bool,
}

fn describe(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map a non-2xx status onto the error taxonomy
fn status_error(status: StatusCode, body: &str, action: &str) -> Error {
    let details = serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .map(|envelope| describe(&envelope.errors))
        .unwrap_or_else(|_| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {} - {}",
            status, details
        )),
        429 => Error::rate_limited(format!("Status: {} - {}", status, details)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, details),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", action, status, details)),
    }
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (record lookup)
/// - Log the intended POST/PUT payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone holding the managed records
    zone_id: String,

    /// API base URL (overridden in tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Zone holding the records
    /// - `dry_run`: If true, perform GET requests but skip mutations
    ///
    /// # Errors
    ///
    /// `MissingCredentials` if the token or zone id is empty.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.trim().is_empty() {
            return Err(Error::missing_credentials("Cloudflare API token is required"));
        }
        if zone_id.trim().is_empty() {
            return Err(Error::missing_credentials("Cloudflare zone id is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_token,
            zone_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Send requests to `base_url` instead of the public API
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Send `request` and unwrap the Cloudflare envelope
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))` / `Ok(None)`: `success: true`, with or without a result
    /// - `Err(Error)`: Transport failure, non-2xx, undecodable body or
    ///   `success: false`
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<Option<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", action, e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body, action));
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse {} response: {}", action, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", action, describe(&envelope.errors)),
            ));
        }

        Ok(envelope.result)
    }

    /// POST or PUT a record, or just log it in dry-run mode
    async fn write_record(
        &self,
        request: impl FnOnce(&reqwest::Client) -> reqwest::RequestBuilder,
        action: &str,
        payload: &RecordPayload<'_>,
    ) -> Result<()> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would {} with payload: {}",
                action,
                serde_json::to_string(payload)?
            );
            return Ok(());
        }

        self.send::<serde_json::Value>(request(&self.client).json(payload), action)
            .await?;
        tracing::debug!("{} succeeded", action);
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List records of `family` named `hostname`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, family: AddressFamily, hostname: &str) -> Result<Vec<RemoteRecord>> {
        let record_type = family.record_type();
        tracing::debug!("Looking up {} records for {}", record_type, hostname);

        let request = self
            .client
            .get(self.records_url())
            .query(&[("type", record_type), ("name", hostname)]);

        let records: Vec<RemoteRecord> = self
            .send(request, "list records")
            .await?
            .ok_or_else(|| Error::provider(PROVIDER, "list records response has no result"))?;

        tracing::debug!("Found {} {} records", records.len(), record_type);
        Ok(records)
    }

    /// Create a record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "...", "content": "1.2.3.4", "proxied": true }
    /// ```
    async fn create_record(
        &self,
        family: AddressFamily,
        hostname: &str,
        content: &str,
        proxied: bool,
    ) -> Result<()> {
        let payload = RecordPayload {
            record_type: family.record_type(),
            name: hostname,
            content,
            proxied,
        };
        let url = self.records_url();
        self.write_record(|client| client.post(url), "create record", &payload)
            .await
    }

    /// Update record `id` in place
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "AAAA", "name": "...", "content": "2001:db8::1", "proxied": false }
    /// ```
    async fn update_record(
        &self,
        id: &str,
        family: AddressFamily,
        hostname: &str,
        content: &str,
        proxied: bool,
    ) -> Result<()> {
        let payload = RecordPayload {
            record_type: family.record_type(),
            name: hostname,
            content,
            proxied,
        };
        let url = format!("{}/{}", self.records_url(), id);
        self.write_record(|client| client.put(url), "update record", &payload)
            .await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
