// # HTTP IP Source
//
// This crate provides an IP source backed by public echo services: plain
// HTTP endpoints whose response body is the caller's address.
//
// ## Purpose
//
// These are the primary sources for both families. The detector asks them
// in order; for IPv6 the local interface source (ddns-ip-local) comes last.
//
// ## Body Format
//
// A 2xx response whose body, with surrounding whitespace trimmed, is an
// address of the requested family. Anything else is a source failure.

use ddns_core::{Address, AddressFamily, Error, IpSource, Result};
use std::time::Duration;
use tracing::debug;

/// Per-request timeout of the HTTP client
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Default IPv4 echo services, in the order they are asked
pub const DEFAULT_IPV4_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://v4.ident.me/",
    "https://ipv4.icanhazip.com/",
];

/// Default IPv6 echo services, in the order they are asked
pub const DEFAULT_IPV6_SERVICES: &[&str] = &[
    "https://api6.ipify.org",
    "https://v6.ident.me/",
    "https://ipv6.icanhazip.com/",
];

/// IP source querying one echo service URL
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source for `url` with a 5 second request timeout
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self::with_client(url, client)
    }

    /// Create a source sharing an existing client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the body of the echo service
    async fn fetch_body(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("{} answered {}", self.url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::http(format!("failed to read body from {}: {}", self.url, e)))
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, family: AddressFamily) -> Result<Address> {
        let body = self.fetch_body().await?;
        let text = body.trim();
        debug!("{} answered {:?}", self.url, text);

        Address::parse_as(text, family)
            .map_err(|e| Error::ip_source(format!("{} returned unusable body: {}", self.url, e)))
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Sources for the given URLs, sharing one client, in order
pub fn sources_from_urls<S: AsRef<str>>(urls: &[S]) -> Vec<Box<dyn IpSource>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default();

    urls.iter()
        .map(|url| {
            Box::new(HttpIpSource::with_client(url.as_ref(), client.clone())) as Box<dyn IpSource>
        })
        .collect()
}

/// The default echo services for `family`
pub fn default_sources(family: AddressFamily) -> Vec<Box<dyn IpSource>> {
    match family {
        AddressFamily::V4 => sources_from_urls(DEFAULT_IPV4_SERVICES),
        AddressFamily::V6 => sources_from_urls(DEFAULT_IPV6_SERVICES),
    }
}
