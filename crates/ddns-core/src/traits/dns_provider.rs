// # DNS Provider Trait
//
// Defines the interface for reading and writing address records via a
// provider API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, DnsProvider};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records(AddressFamily::V4, "home.example.com").await?;
//     match records.first() {
//         Some(record) => provider.update_record(&record.id, AddressFamily::V4,
//             "home.example.com", "203.0.113.7", record.proxied).await?,
//         None => provider.create_record(AddressFamily::V4,
//             "home.example.com", "203.0.113.7", true).await?,
//     }
//
//     Ok(())
// }
// ```

use crate::address::AddressFamily;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An address record as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record name
    pub name: String,
    /// The record content, compared verbatim against the resolved address
    pub content: String,
    /// Whether traffic is proxied through the provider
    #[serde(default)]
    pub proxied: bool,
}

/// Trait for DNS provider implementations
///
/// Providers are thin transport wrappers. They never decide whether a change
/// is needed and never retry: that is owned by the
/// [`Reconciler`](crate::Reconciler).
///
/// ## Error Contract
///
/// - Transport, authentication and rate-limit failures are errors
/// - A response the provider marks as unsuccessful is an error
/// - A response that cannot be decoded is an error, never "no records"
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of `family` named `hostname`, in provider order
    async fn list_records(
        &self,
        family: AddressFamily,
        hostname: &str,
    ) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Create a record of `family` named `hostname`
    async fn create_record(
        &self,
        family: AddressFamily,
        hostname: &str,
        content: &str,
        proxied: bool,
    ) -> Result<(), crate::Error>;

    /// Replace the content of record `id`
    async fn update_record(
        &self,
        id: &str,
        family: AddressFamily,
        hostname: &str,
        content: &str,
        proxied: bool,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
