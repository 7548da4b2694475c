// # IP Source Trait
//
// Defines the interface for looking up the host's current address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-ip-http` crate
// - Local interfaces (IPv6 only): `ddns-ip-local` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let address = source.current(AddressFamily::V4).await?;
//     println!("public address: {}", address);
//
//     Ok(())
// }
// ```

use crate::address::{Address, AddressFamily};
use async_trait::async_trait;

/// Trait for IP source implementations
///
/// A source answers one question: what is this host's address of the given
/// family right now. Sources are consulted in order by the
/// [`Detector`](crate::Detector), which owns fallback and timeouts.
///
/// ## Rules
///
/// - ✅ Perform one lookup per call (an HTTP request, an interface scan)
/// - ✅ Return an error for anything unusable (non-2xx, malformed body)
/// - ❌ Retry or fall back to other sources (owned by `Detector`)
/// - ❌ Cache results between calls
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Look up the current address of `family`
    ///
    /// # Returns
    ///
    /// - `Ok(Address)`: The current address
    /// - `Err(Error)`: If this source cannot provide one
    async fn current(&self, family: AddressFamily) -> Result<Address, crate::Error>;

    /// Source name (for logging/debugging)
    fn name(&self) -> &str;
}
