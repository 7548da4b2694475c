// # ddns-core
//
// Core library for the DDNS updater.
//
// ## Architecture Overview
//
// One run keeps a hostname's A/AAAA records pointed at this host:
// - **IpSource**: Trait for looking up the host's current address
// - **Detector**: Asks IP sources in order until one answers
// - **DnsProvider**: Trait for listing, creating and updating records
// - **Reconciler**: Resolves, compares and applies, then reports one outcome
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic lives here, transports live in
//    the provider and IP source crates
// 2. **Stateless**: Every run starts from the provider's records; nothing is
//    kept between runs
// 3. **Bounded**: Every outbound call runs under a `Deadline`
// 4. **Library-First**: The `ddns-update` binary is a thin shell over this crate

pub mod address;
pub mod traits;
pub mod detector;
pub mod reconciler;
pub mod config;
pub mod deadline;
pub mod error;
pub mod outcome;

// Re-export core types for convenience
pub use address::{Address, AddressFamily, is_ipv4, is_ipv6};
pub use traits::{DnsProvider, IpSource, RemoteRecord};
pub use detector::{Detector, first_success};
pub use reconciler::{Reconciler, Targets};
pub use config::{RunConfig, TimeoutConfig};
pub use deadline::Deadline;
pub use error::{Error, Result};
pub use outcome::{Outcome, Status};
