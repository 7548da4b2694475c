//! Record reconciliation
//!
//! The Reconciler is responsible for:
//! - Resolving the addresses to publish (explicit or detected)
//! - Fetching the existing A/AAAA records from the DnsProvider
//! - Deciding per family whether to create, update or leave the record
//! - Applying the changes and folding both families into one outcome
//!
//! ## Run Flow
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   resolve    │───▶│    fetch     │───▶│    decide    │───▶│    apply     │
//! │ (Detector)   │    │ (list A/AAAA)│    │ (per family) │    │ create/update│
//! └──────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//!   IPv4 fatal           any error          nothing to do        one family ok
//!   IPv6 tolerated       is fatal           → NoChange           → Success
//! ```
//!
//! Calls are sequential and each one runs under the run [`Deadline`].

use crate::address::{Address, AddressFamily, is_ipv4, is_ipv6};
use crate::config::{RunConfig, TimeoutConfig};
use crate::deadline::Deadline;
use crate::detector::Detector;
use crate::error::{Error, Result};
use crate::outcome::Outcome;
use crate::traits::{DnsProvider, RemoteRecord};
use tracing::{debug, error, info, warn};

/// Proxy flag given to records the reconciler creates
pub const DEFAULT_PROXIED: bool = true;

/// What a run should do to one family's record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// No record exists yet
    Create { content: String },
    /// A record exists with different content
    Update {
        id: String,
        content: String,
        proxied: bool,
    },
}

impl Change {
    /// Decide the change for `target` given the current record, if any
    ///
    /// Content is compared verbatim: no case folding or normalization.
    pub fn decide(target: &Address, current: Option<&RemoteRecord>) -> Option<Self> {
        match current {
            Some(record) if record.content == target.as_str() => None,
            Some(record) => Some(Change::Update {
                id: record.id.clone(),
                content: target.as_str().to_string(),
                proxied: record.proxied,
            }),
            None => Some(Change::Create {
                content: target.as_str().to_string(),
            }),
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Change::Create { .. } => "create",
            Change::Update { .. } => "update",
        }
    }
}

/// Result of the mutation step for one family
#[derive(Debug)]
pub enum FamilyResult {
    /// No mutation was attempted (disabled, unchanged or nothing resolved)
    Skipped,
    /// The record was created or updated
    Applied,
    /// The mutation failed
    Failed(Error),
}

/// Fold the two per-family results into the run outcome
///
/// Any applied change makes the run a success, even when the other family
/// failed. The run fails only when every attempted mutation failed, and then
/// reports the IPv6 error if both failed.
pub fn combine(ipv4: FamilyResult, ipv6: FamilyResult) -> Result<Outcome> {
    match (ipv4, ipv6) {
        (FamilyResult::Applied, _) | (_, FamilyResult::Applied) => Ok(Outcome::Success),
        (_, FamilyResult::Failed(e)) | (FamilyResult::Failed(e), FamilyResult::Skipped) => Err(e),
        (FamilyResult::Skipped, FamilyResult::Skipped) => Ok(Outcome::NoChange),
    }
}

/// Addresses a run will publish; a family is `None` when not managed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Targets {
    pub ipv4: Option<Address>,
    pub ipv6: Option<Address>,
}

impl Targets {
    fn get(&self, family: AddressFamily) -> Option<&Address> {
        match family {
            AddressFamily::V4 => self.ipv4.as_ref(),
            AddressFamily::V6 => self.ipv6.as_ref(),
        }
    }
}

/// Stateless A/AAAA reconciler
///
/// One call to [`Reconciler::reconcile`] is one complete run. Nothing is
/// kept between runs, so the same reconciler can be reused or several can
/// run side by side.
pub struct Reconciler {
    /// Address detection
    detector: Detector,

    /// DNS provider for reading and writing records
    provider: Box<dyn DnsProvider>,

    /// Bounds for the whole run
    timeouts: TimeoutConfig,
}

impl Reconciler {
    /// Create a new reconciler with the default run timeout
    ///
    /// The detector keeps its own per-source timeout.
    pub fn new(detector: Detector, provider: Box<dyn DnsProvider>) -> Self {
        Self {
            detector,
            provider,
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Use custom timeouts
    ///
    /// The per-source timeout can only get tighter than the detector's.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Result<Self> {
        timeouts.validate()?;
        let source_timeout = self.detector.source_timeout().min(timeouts.source_timeout());
        self.detector = self.detector.with_source_timeout(source_timeout);
        self.timeouts = timeouts;
        Ok(self)
    }

    /// Run once under a fresh deadline of the configured run timeout
    pub async fn reconcile(&self, config: &RunConfig) -> Result<Outcome> {
        let deadline = Deadline::after(self.timeouts.run_timeout());
        self.reconcile_until(config, &deadline).await
    }

    /// Run once under `deadline`
    pub async fn reconcile_until(&self, config: &RunConfig, deadline: &Deadline) -> Result<Outcome> {
        config.validate()?;

        let targets = self.resolve(config, deadline).await?;

        let current_v4 = self.fetch(AddressFamily::V4, &targets, config, deadline).await?;
        let current_v6 = self.fetch(AddressFamily::V6, &targets, config, deadline).await?;

        let change_v4 = targets
            .ipv4
            .as_ref()
            .and_then(|target| Change::decide(target, current_v4.as_ref()));
        let change_v6 = targets
            .ipv6
            .as_ref()
            .and_then(|target| Change::decide(target, current_v6.as_ref()));

        if change_v4.is_none() && change_v6.is_none() {
            info!("Records for {} are up to date", config.hostname);
            return Ok(Outcome::NoChange);
        }

        let ipv4 = self.apply(AddressFamily::V4, change_v4, config, deadline).await;
        let ipv6 = self.apply(AddressFamily::V6, change_v6, config, deadline).await;

        combine(ipv4, ipv6)
    }

    /// Work out which addresses this run publishes
    ///
    /// An explicit IPv6 address is taken as final: AAAA handling is switched
    /// off for the run, and as no IPv4 is resolved either, nothing is managed.
    pub async fn resolve(&self, config: &RunConfig, deadline: &Deadline) -> Result<Targets> {
        let mut targets = Targets::default();
        let mut ipv6_enabled = config.ipv6_enabled;

        match config.explicit_ip() {
            None => {
                targets.ipv4 = Some(self.detector.detect_ipv4(deadline).await?);
            }
            Some(ip) if is_ipv4(ip) => {
                debug!("Using explicit IPv4 address {}", ip);
                targets.ipv4 = Some(Address::parse(ip)?);
            }
            Some(ip) if is_ipv6(ip) => {
                warn!(
                    "Explicit IPv6 address {} supplied; AAAA handling is disabled for this run",
                    ip
                );
                ipv6_enabled = false;
            }
            Some(ip) => return Err(Error::invalid_address(ip.to_string())),
        }

        if ipv6_enabled {
            match self.detector.detect_ipv6(deadline).await {
                Ok(address) => targets.ipv6 = Some(address),
                Err(e) => warn!("IPv6 disabled for this run: {}", e),
            }
        }

        Ok(targets)
    }

    /// Fetch the canonical record of `family`, if that family is managed
    ///
    /// Only the first record returned counts; further ones are left alone.
    async fn fetch(
        &self,
        family: AddressFamily,
        targets: &Targets,
        config: &RunConfig,
        deadline: &Deadline,
    ) -> Result<Option<RemoteRecord>> {
        if targets.get(family).is_none() {
            return Ok(None);
        }

        let operation = format!("list {} records", family.record_type());
        let records = deadline
            .run(&operation, self.provider.list_records(family, &config.hostname))
            .await
            .map_err(|e| Error::provider_query(family, e))?;

        if records.len() > 1 {
            debug!(
                "{} {} records exist for {}; only the first is managed",
                records.len(),
                family.record_type(),
                config.hostname
            );
        }

        Ok(records.into_iter().next().filter(|record| !record.id.is_empty()))
    }

    /// Apply one family's change, folding any error into the result
    async fn apply(
        &self,
        family: AddressFamily,
        change: Option<Change>,
        config: &RunConfig,
        deadline: &Deadline,
    ) -> FamilyResult {
        let Some(change) = change else {
            return FamilyResult::Skipped;
        };

        let record_type = family.record_type();
        let operation = format!("{} {} record", change.action(), record_type);
        let host = config.hostname.as_str();

        let result = match &change {
            Change::Create { content } => {
                info!("Creating {} record {} -> {}", record_type, host, content);
                deadline
                    .run(
                        &operation,
                        self.provider.create_record(family, host, content, DEFAULT_PROXIED),
                    )
                    .await
            }
            Change::Update { id, content, proxied } => {
                info!("Updating {} record {} -> {}", record_type, host, content);
                deadline
                    .run(
                        &operation,
                        self.provider.update_record(id, family, host, content, *proxied),
                    )
                    .await
            }
        };

        match result {
            Ok(()) => {
                info!("{} record for {} is now current", record_type, host);
                FamilyResult::Applied
            }
            Err(e) => {
                error!("Failed to {}: {}", operation, e);
                FamilyResult::Failed(Error::provider_mutation(family, change.action(), e))
            }
        }
    }

    /// The provider this reconciler writes through
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, content: &str, proxied: bool) -> RemoteRecord {
        RemoteRecord {
            id: id.to_string(),
            name: "home.example.com".to_string(),
            content: content.to_string(),
            proxied,
        }
    }

    fn failed(msg: &str) -> FamilyResult {
        FamilyResult::Failed(Error::other(msg))
    }

    #[test]
    fn equal_content_needs_no_change() {
        let target = Address::parse("203.0.113.7").unwrap();
        assert_eq!(Change::decide(&target, Some(&record("abc", "203.0.113.7", true))), None);
    }

    #[test]
    fn comparison_is_verbatim() {
        let target = Address::parse("2001:db8::1").unwrap();
        let change = Change::decide(&target, Some(&record("abc", "2001:DB8::1", false)));
        assert!(matches!(change, Some(Change::Update { .. })));
    }

    #[test]
    fn missing_record_is_created() {
        let target = Address::parse("203.0.113.7").unwrap();
        assert_eq!(
            Change::decide(&target, None),
            Some(Change::Create {
                content: "203.0.113.7".to_string()
            })
        );
    }

    #[test]
    fn update_keeps_id_and_proxy_flag() {
        let target = Address::parse("203.0.113.7").unwrap();
        assert_eq!(
            Change::decide(&target, Some(&record("abc", "203.0.113.1", false))),
            Some(Change::Update {
                id: "abc".to_string(),
                content: "203.0.113.7".to_string(),
                proxied: false,
            })
        );
    }

    #[test]
    fn one_applied_family_is_enough() {
        assert_eq!(combine(FamilyResult::Applied, failed("v6")).unwrap(), Outcome::Success);
        assert_eq!(combine(failed("v4"), FamilyResult::Applied).unwrap(), Outcome::Success);
        assert_eq!(combine(FamilyResult::Applied, FamilyResult::Skipped).unwrap(), Outcome::Success);
        assert_eq!(combine(FamilyResult::Skipped, FamilyResult::Applied).unwrap(), Outcome::Success);
    }

    #[test]
    fn all_attempts_failed_reports_last_error() {
        let err = combine(failed("v4"), failed("v6")).unwrap_err();
        assert_eq!(err.to_string(), "v6");

        let err = combine(failed("v4"), FamilyResult::Skipped).unwrap_err();
        assert_eq!(err.to_string(), "v4");

        let err = combine(FamilyResult::Skipped, failed("v6")).unwrap_err();
        assert_eq!(err.to_string(), "v6");
    }

    #[test]
    fn nothing_attempted_is_no_change() {
        assert_eq!(
            combine(FamilyResult::Skipped, FamilyResult::Skipped).unwrap(),
            Outcome::NoChange
        );
    }
}
