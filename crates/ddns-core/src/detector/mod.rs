//! Public address detection
//!
//! The [`Detector`] holds an ordered list of [`IpSource`]s per family and
//! asks them in turn until one yields a valid address of that family.
//!
//! ```text
//!   IPv4: ipify ──✗──▶ ident.me ──✗──▶ icanhazip ──✗──▶ DetectionFailed
//!   IPv6: ipify ──✗──▶ ident.me ──✗──▶ icanhazip ──✗──▶ local interfaces ──✗──▶ DetectionFailed
//!            │ ✓           │ ✓             │ ✓                  │ ✓
//!            ▼             ▼               ▼                    ▼
//!                          first valid address wins
//! ```
//!
//! Every attempt runs under a child of the run [`Deadline`] capped at the
//! source timeout, so a hung source costs at most that long.

use crate::address::{Address, AddressFamily};
use crate::config::MAX_SOURCE_TIMEOUT_SECS;
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::traits::IpSource;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Run `attempts` in order and return the first success
///
/// Attempts after the first success are never started. If every attempt
/// fails, the last failure is returned.
pub async fn first_success<T, I, F, Fut>(attempts: I) -> Result<T>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;
    for attempt in attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| Error::other("no attempts configured")))
}

/// Ordered, per-family address detection
pub struct Detector {
    ipv4_sources: Vec<Box<dyn IpSource>>,
    ipv6_sources: Vec<Box<dyn IpSource>>,
    source_timeout: Duration,
}

impl Detector {
    /// Create a detector from ordered source lists
    pub fn new(ipv4_sources: Vec<Box<dyn IpSource>>, ipv6_sources: Vec<Box<dyn IpSource>>) -> Self {
        Self {
            ipv4_sources,
            ipv6_sources,
            source_timeout: Duration::from_secs(MAX_SOURCE_TIMEOUT_SECS),
        }
    }

    /// Set the per-source timeout (capped at 5 seconds)
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout.min(Duration::from_secs(MAX_SOURCE_TIMEOUT_SECS));
        self
    }

    /// Bound applied to each source call
    pub fn source_timeout(&self) -> Duration {
        self.source_timeout
    }

    pub async fn detect_ipv4(&self, deadline: &Deadline) -> Result<Address> {
        self.detect(AddressFamily::V4, deadline).await
    }

    pub async fn detect_ipv6(&self, deadline: &Deadline) -> Result<Address> {
        self.detect(AddressFamily::V6, deadline).await
    }

    /// Detect the current address of `family`
    ///
    /// # Returns
    ///
    /// - `Ok(Address)`: From the first source that produced a valid address
    /// - `Err(Error::DetectionFailed)`: Every source failed
    pub async fn detect(&self, family: AddressFamily, deadline: &Deadline) -> Result<Address> {
        let sources = self.sources(family);
        if sources.is_empty() {
            return Err(Error::detection_failed(family, "no sources configured"));
        }

        let attempts = sources
            .iter()
            .map(|source| move || self.try_source(source.as_ref(), family, deadline));

        match first_success(attempts).await {
            Ok(address) => {
                info!("Detected {} address: {}", family, address);
                Ok(address)
            }
            Err(e) => Err(Error::detection_failed(family, e.to_string())),
        }
    }

    fn sources(&self, family: AddressFamily) -> &[Box<dyn IpSource>] {
        match family {
            AddressFamily::V4 => &self.ipv4_sources,
            AddressFamily::V6 => &self.ipv6_sources,
        }
    }

    /// Ask a single source, rejecting answers of the wrong family
    async fn try_source(
        &self,
        source: &dyn IpSource,
        family: AddressFamily,
        deadline: &Deadline,
    ) -> Result<Address> {
        debug!("Asking {} for the {} address", source.name(), family);

        let bounded = deadline.child(self.source_timeout);
        let result = bounded
            .run(source.name(), source.current(family))
            .await
            .and_then(|address| {
                if address.family() == family {
                    Ok(address)
                } else {
                    Err(Error::ip_source(format!(
                        "{} returned {} when {} was expected",
                        source.name(),
                        address,
                        family
                    )))
                }
            });

        if let Err(ref e) = result {
            debug!("Source {} failed: {}", source.name(), e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn first_success_stops_at_first_ok() {
        let calls = AtomicUsize::new(0);
        let results = [Err("a"), Ok(2), Ok(3)];

        let attempts = results.iter().map(|r| {
            let calls = &calls;
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                r.map_err(Error::other)
            }
        });

        assert_eq!(first_success(attempts).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn first_success_returns_last_failure() {
        let results: [std::result::Result<u8, &str>; 3] = [Err("first"), Err("second"), Err("third")];
        let attempts = results
            .iter()
            .map(|r| move || async move { r.map_err(Error::other) });

        let err = first_success(attempts).await.unwrap_err();
        assert_eq!(err.to_string(), "third");
    }

    #[tokio::test]
    async fn first_success_without_attempts_fails() {
        let attempts: Vec<fn() -> std::future::Ready<Result<u8>>> = Vec::new();
        assert!(first_success(attempts).await.is_err());
    }

    #[tokio::test]
    async fn empty_detector_reports_detection_failure() {
        let detector = Detector::new(Vec::new(), Vec::new());
        let deadline = Deadline::after(Duration::from_secs(1));
        let err = detector.detect_ipv6(&deadline).await.unwrap_err();
        assert!(matches!(err, Error::DetectionFailed { family: AddressFamily::V6, .. }));
    }

    #[test]
    fn source_timeout_is_capped() {
        let detector = Detector::new(Vec::new(), Vec::new()).with_source_timeout(Duration::from_secs(60));
        assert_eq!(detector.source_timeout, Duration::from_secs(5));

        let detector = Detector::new(Vec::new(), Vec::new()).with_source_timeout(Duration::from_secs(2));
        assert_eq!(detector.source_timeout, Duration::from_secs(2));
    }
}
