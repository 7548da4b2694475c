//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles record every call so tests can assert exactly which provider
//! operations a run performed and which sources it consulted.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource, RemoteRecord};
use ddns_core::{Address, AddressFamily, Detector, Reconciler, RunConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOST: &str = "home.example.com";

/// A provider call as observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(AddressFamily),
    Create {
        family: AddressFamily,
        hostname: String,
        content: String,
        proxied: bool,
    },
    Update {
        id: String,
        family: AddressFamily,
        hostname: String,
        content: String,
        proxied: bool,
    },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::List(_))
    }
}

/// A mock DnsProvider with scripted records and failures
///
/// Clones share state, so a test keeps one clone and hands the other to the
/// reconciler.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    records: Arc<Mutex<HashMap<AddressFamily, Vec<RemoteRecord>>>>,
    failing_lists: Arc<Mutex<Vec<AddressFamily>>>,
    failing_mutations: Arc<Mutex<Vec<AddressFamily>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing record of `family`
    pub fn with_record(self, family: AddressFamily, id: &str, content: &str, proxied: bool) -> Self {
        self.records
            .lock()
            .unwrap()
            .entry(family)
            .or_default()
            .push(RemoteRecord {
                id: id.to_string(),
                name: HOST.to_string(),
                content: content.to_string(),
                proxied,
            });
        self
    }

    /// Make listing `family` fail
    pub fn failing_list(self, family: AddressFamily) -> Self {
        self.failing_lists.lock().unwrap().push(family);
        self
    }

    /// Make creating or updating `family` fail
    pub fn failing_mutation(self, family: AddressFamily) -> Self {
        self.failing_mutations.lock().unwrap().push(family);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation_result(&self, family: AddressFamily) -> Result<()> {
        if self.failing_mutations.lock().unwrap().contains(&family) {
            Err(Error::auth(format!("{} mutation rejected", family.record_type())))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, family: AddressFamily, _hostname: &str) -> Result<Vec<RemoteRecord>> {
        self.record(Call::List(family));
        if self.failing_lists.lock().unwrap().contains(&family) {
            return Err(Error::http("connection reset"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&family)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_record(
        &self,
        family: AddressFamily,
        hostname: &str,
        content: &str,
        proxied: bool,
    ) -> Result<()> {
        self.record(Call::Create {
            family,
            hostname: hostname.to_string(),
            content: content.to_string(),
            proxied,
        });
        self.mutation_result(family)
    }

    async fn update_record(
        &self,
        id: &str,
        family: AddressFamily,
        hostname: &str,
        content: &str,
        proxied: bool,
    ) -> Result<()> {
        self.record(Call::Update {
            id: id.to_string(),
            family,
            hostname: hostname.to_string(),
            content: content.to_string(),
            proxied,
        });
        self.mutation_result(family)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// What a scripted source does when asked
#[derive(Debug, Clone)]
pub enum Reply {
    /// Fail as a network error would
    Fail,
    /// Answer with this body (validated like an HTTP body)
    Body(&'static str),
    /// Never answer
    Hang,
}

/// An IpSource that answers from a script and counts calls
#[derive(Clone)]
pub struct ScriptedIpSource {
    name: String,
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(name: &str, reply: Reply) -> Self {
        Self {
            name: name.to_string(),
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self, _family: AddressFamily) -> Result<Address> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Fail => Err(Error::http(format!("{} unreachable", self.name))),
            Reply::Body(body) => Address::parse(body.trim()),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::other("unreachable"))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn boxed(sources: &[ScriptedIpSource]) -> Vec<Box<dyn IpSource>> {
    sources
        .iter()
        .cloned()
        .map(|source| Box::new(source) as Box<dyn IpSource>)
        .collect()
}

/// A detector answering `ipv4` and `ipv6` from one source each
pub fn detector(ipv4: Reply, ipv6: Reply) -> (Detector, ScriptedIpSource, ScriptedIpSource) {
    let v4 = ScriptedIpSource::new("v4-source", ipv4);
    let v6 = ScriptedIpSource::new("v6-source", ipv6);
    let detector = Detector::new(boxed(&[v4.clone()]), boxed(&[v6.clone()]));
    (detector, v4, v6)
}

pub fn reconciler(detector: Detector, provider: &MockDnsProvider) -> Reconciler {
    Reconciler::new(detector, Box::new(provider.clone()))
}

/// Helper to create a minimal RunConfig for testing
pub fn minimal_config() -> RunConfig {
    RunConfig::new("zone-123", "test-token", HOST)
}
