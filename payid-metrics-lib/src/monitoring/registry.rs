//! Metric series and the two registries that hold them
//!
//! Lookup counts live in their own registry because they are pushed with
//! additive semantics under a per-replica grouping, while the gauges are
//! pushed with replace semantics under a per-domain grouping. Each manager
//! instance owns its registries; nothing is registered globally.

use crate::error::Result;
use crate::types::LookupResult;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

pub const LOOKUP_COUNTER_NAME: &str = "payid_lookup_request";
// Counts addresses, not PayIDs
pub const ADDRESS_GAUGE_NAME: &str = "payid_count";
pub const PAYID_GAUGE_NAME: &str = "actual_payid_count";
pub const SERVER_INFO_GAUGE_NAME: &str = "payid_server_info";

const LOOKUP_LABELS: [&str; 4] = ["paymentNetwork", "environment", "org", "result"];
const ADDRESS_LABELS: [&str; 3] = ["paymentNetwork", "environment", "org"];
const PAYID_LABELS: [&str; 1] = ["org"];
const SERVER_INFO_LABELS: [&str; 3] = ["org", "serverAgent", "protocolVersion"];

/// Rendering order of label names. Consistent with every series above, so
/// each sample lists its labels in the order they were declared.
const LABEL_ORDER: [&str; 6] = [
    "paymentNetwork",
    "environment",
    "org",
    "serverAgent",
    "protocolVersion",
    "result",
];

/// Registry holding only the PayID lookup counter
#[derive(Clone)]
pub struct LookupCounterRegistry {
    registry: Registry,
    lookups: CounterVec,
}

impl LookupCounterRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let lookups = CounterVec::new(
            Opts::new(LOOKUP_COUNTER_NAME, "count of requests to lookup a PayID"),
            &LOOKUP_LABELS,
        )?;
        registry.register(Box::new(lookups.clone()))?;

        Ok(Self { registry, lookups })
    }

    /// Count one lookup for the given labels
    pub fn record_lookup(
        &self,
        payment_network: &str,
        environment: &str,
        org: &str,
        result: LookupResult,
    ) {
        self.lookups
            .with_label_values(&[payment_network, environment, org, result.as_label()])
            .inc();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render in Prometheus text format
    pub fn render(&self) -> Result<String> {
        encode_registry(&self.registry)
    }
}

/// Registry holding the address, PayID and server info gauges
#[derive(Clone)]
pub struct GaugeRegistry {
    registry: Registry,
    /// Current count of addresses by (paymentNetwork, environment, org)
    addresses: GaugeVec,
    /// Current count of PayIDs by org
    payids: GaugeVec,
    /// Constant 1, carrying server version facts as labels
    server_info: GaugeVec,
}

impl GaugeRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let addresses = GaugeVec::new(
            Opts::new(
                ADDRESS_GAUGE_NAME,
                "count of addresses by (paymentNetwork, environment)",
            ),
            &ADDRESS_LABELS,
        )?;
        registry.register(Box::new(addresses.clone()))?;

        let payids = GaugeVec::new(
            Opts::new(PAYID_GAUGE_NAME, "count of total PayIDs"),
            &PAYID_LABELS,
        )?;
        registry.register(Box::new(payids.clone()))?;

        let server_info = GaugeVec::new(
            Opts::new(SERVER_INFO_GAUGE_NAME, "version information for server"),
            &SERVER_INFO_LABELS,
        )?;
        registry.register(Box::new(server_info.clone()))?;

        Ok(Self {
            registry,
            addresses,
            payids,
            server_info,
        })
    }

    /// Overwrite the address count for one (network, environment) pair
    ///
    /// Pairs missing from later refreshes are left at their last value.
    pub fn set_address_count(&self, payment_network: &str, environment: &str, org: &str, count: u64) {
        self.addresses
            .with_label_values(&[payment_network, environment, org])
            .set(count as f64);
    }

    pub fn set_payid_count(&self, org: &str, count: u64) {
        self.payids.with_label_values(&[org]).set(count as f64);
    }

    pub fn set_server_info(&self, org: &str, server_agent: &str, protocol_version: &str) {
        self.server_info
            .with_label_values(&[org, server_agent, protocol_version])
            .set(1.0);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render in Prometheus text format
    pub fn render(&self) -> Result<String> {
        encode_registry(&self.registry)
    }
}

/// Encode every family in `registry` in the text exposition format
///
/// `gather()` hands back label pairs sorted by name; they are written in
/// declaration order instead, e.g. `paymentNetwork="XRPL",environment="MAINNET"`.
pub fn encode_registry(registry: &Registry) -> Result<String> {
    let mut metric_families = registry.gather();
    for family in metric_families.iter_mut() {
        for metric in family.mut_metric().iter_mut() {
            metric
                .mut_label()
                .sort_by_key(|pair| label_rank(pair.get_name()));
        }
    }

    let encoder = TextEncoder::new();
    let mut output = Vec::new();
    encoder.encode(&metric_families, &mut output)?;
    Ok(String::from_utf8(output)?)
}

fn label_rank(name: &str) -> usize {
    LABEL_ORDER
        .iter()
        .position(|known| *known == name)
        .unwrap_or(LABEL_ORDER.len())
}
