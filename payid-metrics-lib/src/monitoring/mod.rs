//! Monitoring and Metrics Module
//!
//! This module contains the PayID metric series, the registries that hold
//! them, the push gateway clients, and the [`Metrics`] manager that drives
//! recurring generation and push.
//!
//! Counters and gauges are kept in separate registries because the gateway
//! must merge them differently: lookup counts from several server replicas
//! add up, while directory gauges are overwritten by the latest snapshot.

pub mod gateway;
pub mod manager;
pub mod registry;

mod timer;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for convenience
pub use gateway::{AdditivePushGateway, MetricsPusher, ReplacingPushGateway};
pub use manager::Metrics;
pub use registry::{encode_registry, GaugeRegistry, LookupCounterRegistry};
