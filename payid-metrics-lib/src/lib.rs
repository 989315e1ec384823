//! # PayID Metrics Library
//!
//! In-process metrics for a PayID directory server. It counts PayID lookups,
//! tracks address and PayID totals as gauges, renders everything in the
//! Prometheus text format for the host's `/metrics` endpoint, and optionally
//! pushes to a Prometheus push gateway on a timer.
//!
//! ## Features
//!
//! - Lookup counter labelled by payment network, environment, org and result
//! - Address, PayID and server info gauges refreshed from host-supplied queries
//! - Separate counter and gauge registries, pushed additively and by replacement
//! - Fail-fast configuration validation before any job is scheduled
//! - Fetch and push failures are logged and never stop the recurring jobs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payid_metrics_lib::{load_config_from_env, AddressCount, Metrics, MetricsResult};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config_from_env()?;
//!     let metrics = Arc::new(Metrics::new(
//!         config,
//!         || async { MetricsResult::Ok(vec![AddressCount::new("XRPL", "MAINNET", 4)]) },
//!         || async { MetricsResult::Ok(1u64) },
//!     )?);
//!
//!     metrics.schedule_recurring_generation()?;
//!     metrics.schedule_recurring_push()?;
//!
//!     // In a lookup handler
//!     metrics.record_lookup_result(true, "XRPL", Some("MAINNET"));
//!
//!     // In the /metrics handler
//!     println!("{}", metrics.metrics_text()?);
//!
//!     metrics.stop_metrics();
//!     Ok(())
//! }
//! ```

// Core modules
pub mod check;
pub mod config;
pub mod env;
pub mod error;
pub mod fetch;
pub mod types;

// Monitoring and metrics
pub mod monitoring;

// Public API exports
pub use check::check_metrics_configuration;
pub use config::{MetricsConfig, MetricsConfigBuilder};
pub use env::load_config_from_env;
pub use error::MetricsError;
pub use fetch::{AddressCountFetcher, PayIdCountFetcher};
pub use monitoring::Metrics;
pub use types::{AddressCount, LookupResult};
pub type MetricsResult<T> = Result<T, MetricsError>;
