//! Environment variable loading for the metrics configuration
//!
//! Variable names match the ones named in validation errors, so an operator
//! can go straight from a failed startup to the variable to fix.

use crate::config::{MetricsConfig, DEFAULT_GATEWAY_URL};
use crate::error::{MetricsError, Result};

/// Load the metrics configuration from environment variables
///
/// # Environment Variables
///
/// - `PUSH_PAYID_METRICS`: Push metrics to the gateway (default: "true")
/// - `PAYID_DOMAIN`: Domain operating this PayID server, used as the `org` label
/// - `PUSH_GATEWAY_URL`: Push gateway URL (default: "https://push00.mon.payid.tech/")
/// - `PUSH_METRICS_INTERVAL`: Seconds between pushes (default: "15")
/// - `PAYID_COUNT_REFRESH_INTERVAL`: Seconds between count refreshes (default: "60")
/// - `PAYID_SERVER_AGENT`: Server implementation identifier (default: unset, reported as "unknown")
/// - `PAYID_PROTOCOL_VERSION`: Supported PayID protocol version (default: "1.0")
/// - `PAYID_METRICS_HOST`: Host part of the counter push grouping (default: the system hostname)
///
/// # Errors
///
/// Returns `MetricsError::Config` if a value cannot be parsed or the resulting
/// configuration fails validation.
pub fn load_config_from_env() -> Result<MetricsConfig> {
    tracing::info!("Loading metrics configuration from environment variables");

    let push_metrics = parse_bool_env("PUSH_PAYID_METRICS", true)?;
    let push_interval = parse_i64_env("PUSH_METRICS_INTERVAL", 15)?;
    let refresh_interval = parse_i64_env("PAYID_COUNT_REFRESH_INTERVAL", 60)?;
    let gateway_url =
        optional_env("PUSH_GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
    let protocol_version =
        optional_env("PAYID_PROTOCOL_VERSION").unwrap_or_else(|| "1.0".to_string());

    let mut builder = MetricsConfig::builder()
        .push_metrics(push_metrics)
        .gateway_url(gateway_url)
        .push_interval_in_seconds(push_interval)
        .payid_count_refresh_interval_in_seconds(refresh_interval)
        .payid_protocol_version(protocol_version);

    if let Some(domain) = optional_env("PAYID_DOMAIN") {
        builder = builder.domain(domain);
    }
    if let Some(agent) = optional_env("PAYID_SERVER_AGENT") {
        builder = builder.server_agent(agent);
    }
    if let Some(host) = optional_env("PAYID_METRICS_HOST") {
        builder = builder.host_identifier(host);
    }

    let config = builder.build()?;

    tracing::info!(
        "Metrics Config - Org: {}, Push: {}, Push Interval: {}s, Refresh Interval: {}s",
        config.org_label(),
        config.push_metrics,
        config.push_interval_in_seconds,
        config.payid_count_refresh_interval_in_seconds
    );

    Ok(config)
}

// Helper functions for parsing environment variables

/// Read a variable, treating empty as unset
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse a boolean environment variable with a default value
fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match optional_env(key) {
        Some(value) => value.parse::<bool>().map_err(|e| {
            MetricsError::config(format!(
                "Invalid boolean value for {}: {} ({})",
                key, value, e
            ))
        }),
        None => Ok(default),
    }
}

/// Parse an i64 environment variable with a default value
fn parse_i64_env(key: &str, default: i64) -> Result<i64> {
    match optional_env(key) {
        Some(value) => value.trim().parse::<i64>().map_err(|e| {
            MetricsError::config(format!("Invalid i64 value for {}: {} ({})", key, value, e))
        }),
        None => Ok(default),
    }
}
