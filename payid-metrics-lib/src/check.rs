//! Metrics configuration validation
//!
//! Checked before either recurring job is scheduled. The refresh interval is
//! always checked; everything else only matters when pushing is enabled. The
//! first violation found is reported, nothing is accumulated.

use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use url::Url;

const ONE_DAY_IN_SECONDS: i64 = 86_400;

/// Check that metrics can be generated, and pushed if pushing is enabled
///
/// # Errors
///
/// Returns `MetricsError::Config` describing the first invalid setting.
pub fn check_metrics_configuration(config: &MetricsConfig) -> Result<()> {
    let refresh = config.payid_count_refresh_interval_in_seconds;
    if refresh <= 0 || refresh >= ONE_DAY_IN_SECONDS {
        return Err(MetricsError::config(format!(
            "Invalid PAYID_COUNT_REFRESH_INTERVAL value: \"{}\". Must be a positive number less than 86400 seconds. PayID count metrics will not be generated.",
            refresh
        )));
    }

    if !config.push_metrics {
        return Ok(());
    }

    let gateway_url = config.gateway_url.as_deref().unwrap_or_default();
    if config.gateway_url.is_none() || Url::parse(gateway_url).is_err() {
        return Err(MetricsError::config(format!(
            "Push metrics are enabled, but the environment variable PUSH_GATEWAY_URL is not a valid url: \"{}\".",
            gateway_url
        )));
    }

    if !is_valid_domain(config.domain.as_deref()) {
        return Err(MetricsError::config(format!(
            "Push metrics are enabled, but the environment variable PAYID_DOMAIN is not a valid url: \"{}\".",
            config.domain.as_deref().unwrap_or_default()
        )));
    }

    let push = config.push_interval_in_seconds;
    if push <= 0 || push > ONE_DAY_IN_SECONDS {
        return Err(MetricsError::config(format!(
            "Push metrics are enabled, but the environment variable PUSH_METRICS_INTERVAL has an invalid value: \"{}\". Must be positive and less than one day in seconds.",
            push
        )));
    }

    Ok(())
}

fn is_valid_domain(domain: Option<&str>) -> bool {
    match domain {
        Some(domain) => Url::parse(&format!("https://{}", domain))
            .map(|url| url.host().is_some())
            .unwrap_or(false),
        None => false,
    }
}
