use crate::check::check_metrics_configuration;
use crate::error::Result;
use std::time::Duration;

/// Default push gateway operated for PayID server metrics
pub const DEFAULT_GATEWAY_URL: &str = "https://push00.mon.payid.tech/";

/// Label value used when the organization domain is not configured
pub const UNDEFINED_ORG: &str = "undefined";

/// Label value used when no server agent is configured
pub const UNKNOWN_SERVER_AGENT: &str = "unknown";

/// Configuration controlling how metrics are generated and pushed
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether to push metrics to the push gateway
    pub push_metrics: bool,

    /// Domain name that operates this PayID server, used as the `org` label
    pub domain: Option<String>,

    /// Push gateway base URL
    pub gateway_url: Option<String>,

    /// How frequently (in seconds) to push metrics to the push gateway
    pub push_interval_in_seconds: i64,

    /// How frequently (in seconds) to refresh the address and PayID counts
    pub payid_count_refresh_interval_in_seconds: i64,

    /// Identifies the server implementation, e.g. `payid-server@1.4.0`
    pub server_agent: Option<String>,

    /// PayID protocol version supported by the server
    pub payid_protocol_version: String,

    /// Overrides the host part of the counter push instance grouping
    pub host_identifier: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            push_metrics: true,
            domain: None,
            gateway_url: Some(DEFAULT_GATEWAY_URL.to_string()),
            push_interval_in_seconds: 15,
            payid_count_refresh_interval_in_seconds: 60,
            server_agent: None,
            payid_protocol_version: "1.0".to_string(),
            host_identifier: None,
        }
    }
}

impl MetricsConfig {
    /// Create a new config builder
    pub fn builder() -> MetricsConfigBuilder {
        MetricsConfigBuilder::new()
    }

    /// Value of the `org` label attached to every series
    pub fn org_label(&self) -> &str {
        self.domain.as_deref().unwrap_or(UNDEFINED_ORG)
    }

    /// Value of the `serverAgent` label on the server info series
    pub fn server_agent_label(&self) -> &str {
        self.server_agent.as_deref().unwrap_or(UNKNOWN_SERVER_AGENT)
    }

    /// Interval between address/PayID count refreshes
    ///
    /// Only meaningful for a validated config; non-positive values clamp to zero.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.payid_count_refresh_interval_in_seconds).unwrap_or(0))
    }

    /// Interval between pushes to the gateway
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.push_interval_in_seconds).unwrap_or(0))
    }
}

/// Builder pattern for creating a validated metrics configuration
#[derive(Debug, Default)]
pub struct MetricsConfigBuilder {
    config: MetricsConfig,
}

impl MetricsConfigBuilder {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            config: MetricsConfig::default(),
        }
    }

    /// Enable/disable pushing to the gateway
    pub fn push_metrics(mut self, enabled: bool) -> Self {
        self.config.push_metrics = enabled;
        self
    }

    /// Set the organization domain
    pub fn domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.config.domain = Some(domain.into());
        self
    }

    /// Set the push gateway URL
    pub fn gateway_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.gateway_url = Some(url.into());
        self
    }

    /// Set the push interval in seconds
    pub fn push_interval_in_seconds(mut self, seconds: i64) -> Self {
        self.config.push_interval_in_seconds = seconds;
        self
    }

    /// Set the count refresh interval in seconds
    pub fn payid_count_refresh_interval_in_seconds(mut self, seconds: i64) -> Self {
        self.config.payid_count_refresh_interval_in_seconds = seconds;
        self
    }

    /// Set the server agent string
    pub fn server_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.config.server_agent = Some(agent.into());
        self
    }

    /// Set the supported PayID protocol version
    pub fn payid_protocol_version<S: Into<String>>(mut self, version: S) -> Self {
        self.config.payid_protocol_version = version.into();
        self
    }

    /// Set the host identifier used in the counter push grouping
    pub fn host_identifier<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host_identifier = Some(host.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MetricsConfig> {
        check_metrics_configuration(&self.config)?;
        Ok(self.config)
    }
}
