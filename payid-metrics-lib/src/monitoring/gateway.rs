//! Push gateway clients
//!
//! Lookup counters and gauges need opposite conflict resolution at the
//! gateway, so each gets its own client type instead of one client with a
//! mode switch:
//!
//! - [`AdditivePushGateway`] sends `POST`, which only replaces same-named
//!   series inside its grouping. Every replica pushes under its own
//!   `{domain}_{host}_{pid}` instance and the counts sum up downstream.
//! - [`ReplacingPushGateway`] sends `PUT`, which replaces the whole grouping.
//!   All replicas share the `{domain}` instance and the latest snapshot wins.

use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use crate::monitoring::registry::encode_registry;
use async_trait::async_trait;
use prometheus::{Registry, TEXT_FORMAT};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

pub const COUNTER_JOB_NAME: &str = "payid_counter_metrics";
pub const GAUGE_JOB_NAME: &str = "payid_gauge_metrics";

/// A registry bound to a push gateway grouping
#[async_trait]
pub trait MetricsPusher: Send + Sync {
    /// Short name used in log lines, e.g. `counter`
    fn kind(&self) -> &'static str;

    /// Full grouping URL this pusher sends to
    fn url(&self) -> &Url;

    /// Encode the registry and send it to the gateway
    async fn push(&self) -> Result<()>;
}

/// Pushes with `POST`: values from separate instances accumulate
#[derive(Clone)]
pub struct AdditivePushGateway {
    client: Client,
    url: Url,
    registry: Registry,
}

impl AdditivePushGateway {
    pub fn new(client: Client, gateway_url: &str, instance: &str, registry: Registry) -> Result<Self> {
        Ok(Self {
            client,
            url: grouping_url(gateway_url, COUNTER_JOB_NAME, instance)?,
            registry,
        })
    }
}

#[async_trait]
impl MetricsPusher for AdditivePushGateway {
    fn kind(&self) -> &'static str {
        "counter"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    async fn push(&self) -> Result<()> {
        send_registry(&self.client, Method::POST, &self.url, &self.registry).await
    }
}

/// Pushes with `PUT`: each push replaces the grouping's previous values
#[derive(Clone)]
pub struct ReplacingPushGateway {
    client: Client,
    url: Url,
    registry: Registry,
}

impl ReplacingPushGateway {
    pub fn new(client: Client, gateway_url: &str, instance: &str, registry: Registry) -> Result<Self> {
        Ok(Self {
            client,
            url: grouping_url(gateway_url, GAUGE_JOB_NAME, instance)?,
            registry,
        })
    }
}

#[async_trait]
impl MetricsPusher for ReplacingPushGateway {
    fn kind(&self) -> &'static str {
        "gauge"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    async fn push(&self) -> Result<()> {
        send_registry(&self.client, Method::PUT, &self.url, &self.registry).await
    }
}

/// Build `<gateway>/metrics/job/<job>/instance/<instance>`
///
/// Segments are percent-encoded; a trailing slash on the base is ignored.
pub fn grouping_url(gateway_url: &str, job: &str, instance: &str) -> Result<Url> {
    let mut url = Url::parse(gateway_url).map_err(|e| {
        MetricsError::config(format!("Invalid push gateway url \"{}\": {}", gateway_url, e))
    })?;

    url.path_segments_mut()
        .map_err(|_| {
            MetricsError::config(format!(
                "Push gateway url \"{}\" cannot carry a path",
                gateway_url
            ))
        })?
        .pop_if_empty()
        .extend(["metrics", "job", job, "instance", instance]);

    Ok(url)
}

/// Instance grouping for the counter push: `{domain}_{host}_{pid}`
///
/// The host is `host_identifier` when set, otherwise the system hostname.
pub fn counter_instance(config: &MetricsConfig) -> String {
    let host = config
        .host_identifier
        .clone()
        .filter(|host| !host.is_empty())
        .or_else(system_hostname)
        .unwrap_or_else(|| "localhost".to_string());

    format!("{}_{}_{}", config.org_label(), host, std::process::id())
}

fn system_hostname() -> Option<String> {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|host| !host.is_empty())
}

/// Instance grouping for the gauge push: `{domain}`
pub fn gauge_instance(config: &MetricsConfig) -> String {
    config.org_label().to_string()
}

async fn send_registry(client: &Client, method: Method, url: &Url, registry: &Registry) -> Result<()> {
    let body = encode_registry(registry)?;

    let response = client
        .request(method.clone(), url.clone())
        .header(CONTENT_TYPE, TEXT_FORMAT)
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(MetricsError::push(format!(
            "{} {} returned {}: {}",
            method,
            url,
            status,
            detail.trim()
        )));
    }

    debug!("{} {} accepted with {}", method, url, status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::registry::{GaugeRegistry, LookupCounterRegistry};
    use crate::monitoring::test_support::{always, spawn_fake_gateway};
    use hyper::StatusCode;
    use serial_test::serial;
    use crate::types::LookupResult;

    #[test]
    fn test_grouping_url_with_trailing_slash() {
        let url = grouping_url("https://push00.mon.payid.tech/", GAUGE_JOB_NAME, "example.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://push00.mon.payid.tech/metrics/job/payid_gauge_metrics/instance/example.com"
        );
    }

    #[test]
    fn test_grouping_url_keeps_base_path() {
        let url = grouping_url("http://gateway:9091/prefix", COUNTER_JOB_NAME, "a_b_1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://gateway:9091/prefix/metrics/job/payid_counter_metrics/instance/a_b_1"
        );
    }

    #[test]
    fn test_grouping_url_encodes_instance() {
        let url = grouping_url("http://gateway:9091", GAUGE_JOB_NAME, "odd/name here").unwrap();
        assert_eq!(url.path(), "/metrics/job/payid_gauge_metrics/instance/odd%2Fname%20here");
    }

    #[test]
    fn test_grouping_url_rejects_garbage() {
        assert!(grouping_url("not a url", GAUGE_JOB_NAME, "x").unwrap_err().is_config());
        assert!(grouping_url("mailto:ops@example.com", GAUGE_JOB_NAME, "x").is_err());
    }

    #[test]
    fn test_instances() {
        let config = MetricsConfig {
            domain: Some("example.com".to_string()),
            host_identifier: Some("node-a".to_string()),
            ..MetricsConfig::default()
        };
        assert_eq!(
            counter_instance(&config),
            format!("example.com_node-a_{}", std::process::id())
        );
        assert_eq!(gauge_instance(&config), "example.com");
    }

    #[test]
    #[serial]
    fn test_counter_instance_uses_system_hostname() {
        let saved = std::env::var("HOSTNAME").ok();
        std::env::remove_var("HOSTNAME");

        let config = MetricsConfig {
            domain: Some("example.com".to_string()),
            host_identifier: None,
            ..MetricsConfig::default()
        };
        let instance = counter_instance(&config);

        if let Some(hostname) = saved {
            std::env::set_var("HOSTNAME", hostname);
        }

        let host = gethostname::gethostname().into_string().unwrap();
        assert!(!host.is_empty());
        assert_eq!(
            instance,
            format!("example.com_{}_{}", host, std::process::id())
        );
    }

    #[tokio::test]
    async fn test_additive_push_posts_counters() {
        let (base, mut requests) = spawn_fake_gateway(always(StatusCode::ACCEPTED)).await;
        let counters = LookupCounterRegistry::new().unwrap();
        counters.record_lookup("XRPL", "MAINNET", "example.com", LookupResult::Found);

        let gateway = AdditivePushGateway::new(
            Client::new(),
            &base,
            "example.com_node-a_1",
            counters.registry().clone(),
        )
        .unwrap();
        gateway.push().await.unwrap();

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.path,
            "/metrics/job/payid_counter_metrics/instance/example.com_node-a_1"
        );
        assert!(request.body.contains("payid_lookup_request{"));
    }

    #[tokio::test]
    async fn test_replacing_push_puts_gauges() {
        let (base, mut requests) = spawn_fake_gateway(always(StatusCode::OK)).await;
        let gauges = GaugeRegistry::new().unwrap();
        gauges.set_payid_count("example.com", 5);

        let gateway =
            ReplacingPushGateway::new(Client::new(), &base, "example.com", gauges.registry().clone())
                .unwrap();
        assert_eq!(gateway.kind(), "gauge");
        gateway.push().await.unwrap();

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "PUT");
        assert_eq!(request.path, "/metrics/job/payid_gauge_metrics/instance/example.com");
        assert!(request.body.contains("actual_payid_count{org=\"example.com\"} 5"));
    }

    #[tokio::test]
    async fn test_rejected_push_is_an_error() {
        let (base, _requests) = spawn_fake_gateway(always(StatusCode::INTERNAL_SERVER_ERROR)).await;
        let gauges = GaugeRegistry::new().unwrap();
        let gateway =
            ReplacingPushGateway::new(Client::new(), &base, "example.com", gauges.registry().clone())
                .unwrap();

        let err = gateway.push().await.unwrap_err();
        assert!(matches!(err, MetricsError::Push(_)), "got {:?}", err);
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_an_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let counters = LookupCounterRegistry::new().unwrap();
        let gateway =
            AdditivePushGateway::new(Client::new(), &base, "x", counters.registry().clone()).unwrap();
        assert!(matches!(gateway.push().await, Err(MetricsError::Http(_))));
    }
}
