//! PayID metrics manager
//!
//! Owns the lookup counter and gauge registries, the two host-supplied count
//! fetchers, and the two recurring jobs (count generation and gateway push).
//! The host constructs one instance at startup, shares it with its request
//! handlers, and stops it on shutdown.

use crate::check::check_metrics_configuration;
use crate::config::MetricsConfig;
use crate::error::Result;
use crate::fetch::{AddressCountFetcher, PayIdCountFetcher};
use crate::monitoring::gateway::{
    counter_instance, gauge_instance, AdditivePushGateway, MetricsPusher, ReplacingPushGateway,
};
use crate::monitoring::registry::{GaugeRegistry, LookupCounterRegistry};
use crate::monitoring::timer::{RecurringTask, TickStart};
use crate::types::LookupResult;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Environment label recorded when a lookup did not name one
pub const NULL_ENVIRONMENT: &str = "null";

/// Metrics for one PayID server
///
/// All methods take `&self`; wrap the instance in an `Arc` to share it.
/// Dropping it cancels both recurring jobs.
pub struct Metrics {
    inner: Arc<MetricsInner>,
    generation_task: Mutex<Option<RecurringTask>>,
    push_task: Mutex<Option<RecurringTask>>,
}

struct MetricsInner {
    config: RwLock<MetricsConfig>,
    address_counts: Box<dyn AddressCountFetcher>,
    payid_count: Box<dyn PayIdCountFetcher>,
    lookups: LookupCounterRegistry,
    gauges: GaugeRegistry,
}

impl Metrics {
    /// Create a metrics manager. No jobs are scheduled and no I/O is done.
    ///
    /// # Arguments
    ///
    /// * `config` - Controls the `org` label, generation and push
    /// * `address_counts` - Retrieves address counts by payment network and environment
    /// * `payid_count` - Retrieves the total number of PayIDs
    pub fn new<A, P>(config: MetricsConfig, address_counts: A, payid_count: P) -> Result<Self>
    where
        A: AddressCountFetcher + 'static,
        P: PayIdCountFetcher + 'static,
    {
        let inner = MetricsInner {
            config: RwLock::new(config),
            address_counts: Box::new(address_counts),
            payid_count: Box::new(payid_count),
            lookups: LookupCounterRegistry::new()?,
            gauges: GaugeRegistry::new()?,
        };

        Ok(Self {
            inner: Arc::new(inner),
            generation_task: Mutex::new(None),
            push_task: Mutex::new(None),
        })
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> MetricsConfig {
        self.inner.config().clone()
    }

    /// Replace the configuration
    ///
    /// Recordings pick up the new `org` label right away; intervals and push
    /// settings apply on the next scheduling call.
    pub fn set_config(&self, config: MetricsConfig) {
        *self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Whether either recurring job is currently scheduled
    pub fn is_running(&self) -> bool {
        is_armed(&self.generation_task) || is_armed(&self.push_task)
    }

    /// Generate address and PayID count metrics now and every refresh interval
    ///
    /// A previously scheduled generation job is replaced. Fetch failures are
    /// logged and the job keeps running.
    ///
    /// # Errors
    ///
    /// Returns the validation error for an invalid config, or a runtime error
    /// when called outside a tokio runtime. No job is scheduled in either case.
    pub fn schedule_recurring_generation(&self) -> Result<()> {
        let config = self.config();
        check_metrics_configuration(&config)?;

        let inner = Arc::clone(&self.inner);
        let task = RecurringTask::spawn(
            "metrics generation",
            config.refresh_interval(),
            TickStart::Immediately,
            move || run_generation_cycle(Arc::clone(&inner)),
        )?;

        self.inner.update_info_gauge(&config);
        replace_task(&self.generation_task, task);

        info!(
            "Scheduled PayID count metrics generation every {}s",
            config.payid_count_refresh_interval_in_seconds
        );
        Ok(())
    }

    /// Push both registries to the gateway every push interval
    ///
    /// Does nothing when pushing is disabled. A previously scheduled push job
    /// is replaced. Push failures are logged and the job keeps running.
    ///
    /// # Errors
    ///
    /// Returns the validation error for an invalid config, a transport error
    /// if the HTTP client cannot be built, or a runtime error when called
    /// outside a tokio runtime.
    pub fn schedule_recurring_push(&self) -> Result<()> {
        let config = self.config();
        if !config.push_metrics {
            debug!("Metrics push disabled, not scheduling");
            return Ok(());
        }

        check_metrics_configuration(&config)?;

        let gateway_url = config.gateway_url.as_deref().unwrap_or_default();
        let client = reqwest::Client::builder().build()?;
        let counters = Arc::new(AdditivePushGateway::new(
            client.clone(),
            gateway_url,
            &counter_instance(&config),
            self.inner.lookups.registry().clone(),
        )?);
        let gauges = Arc::new(ReplacingPushGateway::new(
            client,
            gateway_url,
            &gauge_instance(&config),
            self.inner.gauges.registry().clone(),
        )?);

        info!(
            "Scheduled metrics push every {}s to {} and {}",
            config.push_interval_in_seconds,
            counters.url(),
            gauges.url()
        );

        let task = RecurringTask::spawn(
            "metrics push",
            config.push_interval(),
            TickStart::AfterPeriod,
            move || {
                let counters = Arc::clone(&counters);
                let gauges = Arc::clone(&gauges);
                async move {
                    tokio::join!(push_logged(counters.as_ref()), push_logged(gauges.as_ref()));
                }
            },
        )?;

        replace_task(&self.push_task, task);
        Ok(())
    }

    /// Cancel both recurring jobs. Safe to call repeatedly.
    ///
    /// Cycles already in flight are not aborted.
    pub fn stop_metrics(&self) {
        let generation = lock(&self.generation_task).take();
        let push = lock(&self.push_task).take();

        if generation.is_some() || push.is_some() {
            info!("Stopping recurring metrics jobs");
        }
        // Dropping the handles cancels them
        drop(generation);
        drop(push);
    }

    /// Count a PayID lookup, labelled by whether it was found
    ///
    /// A missing environment is recorded as `"null"`.
    pub fn record_lookup_result(&self, found: bool, payment_network: &str, environment: Option<&str>) {
        let config = self.inner.config();
        self.inner.lookups.record_lookup(
            payment_network,
            environment.unwrap_or(NULL_ENVIRONMENT),
            config.org_label(),
            LookupResult::from(found),
        );
    }

    /// Count a lookup rejected because of its Accept header
    pub fn record_lookup_bad_accept_header(&self) {
        let config = self.inner.config();
        self.inner.lookups.record_lookup(
            "unknown",
            "unknown",
            config.org_label(),
            LookupResult::BadAcceptHeader,
        );
    }

    /// All PayID metrics in Prometheus text format, counters first
    pub fn metrics_text(&self) -> Result<String> {
        let mut text = self.inner.lookups.render()?;
        text.push_str(&self.inner.gauges.render()?);
        Ok(text)
    }

    /// Fetch address counts and set the address gauge
    ///
    /// # Errors
    ///
    /// Propagates the fetcher's error; the gauge keeps its previous values.
    pub async fn generate_address_count_metrics(&self) -> Result<()> {
        self.inner.generate_address_count_metrics().await
    }

    /// Fetch the PayID count and set the PayID gauge
    ///
    /// # Errors
    ///
    /// Propagates the fetcher's error; the gauge keeps its previous value.
    pub async fn generate_payid_count_metrics(&self) -> Result<()> {
        self.inner.generate_payid_count_metrics().await
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("config", &*self.inner.config())
            .field("generation_scheduled", &is_armed(&self.generation_task))
            .field("push_scheduled", &is_armed(&self.push_task))
            .finish()
    }
}

impl MetricsInner {
    fn config(&self) -> RwLockReadGuard<'_, MetricsConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn generate_address_count_metrics(&self) -> Result<()> {
        let address_counts = self.address_counts.fetch_address_counts().await?;

        let config = self.config();
        for address_count in &address_counts {
            self.gauges.set_address_count(
                &address_count.payment_network,
                &address_count.environment,
                config.org_label(),
                address_count.count,
            );
        }

        debug!("Updated address counts for {} pairs", address_counts.len());
        Ok(())
    }

    async fn generate_payid_count_metrics(&self) -> Result<()> {
        let payid_count = self.payid_count.fetch_payid_count().await?;

        self.gauges
            .set_payid_count(self.config().org_label(), payid_count);

        debug!("Updated PayID count to {}", payid_count);
        Ok(())
    }

    fn update_info_gauge(&self, config: &MetricsConfig) {
        self.gauges.set_server_info(
            config.org_label(),
            config.server_agent_label(),
            &config.payid_protocol_version,
        );
    }
}

async fn run_generation_cycle(inner: Arc<MetricsInner>) {
    let (addresses, payids) = tokio::join!(
        inner.generate_address_count_metrics(),
        inner.generate_payid_count_metrics()
    );

    if let Err(e) = addresses {
        warn!("Failed to generate scheduled address count metrics: {}", e);
    }
    if let Err(e) = payids {
        warn!("Failed to generate scheduled PayID count metrics: {}", e);
    }
}

async fn push_logged(pusher: &dyn MetricsPusher) {
    if let Err(e) = pusher.push().await {
        warn!("{} metrics push failed with {}", pusher.kind(), e);
    }
}

fn lock(slot: &Mutex<Option<RecurringTask>>) -> MutexGuard<'_, Option<RecurringTask>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_armed(slot: &Mutex<Option<RecurringTask>>) -> bool {
    lock(slot).as_ref().is_some_and(|task| !task.is_cancelled())
}

fn replace_task(slot: &Mutex<Option<RecurringTask>>, task: RecurringTask) {
    if let Some(previous) = lock(slot).replace(task) {
        debug!("Replacing previously scheduled job");
        previous.cancel();
    }
}
