use prometheus::{
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub deliveries_total: IntCounterVec,
    pub active_delivery: IntGauge,
    pub status_transitions_total: IntCounterVec,
    pub transitions_rejected_total: IntCounter,
    pub delivery_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let deliveries_total = IntCounterVec::new(
            Opts::new("deliveries_total", "Completed deliveries by outcome"),
            &["outcome"],
        )
        .expect("valid deliveries_total metric");

        let active_delivery = IntGauge::new(
            "active_delivery",
            "1 while a delivery is in progress, 0 otherwise",
        )
        .expect("valid active_delivery metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Lifecycle transitions entered, by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let transitions_rejected_total = IntCounter::new(
            "transitions_rejected_total",
            "Transition requests rejected by the edge table",
        )
        .expect("valid transitions_rejected_total metric");

        let delivery_duration_seconds = Histogram::with_opts(prometheus::HistogramOpts::new(
            "delivery_duration_seconds",
            "Wall-clock time from request to delivered",
        ))
        .expect("valid delivery_duration_seconds metric");

        registry
            .register(Box::new(deliveries_total.clone()))
            .expect("register deliveries_total");
        registry
            .register(Box::new(active_delivery.clone()))
            .expect("register active_delivery");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(transitions_rejected_total.clone()))
            .expect("register transitions_rejected_total");
        registry
            .register(Box::new(delivery_duration_seconds.clone()))
            .expect("register delivery_duration_seconds");

        Self {
            registry,
            deliveries_total,
            active_delivery,
            status_transitions_total,
            transitions_rejected_total,
            delivery_duration_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
