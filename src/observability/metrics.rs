use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub match_attempts_total: IntCounterVec,
    pub match_latency_seconds: HistogramVec,
    pub deliveries_pending: IntGauge,
    pub courier_utilization: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let match_attempts_total = IntCounterVec::new(
            Opts::new("match_attempts_total", "Total match attempts by outcome"),
            &["outcome"],
        )
        .expect("valid match_attempts_total metric");

        let match_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "match_latency_seconds",
                "Latency of match attempts in seconds",
            ),
            &["outcome"],
        )
        .expect("valid match_latency_seconds metric");

        let deliveries_pending = IntGauge::new(
            "deliveries_pending",
            "Current number of deliveries awaiting a courier",
        )
        .expect("valid deliveries_pending metric");

        let courier_utilization = GaugeVec::new(
            Opts::new("courier_utilization", "Courier utilization ratio [0..1]"),
            &["courier_id"],
        )
        .expect("valid courier_utilization metric");

        registry
            .register(Box::new(match_attempts_total.clone()))
            .expect("register match_attempts_total");
        registry
            .register(Box::new(match_latency_seconds.clone()))
            .expect("register match_latency_seconds");
        registry
            .register(Box::new(deliveries_pending.clone()))
            .expect("register deliveries_pending");
        registry
            .register(Box::new(courier_utilization.clone()))
            .expect("register courier_utilization");

        Self {
            registry,
            match_attempts_total,
            match_latency_seconds,
            deliveries_pending,
            courier_utilization,
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
