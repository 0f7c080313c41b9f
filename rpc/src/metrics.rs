//! Prometheus metrics for the RPC server.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that `GET /metrics` encodes
//! into the Prometheus text exposition format.

use prometheus::{register_int_counter_with_registry, Encoder, IntCounter, Opts, Registry, TextEncoder};

pub struct RpcMetrics {
    pub registry: Registry,

    /// Positive or zero grants recorded through `POST /add`.
    pub grants_submitted: IntCounter,
    /// Negative grants that clawed back points.
    pub clawbacks: IntCounter,
    /// Successful spends.
    pub spends: IntCounter,
    /// Points consumed across all successful spends.
    pub points_spent: IntCounter,
    /// Requests answered with a 4xx status.
    pub requests_rejected: IntCounter,
}

impl RpcMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let grants_submitted = register_int_counter_with_registry!(
            Opts::new("points_grants_submitted_total", "Total grants recorded"),
            registry
        )
        .expect("failed to register grants_submitted counter");

        let clawbacks = register_int_counter_with_registry!(
            Opts::new("points_clawbacks_total", "Total clawbacks recorded"),
            registry
        )
        .expect("failed to register clawbacks counter");

        let spends = register_int_counter_with_registry!(
            Opts::new("points_spends_total", "Total successful spends"),
            registry
        )
        .expect("failed to register spends counter");

        let points_spent = register_int_counter_with_registry!(
            Opts::new("points_points_spent_total", "Total points consumed by spends"),
            registry
        )
        .expect("failed to register points_spent counter");

        let requests_rejected = register_int_counter_with_registry!(
            Opts::new(
                "points_requests_rejected_total",
                "Total requests rejected with a client error"
            ),
            registry
        )
        .expect("failed to register requests_rejected counter");

        Self {
            registry,
            grants_submitted,
            clawbacks,
            spends,
            points_spent,
            requests_rejected,
        }
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for RpcMetrics {
    fn default() -> Self {
        Self::new()
    }
}
