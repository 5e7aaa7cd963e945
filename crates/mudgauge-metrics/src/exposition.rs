//! Prometheus-backed sink and text exposition.
//!
//! Renders gauges in the Prometheus text exposition format for scraping by
//! a Prometheus server or compatible agent.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::{debug, warn};

use crate::error::{MetricsError, MetricsResult};
use crate::sink::{MetricDesc, MetricSample, MetricSink};

/// Content type of the text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

struct GaugeEntry {
    labels: Vec<String>,
    vec: GaugeVec,
}

/// Metric sink backed by a private `prometheus::Registry`.
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    gauges: Arc<RwLock<HashMap<String, GaugeEntry>>>,
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            gauges: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Names of all registered series.
    pub fn series(&self) -> Vec<String> {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = gauges.keys().cloned().collect();
        names.sort();
        names
    }

    fn with_gauge(&self, name: &str, labels: &[&str], f: impl FnOnce(&prometheus::Gauge)) {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = gauges.get(name) else {
            warn!(series = %name, "write to unregistered gauge dropped");
            return;
        };
        match entry.vec.get_metric_with_label_values(labels) {
            Ok(gauge) => f(&gauge),
            Err(e) => warn!(
                series = %name,
                expected = entry.labels.len(),
                got = labels.len(),
                error = %e,
                "gauge write dropped"
            ),
        }
    }
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for PrometheusSink {
    fn register_gauge(&self, name: &str, help: &str, labels: &[&str]) -> MetricsResult<()> {
        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = gauges.get(name) {
            if existing.labels.iter().map(String::as_str).eq(labels.iter().copied()) {
                return Ok(());
            }
            return Err(MetricsError::LabelMismatch {
                name: name.to_string(),
                existing: existing.labels.clone(),
                requested: labels.iter().map(|l| l.to_string()).collect(),
            });
        }

        let vec = GaugeVec::new(Opts::new(name, help), labels).map_err(|e| MetricsError::Register {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.registry
            .register(Box::new(vec.clone()))
            .map_err(|e| MetricsError::Register {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        gauges.insert(
            name.to_string(),
            GaugeEntry {
                labels: labels.iter().map(|l| l.to_string()).collect(),
                vec,
            },
        );
        debug!(series = %name, labels = labels.len(), "gauge registered");
        Ok(())
    }

    fn set_gauge(&self, name: &str, labels: &[&str], value: f64) {
        self.with_gauge(name, labels, |g| g.set(value));
    }

    fn add_gauge(&self, name: &str, labels: &[&str], delta: f64) {
        self.with_gauge(name, labels, |g| g.add(delta));
    }

    fn render(&self) -> MetricsResult<String> {
        encode(&self.registry)
    }
}

/// Render a pull-collected batch in the text exposition format.
///
/// An empty batch renders as an empty string.
pub fn encode_samples<const N: usize>(
    desc: &MetricDesc<N>,
    samples: &[MetricSample<N>],
) -> MetricsResult<String> {
    if samples.is_empty() {
        return Ok(String::new());
    }

    let registry = Registry::new();
    let vec = GaugeVec::new(Opts::new(desc.name, desc.help), &desc.labels).map_err(|e| {
        MetricsError::Register {
            name: desc.name.to_string(),
            reason: e.to_string(),
        }
    })?;
    registry
        .register(Box::new(vec.clone()))
        .map_err(|e| MetricsError::Register {
            name: desc.name.to_string(),
            reason: e.to_string(),
        })?;

    for sample in samples {
        let labels: Vec<&str> = sample.labels.iter().map(String::as_str).collect();
        vec.get_metric_with_label_values(&labels)
            .map_err(|e| MetricsError::Encode(e.to_string()))?
            .set(sample.value);
    }

    encode(&registry)
}

fn encode(registry: &Registry) -> MetricsResult<String> {
    let families = registry.gather();
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buf)
        .map_err(|e| MetricsError::Encode(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| MetricsError::Encode(e.to_string()))
}
