//! Metric sink abstraction and typed gauge handles.

use std::fmt;
use std::sync::Arc;

use crate::error::MetricsResult;

/// A registry of named gauge series.
///
/// Writes are last-write-wins per label set. Implementations must allow
/// `render` to run concurrently with `set_gauge`.
pub trait MetricSink: Send + Sync {
    /// Declare a gauge series with an ordered set of label names.
    ///
    /// Registering the same name again with identical labels is a no-op;
    /// different labels are an error.
    fn register_gauge(&self, name: &str, help: &str, labels: &[&str]) -> MetricsResult<()>;

    /// Overwrite the value of one label set of a registered series.
    fn set_gauge(&self, name: &str, labels: &[&str], value: f64);

    /// Add `delta` to the value of one label set of a registered series.
    fn add_gauge(&self, name: &str, labels: &[&str], delta: f64);

    /// Render every registered series as text exposition.
    fn render(&self) -> MetricsResult<String>;
}

/// Handle to a registered gauge with exactly `N` labels.
///
/// The only way to write through a handle is with a `[&str; N]`, so a
/// label tuple of the wrong arity is rejected by the compiler rather than
/// at scrape time.
#[derive(Clone)]
pub struct GaugeSeries<const N: usize> {
    sink: Arc<dyn MetricSink>,
    name: String,
}

impl<const N: usize> GaugeSeries<N> {
    /// Register `name` on `sink` and return a handle to it.
    pub fn register(
        sink: Arc<dyn MetricSink>,
        name: &str,
        help: &str,
        labels: [&str; N],
    ) -> MetricsResult<Self> {
        sink.register_gauge(name, help, &labels)?;
        Ok(Self {
            sink,
            name: name.to_string(),
        })
    }

    pub fn set(&self, labels: [&str; N], value: f64) {
        self.sink.set_gauge(&self.name, &labels, value);
    }

    pub fn add(&self, labels: [&str; N], delta: f64) {
        self.sink.add_gauge(&self.name, &labels, delta);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<const N: usize> fmt::Debug for GaugeSeries<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeSeries")
            .field("name", &self.name)
            .field("labels", &N)
            .finish()
    }
}

/// Static description of a gauge produced on demand by a pull collector.
#[derive(Debug, Clone, Copy)]
pub struct MetricDesc<const N: usize> {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: [&'static str; N],
}

/// One value of a pull-collected gauge, labelled in `MetricDesc` order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample<const N: usize> {
    pub labels: [String; N],
    pub value: f64,
}

impl<const N: usize> MetricDesc<N> {
    /// Build a sample of this gauge.
    pub fn sample(&self, labels: [String; N], value: f64) -> MetricSample<N> {
        MetricSample { labels, value }
    }

    /// Index of a label by name.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| *l == label)
    }
}

impl<const N: usize> MetricSample<N> {
    /// Value of a label, looked up through its description.
    pub fn label<'a>(&'a self, desc: &MetricDesc<N>, label: &str) -> Option<&'a str> {
        desc.label_index(label).map(|i| self.labels[i].as_str())
    }
}
