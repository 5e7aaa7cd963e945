//! mudgauge-metrics — the metric sink shared by all publishers.
//!
//! Publishers never touch a global registry. The composition root creates
//! one [`PrometheusSink`] and hands it (as `Arc<dyn MetricSink>`) to every
//! job, collector, and HTTP handler.
//!
//! # Architecture
//!
//! ```text
//! MetricSink (trait)
//!   ├── PrometheusSink → prometheus::Registry, text exposition
//!   └── RecordingSink  → records calls (feature = "test-util")
//!
//! GaugeSeries<N>
//!   └── typed handle: label arity fixed at registration
//!
//! encode_samples()
//!   └── renders a pull-collector batch (MetricDesc<N> + MetricSample<N>)
//! ```

pub mod error;
pub mod exposition;
pub mod sink;

#[cfg(any(test, feature = "test-util"))]
pub mod recording;

pub use error::{MetricsError, MetricsResult};
pub use exposition::{PrometheusSink, TEXT_CONTENT_TYPE, encode_samples};
pub use sink::{GaugeSeries, MetricDesc, MetricSample, MetricSink};

#[cfg(any(test, feature = "test-util"))]
pub use recording::{GaugeUpdate, RecordingSink};
