//! A sink that records every call, for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::error::{MetricsError, MetricsResult};
use crate::sink::MetricSink;

/// One recorded gauge write.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeUpdate {
    pub name: String,
    pub labels: Vec<String>,
    pub value: f64,
}

#[derive(Default)]
struct Recorded {
    series: HashMap<String, Vec<String>>,
    updates: Vec<GaugeUpdate>,
    values: BTreeMap<(String, Vec<String>), f64>,
}

/// In-memory `MetricSink` that keeps a log of writes and the current
/// value of every label set.
#[derive(Default)]
pub struct RecordingSink {
    inner: Mutex<Recorded>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes in call order.
    pub fn updates(&self) -> Vec<GaugeUpdate> {
        self.inner.lock().unwrap().updates.clone()
    }

    /// Writes to one series in call order.
    pub fn updates_for(&self, name: &str) -> Vec<GaugeUpdate> {
        self.updates().into_iter().filter(|u| u.name == name).collect()
    }

    /// Current value of one label set.
    pub fn value(&self, name: &str, labels: &[&str]) -> Option<f64> {
        let key = (name.to_string(), labels.iter().map(|l| l.to_string()).collect());
        self.inner.lock().unwrap().values.get(&key).copied()
    }

    /// Number of distinct label sets written for a series.
    pub fn series_len(&self, name: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .values
            .keys()
            .filter(|(n, _)| n == name)
            .count()
    }

    fn write(&self, name: &str, labels: &[&str], apply: impl FnOnce(Option<f64>) -> f64) {
        let mut inner = self.inner.lock().unwrap();
        let arity_ok = inner
            .series
            .get(name)
            .is_some_and(|declared| declared.len() == labels.len());
        if !arity_ok {
            return;
        }

        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let key = (name.to_string(), labels.clone());
        let value = apply(inner.values.get(&key).copied());
        inner.values.insert(key, value);
        inner.updates.push(GaugeUpdate {
            name: name.to_string(),
            labels,
            value,
        });
    }
}

impl MetricSink for RecordingSink {
    fn register_gauge(&self, name: &str, _help: &str, labels: &[&str]) -> MetricsResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let requested: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        match inner.series.get(name) {
            Some(existing) if *existing == requested => Ok(()),
            Some(existing) => Err(MetricsError::LabelMismatch {
                name: name.to_string(),
                existing: existing.clone(),
                requested,
            }),
            None => {
                inner.series.insert(name.to_string(), requested);
                Ok(())
            }
        }
    }

    fn set_gauge(&self, name: &str, labels: &[&str], value: f64) {
        self.write(name, labels, |_| value);
    }

    fn add_gauge(&self, name: &str, labels: &[&str], delta: f64) {
        self.write(name, labels, |current| current.unwrap_or(0.0) + delta);
    }

    fn render(&self) -> MetricsResult<String> {
        let inner = self.inner.lock().unwrap();
        let mut out = String::new();
        for ((name, labels), value) in &inner.values {
            out.push_str(&format!("{name}{labels:?} {value}\n"));
        }
        Ok(out)
    }
}
