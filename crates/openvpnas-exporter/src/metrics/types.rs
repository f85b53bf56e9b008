use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
        }
    }
}

/// Immutable identity of a published measurement. Built once at exporter
/// construction and shared by every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub variable_labels: Vec<String>,
}

impl MetricDescriptor {
    pub fn gauge(name: &str, help: &str, variable_labels: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            help: help.to_string(),
            metric_type: MetricType::Gauge,
            variable_labels: variable_labels
                .iter()
                .map(|label| (*label).to_string())
                .collect(),
        })
    }

    /// Builds one observation against this descriptor. Label values must
    /// match `variable_labels` in count and order.
    pub fn sample(self: &Arc<Self>, label_values: &[&str], value: f64) -> MetricSample {
        debug_assert_eq!(label_values.len(), self.variable_labels.len());
        MetricSample {
            descriptor: Arc::clone(self),
            label_values: label_values
                .iter()
                .map(|value| (*value).to_string())
                .collect(),
            value,
        }
    }
}

/// One emitted observation, produced fresh per scrape.
#[derive(Debug, Clone)]
pub struct MetricSample {
    pub descriptor: Arc<MetricDescriptor>,
    pub label_values: Vec<String>,
    pub value: f64,
}
