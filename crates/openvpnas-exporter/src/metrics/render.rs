//! Prometheus text exposition format.

use std::collections::HashSet;

use crate::metrics::types::MetricSample;

/// Renders samples into the Prometheus text format, in emission order.
/// `# HELP` / `# TYPE` headers are written once per descriptor, at its first
/// occurrence. No timestamps: every scrape is a fresh live query.
pub fn render_prometheus(samples: &[MetricSample]) -> String {
    let mut output = String::new();
    let mut announced: HashSet<&str> = HashSet::new();

    for sample in samples {
        let descriptor = sample.descriptor.as_ref();
        if announced.insert(descriptor.name.as_str()) {
            output.push_str("# HELP ");
            output.push_str(&descriptor.name);
            output.push(' ');
            output.push_str(&escape_help(&descriptor.help));
            output.push('\n');

            output.push_str("# TYPE ");
            output.push_str(&descriptor.name);
            output.push(' ');
            output.push_str(descriptor.metric_type.as_prometheus_type());
            output.push('\n');
        }

        output.push_str(&descriptor.name);
        if !descriptor.variable_labels.is_empty() {
            output.push('{');
            let pairs = descriptor.variable_labels.iter().zip(&sample.label_values);
            for (index, (name, value)) in pairs.enumerate() {
                if index > 0 {
                    output.push(',');
                }
                output.push_str(name);
                output.push_str("=\"");
                output.push_str(&escape_label_value(value));
                output.push('"');
            }
            output.push('}');
        }
        output.push(' ');
        output.push_str(&format_metric_value(sample.value));
        output.push('\n');
    }

    output
}

fn format_metric_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
