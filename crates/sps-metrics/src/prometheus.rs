//! Prometheus text exposition format.
//!
//! Renders placement score points into the Prometheus text exposition
//! format, one gauge sample per series, with every dimension carried as a
//! snake_case label.

use crate::sink::MetricDatum;

/// Render `(namespace, point)` pairs into Prometheus text format.
pub fn render_prometheus(series: &[(&str, &MetricDatum)]) -> String {
    let mut out = String::new();

    out.push_str("# HELP sps_placement_score Spot placement score (0-10) per diversified configuration.\n");
    out.push_str("# TYPE sps_placement_score gauge\n");
    for (namespace, datum) in series {
        let mut labels = vec![
            ("metric".to_string(), datum.metric_name.as_str()),
            ("namespace".to_string(), *namespace),
        ];
        for d in &datum.dimensions {
            labels.push((snake_case(&d.name), d.value.as_str()));
        }
        let labels = labels
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&format!("sps_placement_score{{{labels}}} {}\n", datum.value));
    }

    out
}

/// `AvailabilityZoneId` → `availability_zone_id`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
