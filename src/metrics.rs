//! Chart-ready aggregates of a comparison.
//!
//! Rows come out in a fixed display order. A metric a side did not report
//! is carried as [`Metric::Unavailable`]; nothing is ever filled in.

use crate::model::{ComparisonResult, Metric, PipelineMetrics};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Metrics that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    Steps,
    Tokens,
    LatencySeconds,
    RetrievedDocs,
}

impl MetricKey {
    /// Display order of chart rows.
    pub const DISPLAY_ORDER: [MetricKey; 4] = [
        MetricKey::Steps,
        MetricKey::Tokens,
        MetricKey::LatencySeconds,
        MetricKey::RetrievedDocs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::Steps => "Steps",
            MetricKey::Tokens => "Tokens",
            MetricKey::LatencySeconds => "Latency (s)",
            MetricKey::RetrievedDocs => "Retrieved Docs",
        }
    }

    fn read(&self, metrics: &PipelineMetrics) -> Metric<f64> {
        match self {
            MetricKey::Steps => Metric::Available(metrics.steps as f64),
            MetricKey::Tokens => metrics.tokens.map(|v| *v as f64),
            MetricKey::LatencySeconds => metrics.latency_seconds,
            MetricKey::RetrievedDocs => metrics.retrieved_docs.map(|v| *v as f64),
        }
    }

    fn format(&self, value: &Metric<f64>) -> String {
        match (self, value) {
            (_, Metric::Unavailable) => "n/a".to_string(),
            (MetricKey::LatencySeconds, Metric::Available(v)) => format!("{:.2}", v),
            (_, Metric::Available(v)) => format!("{}", v.round() as u64),
        }
    }
}

/// One bar group of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub key: MetricKey,
    pub label: String,
    pub standard_value: Metric<f64>,
    pub agentic_value: Metric<f64>,
}

/// Ordered chart rows for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartSeries {
    rows: Vec<ChartRow>,
}

impl ChartSeries {
    pub fn rows(&self) -> &[ChartRow] {
        &self.rows
    }

    pub fn get(&self, key: MetricKey) -> Option<&ChartRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a plain-text table.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<16} {:>10} {:>10}", "Metric", "Standard", "Agentic");
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:<16} {:>10} {:>10}",
                row.label,
                row.key.format(&row.standard_value),
                row.key.format(&row.agentic_value)
            );
        }
        out
    }
}

/// Build the chart rows for a comparison.
///
/// `steps` is always present; the optional metrics appear when at least
/// one side reports them.
pub fn aggregate(result: &ComparisonResult) -> ChartSeries {
    let standard = &result.standard().metrics;
    let agentic = &result.agentic().metrics;

    let rows = MetricKey::DISPLAY_ORDER
        .iter()
        .filter_map(|key| {
            let standard_value = key.read(standard);
            let agentic_value = key.read(agentic);
            let present = *key == MetricKey::Steps
                || standard_value.is_available()
                || agentic_value.is_available();
            present.then(|| ChartRow {
                key: *key,
                label: key.label().to_string(),
                standard_value,
                agentic_value,
            })
        })
        .collect();

    ChartSeries { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Diagnostics, PipelineResult, Variant};
    use std::time::Duration;

    fn result(standard: PipelineMetrics, agentic: PipelineMetrics) -> ComparisonResult {
        let side = |variant, metrics| PipelineResult {
            variant,
            answer: String::new(),
            metrics,
            diagnostics: Diagnostics::default(),
        };
        ComparisonResult::new(
            "q",
            "d1",
            side(Variant::Standard, standard),
            side(Variant::Agentic, agentic),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_steps_only() {
        let series = aggregate(&result(
            PipelineMetrics::default(),
            PipelineMetrics::default(),
        ));
        assert_eq!(series.len(), 1);
        let row = &series.rows()[0];
        assert_eq!(row.key, MetricKey::Steps);
        assert_eq!(row.standard_value, Metric::Available(0.0));
        assert_eq!(row.agentic_value, Metric::Available(0.0));
    }

    #[test]
    fn test_one_sided_metric_is_no_data_not_zero() {
        let series = aggregate(&result(
            PipelineMetrics {
                steps: 1,
                retrieved_docs: Metric::Available(3),
                ..Default::default()
            },
            PipelineMetrics {
                steps: 4,
                ..Default::default()
            },
        ));

        let row = series.get(MetricKey::RetrievedDocs).unwrap();
        assert_eq!(row.standard_value, Metric::Available(3.0));
        assert_eq!(row.agentic_value, Metric::Unavailable);
        assert!(series.get(MetricKey::LatencySeconds).is_none());
        assert!(series.get(MetricKey::Tokens).is_none());
    }

    #[test]
    fn test_display_order() {
        let full = PipelineMetrics {
            steps: 2,
            retrieved_docs: Metric::Available(5),
            intermediate_steps: Metric::Available(vec!["a".into()]),
            tokens: Metric::Available(100),
            latency_seconds: Metric::Available(1.5),
        };
        let series = aggregate(&result(full.clone(), full));
        let keys: Vec<_> = series.rows().iter().map(|r| r.key).collect();
        assert_eq!(keys, MetricKey::DISPLAY_ORDER.to_vec());
    }

    #[test]
    fn test_no_placeholder_latency() {
        let series = aggregate(&result(
            PipelineMetrics {
                steps: 1,
                ..Default::default()
            },
            PipelineMetrics {
                steps: 3,
                latency_seconds: Metric::Available(3.5),
                ..Default::default()
            },
        ));
        let row = series.get(MetricKey::LatencySeconds).unwrap();
        assert_eq!(row.standard_value, Metric::Unavailable);
        assert_eq!(row.agentic_value, Metric::Available(3.5));
    }

    #[test]
    fn test_json_uses_null_for_no_data() {
        let series = aggregate(&result(
            PipelineMetrics {
                steps: 1,
                retrieved_docs: Metric::Available(0),
                ..Default::default()
            },
            PipelineMetrics::default(),
        ));
        let json = serde_json::to_value(&series).unwrap();
        let row = &json["rows"][1];
        assert_eq!(row["key"], "retrievedDocs");
        assert_eq!(row["label"], "Retrieved Docs");
        assert_eq!(row["standardValue"], 0.0);
        assert!(row["agenticValue"].is_null());
    }

    #[test]
    fn test_render_table() {
        let series = aggregate(&result(
            PipelineMetrics {
                steps: 1,
                retrieved_docs: Metric::Available(3),
                latency_seconds: Metric::Available(1.234),
                ..Default::default()
            },
            PipelineMetrics {
                steps: 4,
                ..Default::default()
            },
        ));
        let table = series.render_table();
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Steps"));
        assert!(lines[2].contains("1.23") && lines[2].contains("n/a"));
        assert!(lines[3].starts_with("Retrieved Docs") && lines[3].contains('3'));
    }
}
