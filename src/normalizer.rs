//! Translation of raw backend replies into [`PipelineResult`].
//!
//! This is the only place that reads the backend's field names or copes
//! with its loose typing. Nothing here fails: untrusted input degrades to
//! the empty-normalized form and the coercions are recorded in
//! [`Diagnostics`].

use crate::model::{Diagnostics, Metric, PipelineMetrics, PipelineResult, Variant};
use serde_json::{Map, Value};

/// Normalize one side of a compare reply.
///
/// `raw` is the variant's sub-object, or `None` when the reply did not
/// contain it.
pub fn normalize(variant: Variant, raw: Option<&Value>) -> PipelineResult {
    let mut diagnostics = Diagnostics::default();

    let object = match raw {
        Some(Value::Object(object)) => object,
        Some(other) => {
            diagnostics.degraded = true;
            diagnostics.note(format!(
                "'{}' is {}, expected an object",
                variant.wire_key(),
                json_type(other)
            ));
            return PipelineResult::empty(variant, diagnostics);
        }
        None => {
            diagnostics.degraded = true;
            diagnostics.note(format!("'{}' missing from reply", variant.wire_key()));
            return PipelineResult::empty(variant, diagnostics);
        }
    };

    if let Some(error) = object.get("error").filter(|v| !v.is_null()) {
        diagnostics.degraded = true;
        diagnostics.backend_error = Some(stringify(error));
    }

    let answer = match object.get("answer") {
        Some(Value::String(answer)) => answer.clone(),
        None | Some(Value::Null) => {
            if diagnostics.backend_error.is_none() {
                diagnostics.note("answer missing");
            }
            String::new()
        }
        Some(other) => {
            diagnostics.degraded = true;
            diagnostics.note(format!("answer is {}, expected a string", json_type(other)));
            return PipelineResult::empty(variant, diagnostics);
        }
    };

    let metrics = match object.get("metrics") {
        Some(Value::Object(metrics)) => normalize_metrics(metrics, &mut diagnostics),
        None | Some(Value::Null) => {
            if diagnostics.backend_error.is_none() {
                diagnostics.note("metrics missing");
            }
            PipelineMetrics::default()
        }
        Some(other) => {
            diagnostics.degraded = true;
            diagnostics.note(format!("metrics is {}, expected an object", json_type(other)));
            return PipelineResult::empty(variant, diagnostics);
        }
    };

    PipelineResult {
        variant,
        answer,
        metrics,
        diagnostics,
    }
}

fn normalize_metrics(
    raw: &Map<String, Value>,
    diagnostics: &mut Diagnostics,
) -> PipelineMetrics {
    let steps = match raw.get("steps") {
        Some(value) => coerce_count(value).unwrap_or_else(|| {
            diagnostics.note(format!("steps {} clamped to 0", value));
            0
        }),
        None => {
            diagnostics.note("steps missing");
            0
        }
    };

    let latency = raw
        .get("latency_seconds")
        .map(|v| ("latency_seconds", v))
        .or_else(|| raw.get("latency").map(|v| ("latency", v)));

    PipelineMetrics {
        steps,
        retrieved_docs: optional(raw, "retrieved_docs", coerce_count, diagnostics),
        intermediate_steps: intermediate_steps(raw.get("intermediate_steps"), diagnostics),
        tokens: optional(raw, "tokens", coerce_count, diagnostics),
        latency_seconds: match latency {
            Some((name, value)) => coerce_optional(name, value, coerce_seconds, diagnostics),
            None => Metric::Unavailable,
        },
    }
}

fn optional<T>(
    raw: &Map<String, Value>,
    name: &str,
    coerce: fn(&Value) -> Option<T>,
    diagnostics: &mut Diagnostics,
) -> Metric<T> {
    match raw.get(name) {
        Some(value) => coerce_optional(name, value, coerce, diagnostics),
        None => Metric::Unavailable,
    }
}

fn coerce_optional<T>(
    name: &str,
    value: &Value,
    coerce: fn(&Value) -> Option<T>,
    diagnostics: &mut Diagnostics,
) -> Metric<T> {
    if value.is_null() {
        return Metric::Unavailable;
    }
    match coerce(value) {
        Some(v) => Metric::Available(v),
        None => {
            diagnostics.note(format!("{} {} unusable, marked unavailable", name, value));
            Metric::Unavailable
        }
    }
}

/// Non-negative integer from a number or numeric string. Fractions truncate.
fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => coerce_count(&Value::from(s.trim().parse::<f64>().ok()?)),
        _ => None,
    }
}

fn coerce_seconds(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

fn intermediate_steps(
    value: Option<&Value>,
    diagnostics: &mut Diagnostics,
) -> Metric<Vec<String>> {
    match value {
        None | Some(Value::Null) => Metric::Unavailable,
        Some(Value::Array(items)) => Metric::Available(items.iter().map(stringify).collect()),
        Some(other) => {
            diagnostics.note(format!(
                "intermediate_steps was {}, kept as a single entry",
                json_type(other)
            ));
            Metric::Available(vec![stringify(other)])
        }
    }
}

/// Strings pass through unquoted; everything else becomes its JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
