//! Turns an untrusted JSON payload into a complete [`AnalysisResult`]
//!
//! `scores`, `findings` and `overall_score` are load-bearing and never
//! fabricated. Everything below them is repaired: missing category scores
//! default to a neutral 50, missing finding lists to empty, scores are rounded
//! and clamped, and unknown severities become `minor`.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{AuditError, Result};
use crate::models::{AnalysisResult, Category, Finding, Findings, ScoreBreakdown, Severity};

/// Neutral midpoint for a category the model did not score
pub const DEFAULT_CATEGORY_SCORE: u8 = 50;

pub fn normalize(payload: Value) -> Result<AnalysisResult> {
    let Value::Object(mut root) = payload else {
        return Err(invalid("payload is not a JSON object"));
    };

    let scores = take_required(&mut root, "scores")?;
    let findings = take_required(&mut root, "findings")?;
    let overall = take_required(&mut root, "overall_score")?;

    let Value::Object(scores) = scores else {
        return Err(invalid("scores is not an object"));
    };
    let Value::Object(mut findings) = findings else {
        return Err(invalid("findings is not an object"));
    };
    let overall_score = overall
        .as_f64()
        .map(clamp_score)
        .ok_or_else(|| invalid("overall_score is not a number"))?;

    let mut breakdown = ScoreBreakdown::uniform(DEFAULT_CATEGORY_SCORE);
    let mut normalized = Findings::default();
    for category in Category::ALL {
        match scores.get(category.key()).and_then(Value::as_f64) {
            Some(score) => breakdown.set(category, clamp_score(score)),
            None => warn!(
                "scores.{} missing or not numeric, defaulting to {}",
                category, DEFAULT_CATEGORY_SCORE
            ),
        }

        let entries = match findings.remove(category.key()) {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                warn!("findings.{} is not an array ({}), using []", category, kind_of(&other));
                Vec::new()
            }
        };
        *normalized.get_mut(category) = entries
            .into_iter()
            .filter_map(|entry| normalize_finding(category, entry))
            .collect();
    }

    Ok(AnalysisResult {
        scores: breakdown,
        findings: normalized,
        recommendations: normalize_recommendations(root.remove("recommendations")),
        overall_score,
        summary: match root.remove("summary") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        },
    })
}

fn invalid(message: &str) -> AuditError {
    AuditError::InvalidStructure {
        message: message.to_string(),
    }
}

fn take_required(root: &mut Map<String, Value>, key: &str) -> Result<Value> {
    match root.remove(key) {
        Some(Value::Null) | None => Err(AuditError::InvalidStructure {
            message: format!("missing required field `{key}`"),
        }),
        Some(value) => Ok(value),
    }
}

/// Round half away from zero, then clamp into 0..=100
pub fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

fn normalize_finding(category: Category, entry: Value) -> Option<Finding> {
    let mut fields = match entry {
        Value::Object(fields) => fields,
        Value::String(observation) if !observation.trim().is_empty() => {
            return Some(Finding {
                observation: observation.trim().to_string(),
                location: None,
                severity: Severity::Minor,
            });
        }
        other => {
            warn!("dropping {} finding entry of type {}", category, kind_of(&other));
            return None;
        }
    };

    let observation = match fields.remove("observation") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            warn!("dropping {} finding without an observation", category);
            return None;
        }
    };

    let location = match fields.remove("location") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let severity = match fields.remove("severity") {
        Some(Value::String(raw)) => Severity::parse(&raw).unwrap_or_else(|| {
            warn!("unknown severity {:?} on {} finding, coercing to minor", raw, category);
            Severity::Minor
        }),
        _ => {
            warn!("{} finding has no severity, coercing to minor", category);
            Severity::Minor
        }
    };

    Some(Finding {
        observation,
        location,
        severity,
    })
}

fn normalize_recommendations(raw: Option<Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
