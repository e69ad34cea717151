//! Two-phase record checking.
//!
//! 1. **Structural**: the record's JSON form is validated against
//!    `RecordSchema::json_schema` with the `jsonschema` crate.
//! 2. **Field rules**: every `ValidationRule` is evaluated in order.
//!
//! All failures are collected so the caller can show every problem with a
//! registration form at once.

use serde_json::Value;
use tracing::{debug, warn};

use lifesync_contracts::validate::{RecordSchema, ValidationFailure, ValidationReport, ValidationRuleType};

/// Resolve a dotted path such as `contacts.0.phone_number`.
///
/// Numeric segments index into arrays. Returns `None` when a segment is
/// missing or the value is JSON `null`.
fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = value;
    for segment in path.split('.') {
        let next = match current {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => current.get(segment),
        };
        match next {
            Some(v) if !v.is_null() => current = v,
            _ => return None,
        }
    }
    Some(current)
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().is_empty())
}

/// Check `record` against `schema`.
pub fn check_record(record: &Value, schema: &RecordSchema) -> ValidationReport {
    let mut failures: Vec<ValidationFailure> = Vec::new();

    // ── Phase 1: structure ───────────────────────────────────────────────────
    if !schema.json_schema.is_null() {
        match jsonschema::validator_for(&schema.json_schema) {
            Ok(validator) => {
                for error in validator.iter_errors(record) {
                    let message = format!("schema violation at '{}': {}", error.instance_path, error);
                    warn!(schema_id = %schema.schema_id, %message, "structural check failed");
                    failures.push(ValidationFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    });
                }
            }
            Err(e) => {
                let message = format!("invalid JSON Schema document: {e}");
                warn!(schema_id = %schema.schema_id, %message, "schema compilation failed");
                failures.push(ValidationFailure {
                    rule_id: "json-schema".to_string(),
                    message,
                });
            }
        }
    }

    // ── Phase 2: field rules ─────────────────────────────────────────────────
    for rule in &schema.rules {
        debug!(rule_id = %rule.rule_id, "evaluating rule");

        let failure: Option<String> = match &rule.rule_type {
            ValidationRuleType::RequiredField { field_path } => {
                match resolve_path(record, field_path) {
                    Some(v) if !is_blank(v) => None,
                    _ => Some(format!("'{field_path}' is required")),
                }
            }

            ValidationRuleType::AllowedValues { field_path, allowed } => {
                match resolve_path(record, field_path) {
                    None => Some(format!("'{field_path}' is missing")),
                    Some(v) if allowed.contains(v) => None,
                    Some(v) => Some(format!("'{field_path}' has value {v}, which is not allowed")),
                }
            }

            ValidationRuleType::NumberRange { field_path, min, max } => {
                match resolve_path(record, field_path).and_then(Value::as_f64) {
                    None => Some(format!("'{field_path}' must be a number")),
                    Some(n) if n >= *min && n <= *max => None,
                    Some(n) => Some(format!("'{field_path}' is {n}, expected {min}..={max}")),
                }
            }

            ValidationRuleType::MustContain { field_path, needle } => {
                match resolve_path(record, field_path).and_then(Value::as_str) {
                    Some(s) if s.contains(needle.as_str()) => None,
                    _ => Some(format!("'{field_path}' must contain '{needle}'")),
                }
            }

            ValidationRuleType::EachItemRequires { field_path, item_field } => {
                match resolve_path(record, field_path).and_then(Value::as_array) {
                    None => None,
                    Some(items) => items
                        .iter()
                        .position(|item| match resolve_path(item, item_field) {
                            Some(v) => is_blank(v),
                            None => true,
                        })
                        .map(|i| format!("'{field_path}.{i}.{item_field}' is required")),
                }
            }
        };

        if let Some(message) = failure {
            warn!(rule_id = %rule.rule_id, %message, "rule failed");
            failures.push(ValidationFailure {
                rule_id: rule.rule_id.clone(),
                message,
            });
        }
    }

    let passed = failures.is_empty();
    debug!(
        schema_id = %schema.schema_id,
        passed,
        failure_count = failures.len(),
        "record check complete"
    );
    ValidationReport { passed, failures }
}
