//! Record validation schema and report types.
//!
//! Registration records (profiles, facility accounts) are checked against a
//! `RecordSchema` before they are persisted. Only a passing
//! `ValidationReport` lets the write proceed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything a record is checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Unique identifier for this schema (e.g. "citizen-profile-v1").
    pub schema_id: String,
    /// A JSON Schema document used for structural validation.
    pub json_schema: Value,
    /// Field rules evaluated after structural validation.
    pub rules: Vec<ValidationRule>,
}

/// A single named rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Referenced in failure reports.
    pub rule_id: String,
    pub description: String,
    pub rule_type: ValidationRuleType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationRuleType {
    /// The field at `field_path` must be present, non-null and, for
    /// strings, not blank.
    RequiredField {
        /// Dotted path, e.g. "contacts.0.phone_number".
        field_path: String,
    },

    /// The field at `field_path` must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// The numeric field at `field_path` must lie within `[min, max]`.
    NumberRange {
        field_path: String,
        min: f64,
        max: f64,
    },

    /// The string field at `field_path` must contain `needle`.
    MustContain {
        field_path: String,
        needle: String,
    },

    /// Every element of the array at `field_path` must have a non-blank
    /// value at `item_field`.
    EachItemRequires {
        field_path: String,
        item_field: String,
    },
}

/// The result of running a `RecordSchema` against a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if all rules passed.
    pub passed: bool,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    /// Failures joined as `[rule] message; ...`.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub rule_id: String,
    pub message: String,
}
