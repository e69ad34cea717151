//! The registration schemas.

use serde_json::json;

use lifesync_contracts::validate::{RecordSchema, ValidationRule, ValidationRuleType};

/// Accepted blood groups.
pub const BLOOD_GROUPS: [&str; 8] = ["O+", "O-", "A+", "A-", "B+", "B-", "AB+", "AB-"];

fn rule(id: &str, description: &str, rule_type: ValidationRuleType) -> ValidationRule {
    ValidationRule {
        rule_id: id.to_string(),
        description: description.to_string(),
        rule_type,
    }
}

fn required(id: &str, field: &str) -> ValidationRule {
    rule(
        id,
        &format!("{field} must be present"),
        ValidationRuleType::RequiredField {
            field_path: field.to_string(),
        },
    )
}

pub fn citizen_profile_schema() -> RecordSchema {
    RecordSchema {
        schema_id: "citizen-profile-v1".to_string(),
        json_schema: json!({
            "type": "object",
            "required": ["name", "age", "blood_group", "phone", "contacts"],
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer", "minimum": 0 },
                "blood_group": { "type": "string" },
                "phone": { "type": "string" },
                "email": { "type": "string" },
                "contacts": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["display_name", "phone_number"]
                    }
                }
            }
        }),
        rules: vec![
            required("name-required", "name"),
            required("blood-group-required", "blood_group"),
            required("phone-required", "phone"),
            rule(
                "age-range",
                "age must be a plausible human age",
                ValidationRuleType::NumberRange {
                    field_path: "age".to_string(),
                    min: 1.0,
                    max: 150.0,
                },
            ),
            rule(
                "blood-group-known",
                "blood group must be one of the ABO/Rh groups",
                ValidationRuleType::AllowedValues {
                    field_path: "blood_group".to_string(),
                    allowed: BLOOD_GROUPS.iter().map(|g| json!(g)).collect(),
                },
            ),
            rule(
                "contact-phone-required",
                "every emergency contact needs a phone number",
                ValidationRuleType::EachItemRequires {
                    field_path: "contacts".to_string(),
                    item_field: "phone_number".to_string(),
                },
            ),
        ],
    }
}

pub fn facility_account_schema() -> RecordSchema {
    RecordSchema {
        schema_id: "facility-account-v1".to_string(),
        json_schema: json!({
            "type": "object",
            "required": ["facility_name", "contact_number", "email", "credential_secret"],
            "properties": {
                "facility_name": { "type": "string" },
                "contact_number": { "type": "string" },
                "email": { "type": "string" },
                "credential_secret": { "type": "string" },
                "specialties": { "type": "array", "items": { "type": "string" } }
            }
        }),
        rules: vec![
            required("facility-name-required", "facility_name"),
            required("contact-number-required", "contact_number"),
            required("secret-required", "credential_secret"),
            rule(
                "email-format",
                "email must contain '@'",
                ValidationRuleType::MustContain {
                    field_path: "email".to_string(),
                    needle: "@".to_string(),
                },
            ),
        ],
    }
}
