//! Argument validation against a [`ToolSchema`]: type and constraint checks,
//! reported with field paths (spec.md §4.6 `validate(toolCall)`).

use serde::Serialize;

use crate::schema::ToolSchema;

#[derive(Clone, Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates `args` (expected to be a JSON object) against `schema`.
/// Missing required parameters, type mismatches, and constraint
/// violations (range, enum membership) are all reported; this does not
/// short-circuit on the first error so a caller sees the whole picture.
pub fn validate_arguments(schema: &ToolSchema, args: &serde_json::Value) -> ValidationResult {
    let mut errors = Vec::new();
    let obj = match args.as_object() {
        Some(o) => o,
        None => {
            errors.push(FieldError {
                field: "$".to_string(),
                message: "arguments must be a JSON object".to_string(),
            });
            return ValidationResult { errors };
        }
    };

    for param in &schema.parameters {
        match obj.get(&param.name) {
            None => {
                if param.required {
                    errors.push(FieldError {
                        field: param.name.clone(),
                        message: "missing required parameter".to_string(),
                    });
                }
            }
            Some(value) => {
                if !param.param_type.matches(value) {
                    errors.push(FieldError {
                        field: param.name.clone(),
                        message: format!("expected {:?}, got {}", param.param_type, describe(value)),
                    });
                    continue;
                }
                if let Some(n) = value.as_f64() {
                    if let Some(min) = param.constraints.min {
                        if n < min {
                            errors.push(FieldError {
                                field: param.name.clone(),
                                message: format!("value {} is below minimum {}", n, min),
                            });
                        }
                    }
                    if let Some(max) = param.constraints.max {
                        if n > max {
                            errors.push(FieldError {
                                field: param.name.clone(),
                                message: format!("value {} is above maximum {}", n, max),
                            });
                        }
                    }
                }
                if !param.constraints.allowed_values.is_empty()
                    && !param.constraints.allowed_values.contains(value)
                {
                    errors.push(FieldError {
                        field: param.name.clone(),
                        message: format!("value not in allowed set: {:?}", param.constraints.allowed_values),
                    });
                }
            }
        }
    }

    ValidationResult { errors }
}

fn describe(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamSchema, ParamType};

    #[test]
    fn missing_required_field_reported() {
        let schema = ToolSchema::new("t", "d", "cat")
            .with_parameters(vec![ParamSchema::required("path", ParamType::String)]);
        let result = validate_arguments(&schema, &serde_json::json!({}));
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].field, "path");
    }

    #[test]
    fn type_mismatch_reported() {
        let schema = ToolSchema::new("t", "d", "cat")
            .with_parameters(vec![ParamSchema::required("count", ParamType::Number)]);
        let result = validate_arguments(&schema, &serde_json::json!({"count": "not a number"}));
        assert!(!result.is_valid());
    }

    #[test]
    fn range_constraint_enforced() {
        let schema = ToolSchema::new("t", "d", "cat").with_parameters(vec![
            ParamSchema::required("timeout", ParamType::Number).with_range(1.0, 60.0),
        ]);
        let result = validate_arguments(&schema, &serde_json::json!({"timeout": 120}));
        assert!(!result.is_valid());
        let ok = validate_arguments(&schema, &serde_json::json!({"timeout": 30}));
        assert!(ok.is_valid());
    }

    #[test]
    fn valid_arguments_pass() {
        let schema = ToolSchema::new("t", "d", "cat")
            .with_parameters(vec![ParamSchema::optional("path", ParamType::String)]);
        let result = validate_arguments(&schema, &serde_json::json!({}));
        assert!(result.is_valid());
    }
}
