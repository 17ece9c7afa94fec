//! Renders the registry's tool set into the two shapes the loop needs:
//! a markdown catalog for the system prompt, and the LM wire's
//! function-call schema array (spec.md §6 "tools[] (function-call schema)").

use serde_json::{json, Value};

use weave_tool_registry::{ParamType, ToolSchema};

fn json_type(param_type: ParamType) -> &'static str {
    match param_type {
        ParamType::String => "string",
        ParamType::Number => "number",
        ParamType::Boolean => "boolean",
        ParamType::Array => "array",
        ParamType::Object => "object",
    }
}

/// Converts one registered schema into an OpenAI-style function-call
/// tool definition.
pub fn to_llm_tool_schema(schema: &ToolSchema) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for param in &schema.parameters {
        let mut prop = json!({ "type": json_type(param.param_type) });
        if let Some(description) = &param.description {
            prop["description"] = json!(description);
        }
        if !param.constraints.allowed_values.is_empty() {
            prop["enum"] = json!(param.constraints.allowed_values);
        }
        properties.insert(param.name.clone(), prop);
        if param.required {
            required.push(param.name.clone());
        }
    }

    json!({
        "type": "function",
        "function": {
            "name": schema.name,
            "description": schema.description,
            "parameters": {
                "type": "object",
                "properties": Value::Object(properties),
                "required": required,
            }
        }
    })
}

/// Renders a short markdown bullet list for the system prompt, one line
/// per tool: name and description.
pub fn render_catalog(schemas: &[ToolSchema]) -> String {
    schemas
        .iter()
        .map(|s| format!("- `{}`: {}", s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n")
}
