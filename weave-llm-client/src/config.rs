//! Per-model-type endpoint/credential resolution, with a single-default
//! fallback when no per-type entry exists (spec.md §4.7).

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Basic,
    Reasoning,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ModelEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
}

impl ModelEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model_name: model_name.into(),
        }
    }
}

/// A map of per-model-type endpoints plus a default used when a type
/// has no explicit entry.
#[derive(Clone, Debug, Default)]
pub struct ModelConfig {
    entries: HashMap<ModelType, ModelEndpoint>,
    default: Option<ModelEndpoint>,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, endpoint: ModelEndpoint) -> Self {
        self.default = Some(endpoint);
        self
    }

    pub fn with_entry(mut self, model_type: ModelType, endpoint: ModelEndpoint) -> Self {
        self.entries.insert(model_type, endpoint);
        self
    }

    pub fn resolve(&self, model_type: ModelType) -> Option<&ModelEndpoint> {
        self.entries.get(&model_type).or(self.default.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_entry_wins_over_default() {
        let config = ModelConfig::new()
            .with_default(ModelEndpoint::new("https://default", "k", "gpt-default"))
            .with_entry(ModelType::Reasoning, ModelEndpoint::new("https://reasoning", "k", "o1"));
        assert_eq!(config.resolve(ModelType::Reasoning).unwrap().model_name, "o1");
    }

    #[test]
    fn falls_back_to_default_when_type_unset() {
        let config = ModelConfig::new().with_default(ModelEndpoint::new("https://default", "k", "gpt-default"));
        assert_eq!(config.resolve(ModelType::Reasoning).unwrap().model_name, "gpt-default");
    }

    #[test]
    fn no_default_and_no_entry_resolves_to_none() {
        let config = ModelConfig::new();
        assert!(config.resolve(ModelType::Basic).is_none());
    }
}
