//! Client-facing model catalog built from an upstream `/models` listing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROVIDER_ID: &str = "builtin";
pub const DEFAULT_CONTEXT_LENGTH: u64 = 128_000;
pub const CHAT_COMPLETIONS_API_TYPE: &str = "chat_completions";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub supports_thinking: bool,
}

impl ProviderInfo {
    pub fn builtin() -> Self {
        Self {
            id: PROVIDER_ID.to_string(),
            name: "Builtin models".to_string(),
            description: "Builtin model service provided by this site".to_string(),
            supports_thinking: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input: f64,
    pub output: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub description: String,
    pub api_type: String,
    pub context_length: u64,
    pub supports_vision: bool,
    pub supports_function_calling: bool,
    pub supports_streaming: bool,
    pub pricing: Pricing,
}

impl ModelDescriptor {
    pub fn for_model_id(id: &str) -> Self {
        Self {
            name: id.to_string(),
            description: format!("Builtin model: {id}"),
            api_type: CHAT_COMPLETIONS_API_TYPE.to_string(),
            context_length: DEFAULT_CONTEXT_LENGTH,
            supports_vision: infer_vision_support(id),
            supports_function_calling: true,
            supports_streaming: true,
            pricing: Pricing::default(),
        }
    }
}

/// Name-based guess; upstream listings carry no capability metadata.
pub fn infer_vision_support(model_id: &str) -> bool {
    let id = model_id.to_lowercase();
    id.contains("vision") || id.contains("gpt-4")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub provider: ProviderInfo,
    pub models: BTreeMap<String, ModelDescriptor>,
    /// Upstream body exactly as received.
    pub raw_response: Value,
}

impl ModelCatalog {
    /// Entries without a non-empty string `id` are skipped; a missing or
    /// malformed `data` array yields an empty catalog.
    pub fn from_upstream(raw_response: Value) -> Self {
        let models = raw_response
            .get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("id").and_then(Value::as_str))
            .filter(|id| !id.is_empty())
            .map(|id| (id.to_string(), ModelDescriptor::for_model_id(id)))
            .collect();

        Self {
            provider: ProviderInfo::builtin(),
            models,
            raw_response,
        }
    }
}
