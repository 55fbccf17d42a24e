//! Builtin model gateway: access-key gating in front of an upstream
//! OpenAI-compatible `/models` listing.

pub mod access;
pub mod catalog;
pub mod config;
pub mod http;
pub mod observability;
#[cfg(feature = "otel")]
pub mod otel;
pub mod upstream;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

pub use access::{ACCESS_KEY_HEADER, AccessKeySet, AuthError, Authorized};
pub use catalog::{ModelCatalog, ModelDescriptor, Pricing, ProviderInfo};
pub use config::{BuiltinModelConfig, ConfigError};
pub use http::GatewayHttpState;
pub use upstream::{ModelSource, UpstreamClient};

const VALID_KEY_MESSAGE: &str = "Access key is valid";

/// Public view of the configuration; never includes secrets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub enabled: bool,
    pub base_url: String,
    pub provider: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

pub struct BuiltinModelGateway {
    config: BuiltinModelConfig,
    source: Arc<dyn ModelSource>,
}

impl std::fmt::Debug for BuiltinModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinModelGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BuiltinModelGateway {
    pub fn new(config: BuiltinModelConfig) -> Result<Self> {
        let upstream = UpstreamClient::new(config.base_url.clone(), config.upstream_timeout)?;
        Ok(Self::with_model_source(config, Arc::new(upstream)))
    }

    pub fn with_model_source(config: BuiltinModelConfig, source: Arc<dyn ModelSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &BuiltinModelConfig {
        &self.config
    }

    pub fn verify(&self, presented: Option<&str>) -> std::result::Result<Authorized, AuthError> {
        self.config
            .access_keys
            .verify(self.config.enabled, presented)
    }

    pub fn get_config(&self, _authorized: Authorized) -> ConfigSummary {
        ConfigSummary {
            enabled: self.config.enabled,
            base_url: self.config.base_url.clone(),
            provider: catalog::PROVIDER_ID.to_string(),
        }
    }

    pub async fn list_models(&self, _authorized: Authorized) -> Result<ModelCatalog> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GatewayError::ServerMisconfigured {
                message: "server has no builtin model API key configured".to_string(),
            }
        })?;
        let raw = self.source.fetch_models(api_key).await?;
        let catalog = ModelCatalog::from_upstream(raw);
        tracing::debug!(models = catalog.models.len(), "built builtin model catalog");
        Ok(catalog)
    }

    /// Key check for client-side UX: failures are reported in the body.
    pub fn validate(&self, presented: Option<&str>) -> ValidationResult {
        match self.verify(presented) {
            Ok(_) => ValidationResult {
                valid: true,
                message: VALID_KEY_MESSAGE.to_string(),
            },
            Err(err) => ValidationResult {
                valid: false,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;

    struct StaticSource {
        response: fn() -> Result<Value>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(response: fn() -> Result<Value>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ModelSource for StaticSource {
        async fn fetch_models(&self, api_key: &str) -> Result<Value> {
            assert_eq!(api_key, "sk-upstream");
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)()
        }
    }

    fn config() -> BuiltinModelConfig {
        BuiltinModelConfig {
            api_key: Some("sk-upstream".to_string()),
            access_keys: AccessKeySet::parse("abc, def ,ghi"),
            ..BuiltinModelConfig::default()
        }
    }

    fn listing() -> Result<Value> {
        Ok(json!({"data": [{"id": "gpt-4-vision"}, {"id": "text-davinci"}, {"id": ""}]}))
    }

    #[test]
    fn disabled_flag_wins_over_valid_key() {
        let gateway = BuiltinModelGateway::with_model_source(
            BuiltinModelConfig {
                enabled: false,
                ..config()
            },
            StaticSource::new(listing),
        );
        assert_eq!(gateway.verify(Some("abc")), Err(AuthError::FeatureDisabled));
        let result = gateway.validate(Some("abc"));
        assert!(!result.valid);
        assert_eq!(result.message, "builtin models are not enabled");
    }

    #[test]
    fn get_config_hides_secrets() {
        let gateway = BuiltinModelGateway::with_model_source(config(), StaticSource::new(listing));
        let authorized = gateway.verify(Some("def")).expect("authorized");
        let summary = gateway.get_config(authorized);
        assert_eq!(
            summary,
            ConfigSummary {
                enabled: true,
                base_url: "https://api.openai.com/v1".to_string(),
                provider: "builtin".to_string(),
            }
        );
        let rendered = serde_json::to_string(&summary).expect("json");
        assert!(!rendered.contains("sk-upstream"));
        assert!(!rendered.contains("abc"));
    }

    #[test]
    fn validate_reports_each_failure_as_data() {
        let gateway = BuiltinModelGateway::with_model_source(config(), StaticSource::new(listing));
        assert_eq!(
            gateway.validate(Some("ghi")),
            ValidationResult {
                valid: true,
                message: "Access key is valid".to_string(),
            }
        );
        assert_eq!(gateway.validate(None).message, "missing access key");
        assert_eq!(gateway.validate(Some("xyz")).message, "invalid access key");

        let unconfigured = BuiltinModelGateway::with_model_source(
            BuiltinModelConfig::default(),
            StaticSource::new(listing),
        );
        let result = unconfigured.validate(Some("abc"));
        assert!(!result.valid);
        assert_eq!(
            result.message,
            "server has no builtin model access keys configured"
        );
    }

    #[tokio::test]
    async fn list_models_reshapes_upstream_listing() {
        let source = StaticSource::new(listing);
        let gateway = BuiltinModelGateway::with_model_source(config(), source.clone());
        let authorized = gateway.verify(Some("abc")).expect("authorized");

        let catalog = gateway.list_models(authorized).await.expect("catalog");
        assert_eq!(catalog.models.len(), 2);
        assert!(catalog.models["gpt-4-vision"].supports_vision);
        assert!(!catalog.models["text-davinci"].supports_vision);
        assert_eq!(catalog.raw_response["data"][2]["id"], "");

        gateway.list_models(authorized).await.expect("catalog");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn list_models_requires_upstream_api_key() {
        let source = StaticSource::new(listing);
        let gateway = BuiltinModelGateway::with_model_source(
            BuiltinModelConfig {
                api_key: None,
                ..config()
            },
            source.clone(),
        );
        let authorized = gateway.verify(Some("abc")).expect("authorized");
        let err = gateway.list_models(authorized).await.unwrap_err();
        assert!(matches!(err, GatewayError::ServerMisconfigured { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn list_models_propagates_upstream_failures() {
        let gateway = BuiltinModelGateway::with_model_source(
            config(),
            StaticSource::new(|| Err(GatewayError::UpstreamTimeout)),
        );
        let authorized = gateway.verify(Some("abc")).expect("authorized");
        let err = gateway.list_models(authorized).await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamTimeout));
    }
}
