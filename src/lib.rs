mod env;
mod error;

pub mod gateway;

pub use env::{Env, parse_dotenv};
pub use error::{GatewayError, Result};
pub use gateway::{
    AccessKeySet, AuthError, Authorized, BuiltinModelConfig, BuiltinModelGateway, ConfigError,
    ConfigSummary, GatewayHttpState, ModelCatalog, ModelDescriptor, ModelSource, Pricing,
    ProviderInfo, UpstreamClient, ValidationResult,
};
