use reqwest::StatusCode;
use thiserror::Error;

use crate::gateway::access::AuthError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("builtin models are not enabled")]
    FeatureDisabled,
    #[error("{message}")]
    ServerMisconfigured { message: String },
    #[error("missing access key")]
    MissingCredential,
    #[error("invalid access key")]
    InvalidCredential,
    #[error("failed to fetch model list: {body}")]
    UpstreamError { status: StatusCode, body: String },
    #[error("timed out fetching model list")]
    UpstreamTimeout,
    #[error("request error: {message}")]
    UpstreamUnreachable { message: String },
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::FeatureDisabled => Self::FeatureDisabled,
            AuthError::ServerMisconfigured => Self::ServerMisconfigured {
                message: err.to_string(),
            },
            AuthError::MissingCredential => Self::MissingCredential,
            AuthError::InvalidCredential => Self::InvalidCredential,
        }
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::FeatureDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::ServerMisconfigured { .. } | Self::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::MissingCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidCredential => StatusCode::FORBIDDEN,
            // Upstream 4xx must not read as a rejected access key.
            Self::UpstreamError { status, .. } => {
                if status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FeatureDisabled => "feature_disabled",
            Self::ServerMisconfigured { .. } => "server_misconfigured",
            Self::MissingCredential => "missing_access_key",
            Self::InvalidCredential => "invalid_access_key",
            Self::UpstreamError { .. } => "upstream_error",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UpstreamUnreachable { .. } => "upstream_unreachable",
            Self::InternalError { .. } => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
