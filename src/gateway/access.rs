use thiserror::Error;

pub const ACCESS_KEY_HEADER: &str = "x-access-key";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("builtin models are not enabled")]
    FeatureDisabled,
    #[error("server has no builtin model access keys configured")]
    ServerMisconfigured,
    #[error("missing access key")]
    MissingCredential,
    #[error("invalid access key")]
    InvalidCredential,
}

/// Proof that an access key passed [`AccessKeySet::verify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Authorized(());

/// Comma-separated shared secrets accepted in the `X-Access-Key` header.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccessKeySet {
    keys: Vec<String>,
}

impl std::fmt::Debug for AccessKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKeySet")
            .field("keys", &format_args!("<{} redacted>", self.keys.len()))
            .finish()
    }
}

impl AccessKeySet {
    pub fn parse(raw: &str) -> Self {
        Self {
            keys: raw
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Exact match; the presented key is not trimmed.
    pub fn contains(&self, presented: &str) -> bool {
        self.keys.iter().any(|key| key == presented)
    }

    pub fn verify(&self, enabled: bool, presented: Option<&str>) -> Result<Authorized, AuthError> {
        if !enabled {
            return Err(AuthError::FeatureDisabled);
        }
        if self.is_empty() {
            return Err(AuthError::ServerMisconfigured);
        }
        let presented = presented
            .filter(|key| !key.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        if !self.contains(presented) {
            return Err(AuthError::InvalidCredential);
        }
        Ok(Authorized(()))
    }
}
