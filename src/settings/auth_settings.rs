use crate::application_impl::JwtConfig;
use crate::application_port::{Authenticator, UserResolver};
use crate::domain_model::{SigningAlgorithm, TokenRole, UnknownSigningAlgorithm};
use crate::domain_port::TokenStore;
use crate::gateway::{JsonRenderer, ResponseRenderer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ACCESS_LIFETIME: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REFRESH_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_HEADER_SCHEME: &str = "Bearer";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("empty access token secret key")]
    EmptyAccessSecret,
    #[error("empty refresh token secret key")]
    EmptyRefreshSecret,
    #[error(transparent)]
    UnknownSigningAlgorithm(#[from] UnknownSigningAlgorithm),
    #[error("{0} token lifetime must be at least one second")]
    ZeroLifetime(TokenRole),
    #[error("invalid auth header scheme: {0:?}")]
    InvalidHeaderScheme(String),
}

/// Everything the gateway needs, fixed at startup and shared read-only.
pub struct AuthSettings<U: Send + Sync + 'static> {
    jwt: JwtConfig,
    header_scheme: String,
    authenticator: Arc<dyn Authenticator>,
    user_resolver: Arc<dyn UserResolver<User = U>>,
    renderer: Arc<dyn ResponseRenderer>,
    store: Arc<dyn TokenStore>,
}

impl<U: Send + Sync + 'static> AuthSettings<U> {
    /// Starts a builder from the required pieces; everything else has a
    /// default.
    pub fn builder(
        access_secret: impl Into<Vec<u8>>,
        authenticator: Arc<dyn Authenticator>,
        user_resolver: Arc<dyn UserResolver<User = U>>,
        store: Arc<dyn TokenStore>,
    ) -> AuthSettingsBuilder<U> {
        AuthSettingsBuilder {
            signing_algorithm: None,
            access_secret: access_secret.into(),
            refresh_secret: None,
            access_lifetime: DEFAULT_ACCESS_LIFETIME,
            refresh_lifetime: DEFAULT_REFRESH_LIFETIME,
            header_scheme: DEFAULT_HEADER_SCHEME.to_string(),
            authenticator,
            user_resolver,
            renderer: Arc::new(JsonRenderer),
            store,
        }
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    pub fn header_scheme(&self) -> &str {
        &self.header_scheme
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    pub fn user_resolver(&self) -> &Arc<dyn UserResolver<User = U>> {
        &self.user_resolver
    }

    pub fn renderer(&self) -> &Arc<dyn ResponseRenderer> {
        &self.renderer
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }
}

impl<U: Send + Sync + 'static> fmt::Debug for AuthSettings<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt", &self.jwt)
            .field("header_scheme", &self.header_scheme)
            .finish_non_exhaustive()
    }
}

pub struct AuthSettingsBuilder<U: Send + Sync + 'static> {
    signing_algorithm: Option<String>,
    access_secret: Vec<u8>,
    refresh_secret: Option<Vec<u8>>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    header_scheme: String,
    authenticator: Arc<dyn Authenticator>,
    user_resolver: Arc<dyn UserResolver<User = U>>,
    renderer: Arc<dyn ResponseRenderer>,
    store: Arc<dyn TokenStore>,
}

impl<U: Send + Sync + 'static> AuthSettingsBuilder<U> {
    /// One of `HS256`, `HS384`, `HS512`. Checked by [`Self::build`].
    pub fn signing_algorithm(mut self, name: impl Into<String>) -> Self {
        self.signing_algorithm = Some(name.into());
        self
    }

    /// Defaults to the access secret.
    pub fn refresh_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.refresh_secret = Some(secret.into());
        self
    }

    pub fn access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_lifetime = lifetime;
        self
    }

    pub fn refresh_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_lifetime = lifetime;
        self
    }

    pub fn header_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.header_scheme = scheme.into();
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ResponseRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn build(self) -> Result<AuthSettings<U>, ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::EmptyAccessSecret);
        }
        let refresh_secret = match self.refresh_secret {
            Some(secret) if secret.is_empty() => return Err(ConfigError::EmptyRefreshSecret),
            Some(secret) => secret,
            None => self.access_secret.clone(),
        };
        let algorithm = match self.signing_algorithm.as_deref() {
            None => SigningAlgorithm::default(),
            Some(name) => name.parse::<SigningAlgorithm>()?,
        };
        if self.access_lifetime.as_secs() == 0 {
            return Err(ConfigError::ZeroLifetime(TokenRole::Access));
        }
        if self.refresh_lifetime.as_secs() == 0 {
            return Err(ConfigError::ZeroLifetime(TokenRole::Refresh));
        }
        if self.header_scheme.is_empty() || self.header_scheme.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidHeaderScheme(self.header_scheme));
        }

        Ok(AuthSettings {
            jwt: JwtConfig {
                algorithm,
                access_secret: self.access_secret,
                refresh_secret,
                access_lifetime: self.access_lifetime,
                refresh_lifetime: self.refresh_lifetime,
            },
            header_scheme: self.header_scheme,
            authenticator: self.authenticator,
            user_resolver: self.user_resolver,
            renderer: self.renderer,
            store: self.store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_port::{LoginRequest, RejectedCredentials};
    use crate::domain_model::UserId;
    use crate::infra_memory::MemoryTokenStore;

    struct AnyUser;

    #[async_trait::async_trait]
    impl Authenticator for AnyUser {
        async fn authenticate(&self, _: &LoginRequest) -> Result<UserId, RejectedCredentials> {
            Ok(UserId::from("1"))
        }
    }

    #[async_trait::async_trait]
    impl UserResolver for AnyUser {
        type User = String;

        async fn resolve(&self, user_id: &UserId) -> anyhow::Result<String> {
            Ok(user_id.to_string())
        }
    }

    fn builder(secret: &str) -> AuthSettingsBuilder<String> {
        AuthSettings::builder(
            secret,
            Arc::new(AnyUser),
            Arc::new(AnyUser),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = builder("secret").build().unwrap();
        let jwt = settings.jwt();
        assert_eq!(jwt.algorithm, SigningAlgorithm::HS256);
        assert_eq!(jwt.refresh_secret, b"secret".to_vec());
        assert_eq!(jwt.access_lifetime, Duration::from_secs(600));
        assert_eq!(jwt.refresh_lifetime, Duration::from_secs(86_400));
        assert_eq!(settings.header_scheme(), "Bearer");
    }

    #[test]
    fn test_overrides() {
        let settings = builder("secret")
            .signing_algorithm("HS512")
            .refresh_secret("other")
            .access_lifetime(Duration::from_secs(5))
            .header_scheme("Token")
            .build()
            .unwrap();
        assert_eq!(settings.jwt().algorithm, SigningAlgorithm::HS512);
        assert_eq!(settings.jwt().refresh_secret, b"other".to_vec());
        assert_eq!(settings.jwt().access_lifetime, Duration::from_secs(5));
        assert_eq!(settings.header_scheme(), "Token");
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            builder("").build(),
            Err(ConfigError::EmptyAccessSecret)
        ));
        assert!(matches!(
            builder("secret").refresh_secret("").build(),
            Err(ConfigError::EmptyRefreshSecret)
        ));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        for name in ["RS256", "none", "hs256", ""] {
            assert!(matches!(
                builder("secret").signing_algorithm(name).build(),
                Err(ConfigError::UnknownSigningAlgorithm(_))
            ));
        }
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        assert!(matches!(
            builder("secret").access_lifetime(Duration::ZERO).build(),
            Err(ConfigError::ZeroLifetime(TokenRole::Access))
        ));
    }

    #[test]
    fn test_header_scheme_without_spaces() {
        assert!(builder("secret").header_scheme("My Scheme").build().is_err());
        assert!(builder("secret").header_scheme("").build().is_err());
    }
}
