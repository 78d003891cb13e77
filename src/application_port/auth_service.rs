use crate::domain_model::*;
use crate::domain_port::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to create access token")]
    FailedToCreateAccessToken,
    #[error("failed to create refresh token")]
    FailedToCreateRefreshToken,
    #[error("{0}")]
    CredentialsRejected(String),
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token is not valid")]
    TokenMalformed,
    #[error("token claim {0} is missing")]
    ClaimMissing(ClaimName),
    /// Expired, revoked, rotated and unknown tokens all end up here.
    #[error("token has expired")]
    TokenExpired,
    #[error("no auth header provided")]
    NoAuthHeader,
    #[error("invalid auth header")]
    InvalidAuthHeader,
    #[error("refresh token is not provided")]
    RefreshTokenNotProvided,
    #[error("user id is not provided")]
    UserIdNotProvided,
    #[error("user is not authenticated")]
    NotAuthenticated,
    #[error("failed to save token to storage: {0}")]
    SaveFailed(String),
    #[error("failed to delete token from storage: {0}")]
    DeleteFailed(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("failed to resolve user: {0}")]
    UserResolutionFailed(String),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Expired => AuthError::TokenExpired,
            StoreError::NotAuthenticated => AuthError::NotAuthenticated,
            StoreError::SaveFailed(e) => AuthError::SaveFailed(e),
            StoreError::DeleteFailed(e) => AuthError::DeleteFailed(e),
            StoreError::Backend(e) => AuthError::Store(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccess {
    pub user_id: UserId,
    pub access_token_id: TokenId,
}

/// Lifecycle of access/refresh token pairs backed by a revocation store.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Sign a new pair for `user_id` and record both halves.
    async fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, AuthError>;

    async fn verify_access(&self, access_token: &str) -> Result<VerifiedAccess, AuthError>;

    /// Redeem a refresh token: the presented pair is revoked and a new one
    /// issued. A refresh token can be redeemed once.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;

    /// Revoke every live token of `user_id`. Callers must authorize this
    /// themselves; no token is checked.
    async fn force_logout(&self, user_id: &UserId) -> Result<(), AuthError>;
}
