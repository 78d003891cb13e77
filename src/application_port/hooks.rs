use crate::domain_model::UserId;
use warp::http::HeaderMap;
use warp::hyper::body::Bytes;

/// Raw login request handed to the application's [`Authenticator`].
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl LoginRequest {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Returned by an [`Authenticator`]; the message reaches the client as is.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RejectedCredentials(pub String);

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &LoginRequest) -> Result<UserId, RejectedCredentials>;
}

/// Turns a verified user id into the application's user record.
#[async_trait::async_trait]
pub trait UserResolver: Send + Sync {
    type User: Send + Sync + 'static;

    async fn resolve(&self, user_id: &UserId) -> anyhow::Result<Self::User>;
}
