#![allow(dead_code)]

use countersign::application_port::*;
use countersign::domain_model::*;
use countersign::domain_port::*;
use countersign::gateway::*;
use countersign::infra_memory::MemoryTokenStore;
use countersign::settings::{AuthSettings, AuthSettingsBuilder};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Logs every request in as user "1"; resolves a user to its own id.
pub struct FixedUser;

#[async_trait::async_trait]
impl Authenticator for FixedUser {
    async fn authenticate(&self, _: &LoginRequest) -> Result<UserId, RejectedCredentials> {
        Ok(UserId::from("1"))
    }
}

#[async_trait::async_trait]
impl UserResolver for FixedUser {
    type User = String;

    async fn resolve(&self, user_id: &UserId) -> anyhow::Result<String> {
        Ok(user_id.to_string())
    }
}

pub struct RejectingAuthenticator(pub &'static str);

#[async_trait::async_trait]
impl Authenticator for RejectingAuthenticator {
    async fn authenticate(&self, _: &LoginRequest) -> Result<UserId, RejectedCredentials> {
        Err(RejectedCredentials(self.0.to_string()))
    }
}

pub struct FailingResolver;

#[async_trait::async_trait]
impl UserResolver for FailingResolver {
    type User = String;

    async fn resolve(&self, _: &UserId) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("user directory unavailable"))
    }
}

/// Memory store whose writes or deletes can be made to fail.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryTokenStore,
    pub save_error: Option<&'static str>,
    pub delete_error: Option<&'static str>,
}

#[async_trait::async_trait]
impl TokenStore for FailingStore {
    async fn exists(
        &self,
        role: TokenRole,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        self.inner.exists(role, token_id, presented, user_id).await
    }

    async fn save_all(
        &self,
        access: &StoredTokenRecord,
        refresh: &StoredTokenRecord,
    ) -> Result<(), StoreError> {
        match self.save_error {
            Some(e) => Err(StoreError::SaveFailed(e.to_string())),
            None => self.inner.save_all(access, refresh).await,
        }
    }

    async fn delete_many(
        &self,
        user_id: &UserId,
        token_ids: &[TokenId],
    ) -> Result<u64, StoreError> {
        match self.delete_error {
            Some(e) => Err(StoreError::DeleteFailed(e.to_string())),
            None => self.inner.delete_many(user_id, token_ids).await,
        }
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        match self.delete_error {
            Some(e) => Err(StoreError::DeleteFailed(e.to_string())),
            None => self.inner.delete_all_for_user(user_id).await,
        }
    }
}

/// Memory store that remembers which role every lookup asked for.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryTokenStore,
    pub lookups: Mutex<Vec<(TokenRole, TokenId)>>,
}

impl RecordingStore {
    pub fn take_lookups(&self) -> Vec<(TokenRole, TokenId)> {
        std::mem::take(&mut *self.lookups.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl TokenStore for RecordingStore {
    async fn exists(
        &self,
        role: TokenRole,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        self.lookups.lock().unwrap().push((role, *token_id));
        self.inner.exists(role, token_id, presented, user_id).await
    }

    async fn save_all(
        &self,
        access: &StoredTokenRecord,
        refresh: &StoredTokenRecord,
    ) -> Result<(), StoreError> {
        self.inner.save_all(access, refresh).await
    }

    async fn delete_many(
        &self,
        user_id: &UserId,
        token_ids: &[TokenId],
    ) -> Result<u64, StoreError> {
        self.inner.delete_many(user_id, token_ids).await
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.inner.delete_all_for_user(user_id).await
    }
}

pub fn builder(store: Arc<dyn TokenStore>) -> AuthSettingsBuilder<String> {
    AuthSettings::builder(
        "super_secret",
        Arc::new(FixedUser),
        Arc::new(FixedUser),
        store,
    )
    .refresh_secret("another_secret")
}

pub fn gateway(store: Arc<dyn TokenStore>) -> Gateway<String> {
    Gateway::new(builder(store).build().unwrap())
}

/// Mounts the gateway the way an application would.
pub fn app(
    gateway: &Gateway<String>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + use<> {
    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(gateway.login());
    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(gateway.refresh());
    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(gateway.logout());
    let force_logout = warp::post()
        .and(warp::path("force_logout"))
        .and(warp::path::end())
        .and(gateway.force_logout());
    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(gateway.authenticated())
        .map(|user: AuthenticatedUser<String>| {
            warp::reply::json(&json!({
                "user_id": user.user_id.as_str(),
                "access_token_id": user.access_token_id.to_string(),
                "user": user.user,
            }))
        });

    let renderer = gateway.renderer();
    login
        .or(refresh)
        .or(logout)
        .or(force_logout)
        .or(me)
        .recover(move |rejection: Rejection| recover_auth(renderer.clone(), rejection))
        .map(Reply::into_response)
}

pub fn body_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

pub async fn login<F>(filter: &F) -> Tokens
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let resp = warp::test::request()
        .method("POST")
        .path("/login")
        .body("{}")
        .reply(filter)
        .await;
    assert_eq!(resp.status(), 200);
    let body = body_json(resp.body());
    Tokens {
        access: body["access_token"].as_str().unwrap().to_string(),
        refresh: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
