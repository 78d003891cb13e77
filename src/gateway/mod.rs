//! warp filters that put token issuance, rotation and revocation behind
//! HTTP endpoints, plus an `authenticated` filter for protected routes.

mod error;
mod handler;
mod header;
mod response;

pub use error::*;
pub use header::bearer_token;
pub use response::*;

use crate::application_impl::RealTokenService;
use crate::application_port::*;
use crate::domain_model::*;
use crate::settings::AuthSettings;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::header::AUTHORIZATION;
use warp::reply::Response;
use warp::{Filter, Rejection, reject};

/// What a protected route receives once the access token checks out.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser<U> {
    pub user_id: UserId,
    pub access_token_id: TokenId,
    pub user: U,
}

pub struct Gateway<U: Send + Sync + 'static> {
    settings: Arc<AuthSettings<U>>,
    service: Arc<dyn TokenService>,
}

impl<U: Send + Sync + 'static> Clone for Gateway<U> {
    fn clone(&self) -> Self {
        Gateway {
            settings: self.settings.clone(),
            service: self.service.clone(),
        }
    }
}

impl<U: Send + Sync + 'static> Gateway<U> {
    pub fn new(settings: AuthSettings<U>) -> Self {
        let service = Arc::new(RealTokenService::new(
            settings.jwt().clone(),
            settings.store().clone(),
        ));
        Gateway {
            settings: Arc::new(settings),
            service,
        }
    }

    pub fn settings(&self) -> &AuthSettings<U> {
        &self.settings
    }

    pub fn service(&self) -> Arc<dyn TokenService> {
        self.service.clone()
    }

    pub fn renderer(&self) -> Arc<dyn ResponseRenderer> {
        self.settings.renderer().clone()
    }

    /// Revoke everything `user_id` holds, outside of any request.
    pub async fn force_logout_user(&self, user_id: &UserId) -> Result<(), AuthError> {
        self.service.force_logout(user_id).await
    }

    /// Hands the raw request to the authenticator and answers with a fresh
    /// pair. Mount under the route and method of your choice.
    pub fn login(
        &self,
    ) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + use<U> {
        warp::header::headers_cloned()
            .and(warp::body::bytes())
            .and(with(self.settings.clone()))
            .and(with(self.service.clone()))
            .and_then(handler::login::<U>)
    }

    /// Expects `{"refresh_token": "..."}`.
    pub fn refresh(
        &self,
    ) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + use<U> {
        warp::body::bytes()
            .and(with(self.settings.clone()))
            .and(with(self.service.clone()))
            .and_then(handler::refresh::<U>)
    }

    pub fn logout(
        &self,
    ) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + use<U> {
        warp::header::optional::<String>(AUTHORIZATION.as_str())
            .and(with(self.settings.clone()))
            .and(with(self.service.clone()))
            .and_then(handler::logout::<U>)
    }

    /// Expects `{"user_id": "..."}`.
    pub fn force_logout(
        &self,
    ) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + use<U> {
        warp::body::bytes()
            .and(with(self.settings.clone()))
            .and(with(self.service.clone()))
            .and_then(handler::force_logout::<U>)
    }

    /// Rejects with [`AuthRejection`] unless the request carries a live
    /// access token whose user resolves. Pair with [`recover_auth`].
    pub fn authenticated(
        &self,
    ) -> impl Filter<Extract = (AuthenticatedUser<U>,), Error = Rejection> + Clone + use<U> {
        warp::header::optional::<String>(AUTHORIZATION.as_str())
            .and(with(self.settings.clone()))
            .and(with(self.service.clone()))
            .and_then(
                |authorization: Option<String>,
                 settings: Arc<AuthSettings<U>>,
                 service: Arc<dyn TokenService>| async move {
                    authenticate(authorization, &settings, service.as_ref())
                        .await
                        .map_err(|e| reject::custom(AuthRejection::from(e)))
                },
            )
    }
}

async fn authenticate<U: Send + Sync + 'static>(
    authorization: Option<String>,
    settings: &AuthSettings<U>,
    service: &dyn TokenService,
) -> Result<AuthenticatedUser<U>, AuthError> {
    let token = bearer_token(authorization.as_deref(), settings.header_scheme())?;
    let verified = service.verify_access(token).await?;
    let user = settings
        .user_resolver()
        .resolve(&verified.user_id)
        .await
        .map_err(|e| AuthError::UserResolutionFailed(e.to_string()))?;
    Ok(AuthenticatedUser {
        user_id: verified.user_id,
        access_token_id: verified.access_token_id,
        user,
    })
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
