use super::error::error_response;
use super::header::bearer_token;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use crate::settings::AuthSettings;
use serde::Deserialize;
use std::sync::Arc;
use warp::Rejection;
use warp::http::{HeaderMap, StatusCode};
use warp::hyper::body::Bytes;
use warp::reply::Response;

// Every handler answers with a response, failures included, so the
// endpoints never fall through to other routes.

pub async fn login<U: Send + Sync + 'static>(
    headers: HeaderMap,
    body: Bytes,
    settings: Arc<AuthSettings<U>>,
    service: Arc<dyn TokenService>,
) -> Result<Response, Rejection> {
    let request = LoginRequest { headers, body };
    let response = match do_login(&request, &settings, service.as_ref()).await {
        Ok(pair) => {
            info!(user_id = %pair.user_id(), "login succeeded");
            settings.renderer().login(StatusCode::OK, &pair)
        }
        Err(e) => error_response(settings.renderer().as_ref(), e),
    };
    Ok(response)
}

async fn do_login<U: Send + Sync + 'static>(
    request: &LoginRequest,
    settings: &AuthSettings<U>,
    service: &dyn TokenService,
) -> Result<TokenPair, AuthError> {
    let user_id = settings
        .authenticator()
        .authenticate(request)
        .await
        .map_err(|e| AuthError::CredentialsRejected(e.0))?;
    service.issue_pair(&user_id).await
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    refresh_token: Option<String>,
}

pub async fn refresh<U: Send + Sync + 'static>(
    body: Bytes,
    settings: Arc<AuthSettings<U>>,
    service: Arc<dyn TokenService>,
) -> Result<Response, Rejection> {
    let response = match do_refresh(&body, service.as_ref()).await {
        Ok(pair) => settings.renderer().login(StatusCode::OK, &pair),
        Err(e) => error_response(settings.renderer().as_ref(), e),
    };
    Ok(response)
}

async fn do_refresh(body: &[u8], service: &dyn TokenService) -> Result<TokenPair, AuthError> {
    let refresh_token = serde_json::from_slice::<RefreshBody>(body)
        .ok()
        .and_then(|b| b.refresh_token)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::RefreshTokenNotProvided)?;
    service.refresh(&refresh_token).await
}

pub async fn logout<U: Send + Sync + 'static>(
    authorization: Option<String>,
    settings: Arc<AuthSettings<U>>,
    service: Arc<dyn TokenService>,
) -> Result<Response, Rejection> {
    let result = match bearer_token(authorization.as_deref(), settings.header_scheme()) {
        Ok(token) => service.logout(token).await,
        Err(e) => Err(e),
    };
    let response = match result {
        Ok(()) => settings.renderer().logout(StatusCode::OK),
        Err(e) => error_response(settings.renderer().as_ref(), e),
    };
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct ForceLogoutBody {
    user_id: Option<String>,
}

/// Unauthenticated by itself; mount it behind whatever admin check the
/// application uses.
pub async fn force_logout<U: Send + Sync + 'static>(
    body: Bytes,
    settings: Arc<AuthSettings<U>>,
    service: Arc<dyn TokenService>,
) -> Result<Response, Rejection> {
    let response = match do_force_logout(&body, service.as_ref()).await {
        Ok(()) => settings.renderer().logout(StatusCode::OK),
        Err(e) => error_response(settings.renderer().as_ref(), e),
    };
    Ok(response)
}

async fn do_force_logout(body: &[u8], service: &dyn TokenService) -> Result<(), AuthError> {
    let user_id = serde_json::from_slice::<ForceLogoutBody>(body)
        .ok()
        .and_then(|b| b.user_id)
        .filter(|u| !u.is_empty())
        .ok_or(AuthError::UserIdNotProvided)?;
    service.force_logout(&UserId::from(user_id)).await
}
