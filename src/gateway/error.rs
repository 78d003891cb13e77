use super::ResponseRenderer;
use crate::application_port::AuthError;
use crate::logger::*;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, reject};

/// The only place an [`AuthError`] becomes an HTTP status.
pub fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::CredentialsRejected(_) | AuthError::TokenExpired | AuthError::NoAuthHeader => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::SignatureInvalid
        | AuthError::TokenMalformed
        | AuthError::ClaimMissing(_)
        | AuthError::InvalidAuthHeader
        | AuthError::RefreshTokenNotProvided
        | AuthError::UserIdNotProvided
        | AuthError::NotAuthenticated => StatusCode::BAD_REQUEST,
        AuthError::FailedToCreateAccessToken
        | AuthError::FailedToCreateRefreshToken
        | AuthError::SaveFailed(_)
        | AuthError::DeleteFailed(_)
        | AuthError::Store(_)
        | AuthError::UserResolutionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Rejection raised by the `authenticated` filter; turned into a response by
/// [`recover_auth`].
#[derive(Debug)]
pub struct AuthRejection {
    pub status: StatusCode,
    pub message: String,
}

impl reject::Reject for AuthRejection {}

impl From<AuthError> for AuthRejection {
    fn from(error: AuthError) -> Self {
        let status = status_for(&error);
        log_failure(status, &error);
        AuthRejection {
            status,
            message: error.to_string(),
        }
    }
}

/// Render `error` with its mapped status.
pub fn error_response(renderer: &dyn ResponseRenderer, error: AuthError) -> Response {
    let status = status_for(&error);
    log_failure(status, &error);
    renderer.error(status, &error.to_string())
}

fn log_failure(status: StatusCode, error: &AuthError) {
    if status.is_server_error() {
        warn!(%status, "auth failure: {}", error);
    } else {
        debug!(%status, "auth rejected: {}", error);
    }
}

pub async fn recover_auth(
    renderer: Arc<dyn ResponseRenderer>,
    err: Rejection,
) -> Result<Response, Rejection> {
    if let Some(rejection) = err.find::<AuthRejection>() {
        Ok(renderer.error(rejection.status, &rejection.message))
    } else {
        Err(err)
    }
}
