use crate::domain_model::TokenPair;
use serde::Serialize;
use warp::Reply;
use warp::http::StatusCode;
use warp::reply::Response;

/// Shapes every response the gateway writes. Override any method to change
/// the body; the status is decided by the gateway.
pub trait ResponseRenderer: Send + Sync {
    fn login(&self, status: StatusCode, pair: &TokenPair) -> Response {
        json_response(status, &LoginBody::from(pair))
    }

    fn logout(&self, status: StatusCode) -> Response {
        json_response(status, &serde_json::json!({}))
    }

    fn error(&self, status: StatusCode, message: &str) -> Response {
        json_response(
            status,
            &ErrorBody {
                error_code: status.as_u16(),
                error_message: message,
            },
        )
    }
}

/// The stock renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl ResponseRenderer for JsonRenderer {}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

/// Expiries are Unix seconds rendered as decimal strings.
#[derive(Debug, Clone, Serialize)]
pub struct LoginBody {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expire: String,
    pub refresh_expire: String,
}

impl From<&TokenPair> for LoginBody {
    fn from(pair: &TokenPair) -> Self {
        LoginBody {
            access_token: pair.access.signed_value.clone(),
            refresh_token: pair.refresh.signed_value.clone(),
            access_expire: pair.access.expires_at.to_string(),
            refresh_expire: pair.refresh.expires_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error_code: u16,
    error_message: &'a str,
}
