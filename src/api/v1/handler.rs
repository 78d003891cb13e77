use crate::gateway::{AuthRejection, AuthenticatedUser};
use crate::logger::*;
use crate::server::DemoUser;
use serde::Serialize;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct MeResponse<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub display_name: &'a str,
    pub admin: bool,
}

pub async fn me(
    user: AuthenticatedUser<DemoUser>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let response = MeResponse {
        user_id: user.user_id.as_str(),
        username: &user.user.username,
        display_name: &user.user.display_name,
        admin: user.user.admin,
    };
    Ok(warp::reply::json(&response))
}

pub async fn require_admin(user: AuthenticatedUser<DemoUser>) -> Result<(), warp::Rejection> {
    if user.user.admin {
        return Ok(());
    }
    debug!(user_id = %user.user_id, "force logout refused");
    Err(reject::custom(AuthRejection {
        status: StatusCode::FORBIDDEN,
        message: "admin privileges required".to_string(),
    }))
}
