use super::handler;
use crate::server::*;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let gateway = &server.gateway;

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

    // Only admins may revoke other users' sessions.
    let force_logout = warp::post()
        .and(warp::path("force_logout"))
        .and(warp::path::end())
        .and(gateway.authenticated())
        .and_then(handler::require_admin)
        .untuple_one()
        .and(gateway.force_logout());

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(gateway.authenticated())
        .and_then(handler::me);

    login.or(refresh).or(logout).or(force_logout).or(me)
}
