mod auth_service;
mod hooks;

pub use auth_service::*;
pub use hooks::*;
