mod demo_auth;
mod server;
mod sweeper;

pub use demo_auth::*;
pub use server::*;
pub use sweeper::*;
