//! Library settings (`AuthSettings`) plus the file/env settings of the demo
//! server.

mod auth_settings;
pub use auth_settings::*;

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
