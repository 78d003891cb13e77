mod jwt_codec;
mod token_service_impl;

pub use jwt_codec::*;
pub use token_service_impl::*;
