mod token_store_redis;

pub use token_store_redis::*;
