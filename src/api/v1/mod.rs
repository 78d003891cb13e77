mod handler;
mod router;

pub use router::routes;
