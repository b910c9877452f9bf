pub mod enrich;
pub mod export;
pub mod loader;
pub mod rate_limiter;
