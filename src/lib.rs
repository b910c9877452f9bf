pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod tokens;
pub mod types;

// Application use cases and ports, with their infrastructure adapters
pub mod app;
pub mod infra;
