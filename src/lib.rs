pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod geocode;
pub mod processing;
pub mod render;
pub mod pipeline;
pub mod server;
