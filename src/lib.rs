pub mod audit;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod server;
pub mod snapshot;
