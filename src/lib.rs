pub mod analyzers;
pub mod config;
pub mod context;
pub mod detection;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod services;
