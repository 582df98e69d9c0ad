// For integration tests only, albert does binary-only packaging
pub mod cli;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod types;
