// ABOUTME: Library root for stevedore - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

mod client;
pub mod config;
pub mod deployer;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod files;
pub mod host;
pub mod monitor;
pub mod output;
pub mod probe;
pub mod registry;
pub mod types;
