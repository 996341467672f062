// ABOUTME: Command module aggregator for the stevedore CLI.
// ABOUTME: Re-exports serve, deployment, and wait command handlers.

mod deploy;
mod serve;
mod wait;

pub use deploy::{Action, deploy};
pub use serve::serve;
pub use wait::wait;
