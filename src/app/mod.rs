mod controls;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::{VisrecApp, VisrecAppBuilder};
pub use types::ShutdownReason;
