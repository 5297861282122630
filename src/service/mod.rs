//! Installed service state owned by the agent

mod registry;

pub use registry::{ServiceInstall, ServiceRegistry};
