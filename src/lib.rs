//! Component registration and dependency injection for hook-driven plugin hosts.

pub mod component;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod infrastructure;
pub mod logging;
pub mod startup;

// Re-export commonly used items for convenience
pub use config::FrameworkConfig;
pub use errors::{AppError, ComponentError, ConfigError, ContainerError, HookError};
pub use hooks::{EventBus, HookRegistry};
pub use infrastructure::container::{Blueprint, Container, Injectable, Instance};
pub use startup::{Plugin, StartUp};
