//! Portable reference probe providers.
//!
//! The platform-specific providers of a full deployment (registry, WMI,
//! ACL, event log) live outside this workspace; these four cover the
//! portable ground and double as integration fodder for the engine. Each
//! deserializes its parameter bag into a typed struct up front and reports
//! bad parameters as probe failures, never as errors.

pub mod command;
pub mod env;
pub mod file;
pub mod static_value;

use std::sync::Arc;

use vigil_core::traits::ProbeProvider;

pub use command::CommandProbe;
pub use env::EnvProbe;
pub use file::FileProbe;
pub use static_value::StaticProbe;

/// All built-in providers, ready to hand to a registry.
pub fn builtin_providers() -> Vec<Arc<dyn ProbeProvider>> {
    vec![
        Arc::new(StaticProbe),
        Arc::new(FileProbe),
        Arc::new(EnvProbe),
        Arc::new(CommandProbe),
    ]
}
