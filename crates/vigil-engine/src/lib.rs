pub mod engine;
pub mod orchestrator;
pub mod registry;

pub use engine::AuditEngine;
pub use orchestrator::WorkflowOrchestrator;
pub use registry::ProviderRegistry;
