pub mod applicability;
pub mod condition;
pub mod error;
pub mod traits;
pub mod types;
pub mod workflow;

pub use applicability::{Applicability, Platform};
pub use condition::{evaluate, ConditionOperator};
pub use error::{Result, VigilError};
pub use traits::ProbeProvider;
pub use types::*;
pub use workflow::{
    Condition, Constraints, ExecutionOptions, RuleDefinition, RunMode, WorkflowDefinition,
};
