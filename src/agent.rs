//! The agent core: cycle execution and scheduling.

pub mod cycle;
pub mod scheduler;

pub use cycle::{Alternate, Always, CycleExecutor, CycleKind, CyclePolicy};
pub use scheduler::Scheduler;
