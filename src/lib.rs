pub mod batch;
pub mod config;
pub mod error;
pub mod metrics;
pub mod packet;
pub mod report;
pub mod scenario;
pub mod scheduler;
pub mod score;
pub mod slice;
pub mod transmission;
pub mod verifier;

// Re-export for easier testing
pub use config::SchedulerConfig;
pub use error::{Error, InputError, Result};
pub use report::{evaluate, write_schedule, Evaluation};
pub use scenario::{Scenario, SliceSpec};
pub use scheduler::{MissReason, Outcome, ScheduleEntry, Scheduler};
