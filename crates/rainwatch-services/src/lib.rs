pub mod alert;
pub mod notifier;
pub mod scheduler;

pub use alert::{decide, AlertMessage, HEAVY_RAIN_THRESHOLD_MM};
pub use notifier::{Notifier, SendError};
pub use scheduler::{provider_for, AlertStatus, CycleError, CycleOutcome, Scheduler};
