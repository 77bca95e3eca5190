pub mod clock;
pub mod inspections;
pub mod memory;
pub mod notifications;
pub mod permits;
pub mod reporting;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use storage::RepositoryError;
