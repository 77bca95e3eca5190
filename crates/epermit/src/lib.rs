//! Review, inspection, and invoicing workflows behind the CEPA ePermit service.
//!
//! Storage is reached only through the repository traits in [`workflows`]; the
//! in-memory adapters in [`workflows::memory`] back the bundled server and the tests.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
