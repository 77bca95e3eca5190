//! Inspection scheduling: source resolution, travel-cost invoicing, and the inspection lifecycle.

pub mod board;
pub mod domain;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use board::InspectionBoard;
pub use domain::{
    Inspection, InspectionCategory, InspectionId, InspectionRequest, InspectionSource,
    InspectionStatus, InspectionValidationError, Invoice, InvoiceId, InvoiceStatus, TravelCosts,
};
pub use repository::InspectionLedger;
pub use resolver::{resolve, ResolveError, ResolvedPermitContext};
pub use router::inspection_router;
pub use service::{
    InspectionFilter, InspectionProgress, InspectionService, InspectionServiceError,
    InvoiceSettings, ScheduleOutcome,
};
