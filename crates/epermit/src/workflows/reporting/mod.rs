//! Read-only analytics and CSV exports over permits, inspections, and invoices.

pub mod export;
pub mod router;
pub mod summary;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use export::{ExportDataset, ExportError};
pub use router::reporting_router;
pub use summary::{summarize, InvoiceTotals, PermitAnalytics};

use crate::workflows::inspections::InspectionLedger;
use crate::workflows::permits::PermitStore;
use crate::workflows::{Clock, RepositoryError, SystemClock};

pub struct ReportingService<S, L> {
    permits: Arc<S>,
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<S, L> ReportingService<S, L>
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    pub fn new(permits: Arc<S>, ledger: Arc<L>) -> Self {
        Self::with_clock(permits, ledger, Arc::new(SystemClock))
    }

    pub fn with_clock(permits: Arc<S>, ledger: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            permits,
            ledger,
            clock,
        }
    }

    pub fn summary(&self) -> Result<PermitAnalytics, RepositoryError> {
        let intents = self.permits.list_intents()?;
        let permits = self.permits.list_permits()?;
        let inspections = self.ledger.list_inspections()?;
        let invoices = self.ledger.list_invoices()?;
        Ok(summarize(
            &intents,
            &permits,
            &inspections,
            &invoices,
            self.clock.now(),
        ))
    }

    pub fn export(&self, dataset: ExportDataset) -> Result<String, ExportError> {
        match dataset {
            ExportDataset::Permits => export::permits_csv(&self.permits.list_permits()?),
            ExportDataset::Inspections => {
                let mut inspections = self.ledger.list_inspections()?;
                inspections.sort_by(|a, b| a.id.cmp(&b.id));
                export::inspections_csv(&inspections)
            }
            ExportDataset::Invoices => export::invoices_csv(&self.ledger.list_invoices()?),
        }
    }
}
