use std::sync::Arc;

use tracing::warn;

use super::domain::{Inspection, InspectionRequest};
use super::repository::InspectionLedger;
use super::service::{InspectionFilter, InspectionService, InspectionServiceError, ScheduleOutcome};
use crate::workflows::permits::PermitStore;

/// Cached, filterable inspection list that is only refreshed on demand.
///
/// Mutations made through the board refetch once they succeed; changes made elsewhere
/// show up on the next explicit [`InspectionBoard::refetch`].
pub struct InspectionBoard<S, L> {
    service: Arc<InspectionService<S, L>>,
    filter: InspectionFilter,
    items: Vec<Inspection>,
    loaded: bool,
}

impl<S, L> InspectionBoard<S, L>
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    pub fn new(service: Arc<InspectionService<S, L>>, filter: InspectionFilter) -> Self {
        Self {
            service,
            filter,
            items: Vec::new(),
            loaded: false,
        }
    }

    pub fn items(&self) -> &[Inspection] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn filter(&self) -> &InspectionFilter {
        &self.filter
    }

    pub fn refetch(&mut self) -> Result<&[Inspection], InspectionServiceError> {
        self.items = self.service.list(&self.filter)?;
        self.loaded = true;
        Ok(&self.items)
    }

    pub fn set_filter(
        &mut self,
        filter: InspectionFilter,
    ) -> Result<&[Inspection], InspectionServiceError> {
        self.filter = filter;
        self.refetch()
    }

    /// Schedule through the service, then refresh the cached list.
    ///
    /// The outcome is returned even when the refresh fails; the cache then stays
    /// stale until the next successful [`InspectionBoard::refetch`].
    pub fn schedule(
        &mut self,
        request: InspectionRequest,
    ) -> Result<ScheduleOutcome, InspectionServiceError> {
        let outcome = self.service.schedule(request)?;
        if let Err(err) = self.refetch() {
            warn!(
                inspection = %outcome.inspection().id,
                error = %err,
                "inspection scheduled but the board could not refresh"
            );
        }
        Ok(outcome)
    }
}
