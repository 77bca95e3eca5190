use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    Inspection, InspectionId, InspectionRequest, InspectionStatus, InspectionValidationError,
    Invoice, InvoiceId, InvoiceStatus,
};
use super::repository::InspectionLedger;
use super::resolver::{resolve, ResolveError, ResolvedPermitContext};
use crate::config::WorkflowConfig;
use crate::workflows::permits::PermitStore;
use crate::workflows::{Clock, RepositoryError, SystemClock};

static INSPECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INVOICE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_inspection_id() -> InspectionId {
    let id = INSPECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InspectionId(format!("insp-{id:06}"))
}

fn next_invoice_ids(stamp: &str) -> (InvoiceId, String) {
    let id = INVOICE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (
        InvoiceId(format!("inv-{id:06}")),
        format!("INV-{stamp}-{id:05}"),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSettings {
    pub currency: String,
    pub due_days: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for InvoiceSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            currency: config.invoice_currency.clone(),
            due_days: config.invoice_due_days,
        }
    }
}

/// Result of scheduling: the invoice step can fail after the inspection is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled {
        inspection: Inspection,
        invoice: Option<Invoice>,
    },
    PartialSuccess {
        inspection: Inspection,
        invoice_error: String,
    },
}

impl ScheduleOutcome {
    pub fn inspection(&self) -> &Inspection {
        match self {
            ScheduleOutcome::Scheduled { inspection, .. }
            | ScheduleOutcome::PartialSuccess { inspection, .. } => inspection,
        }
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        match self {
            ScheduleOutcome::Scheduled { invoice, .. } => invoice.as_ref(),
            ScheduleOutcome::PartialSuccess { .. } => None,
        }
    }
}

/// Progress transitions reachable through the generic status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionProgress {
    Start,
    Complete,
    Cancel,
}

impl InspectionProgress {
    fn apply(self, from: InspectionStatus) -> Option<InspectionStatus> {
        use InspectionStatus::*;

        match (self, from) {
            (InspectionProgress::Start, Scheduled) => Some(InProgress),
            (InspectionProgress::Complete, InProgress) => Some(Completed),
            (InspectionProgress::Cancel, Scheduled | InProgress) => Some(Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InspectionFilter {
    #[serde(default)]
    pub status: Option<InspectionStatus>,
    #[serde(default)]
    pub province: Option<String>,
}

impl InspectionFilter {
    pub fn matches(&self, inspection: &Inspection) -> bool {
        let status_ok = self
            .status
            .map_or(true, |status| inspection.status == status);
        let province_ok = self
            .province
            .as_deref()
            .map(str::trim)
            .filter(|province| !province.is_empty())
            .map_or(true, |province| {
                inspection.province.eq_ignore_ascii_case(province)
            });
        status_ok && province_ok
    }
}

/// Schedules inspections against permit lineages and raises the matching invoices.
pub struct InspectionService<S, L> {
    permits: Arc<S>,
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
    invoices: InvoiceSettings,
}

impl<S, L> InspectionService<S, L>
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    pub fn new(permits: Arc<S>, ledger: Arc<L>) -> Self {
        Self::with_clock(permits, ledger, InvoiceSettings::default(), Arc::new(SystemClock))
    }

    pub fn with_clock(
        permits: Arc<S>,
        ledger: Arc<L>,
        invoices: InvoiceSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            permits,
            ledger,
            clock,
            invoices,
        }
    }

    pub fn schedule(
        &self,
        request: InspectionRequest,
    ) -> Result<ScheduleOutcome, InspectionServiceError> {
        request.validate()?;

        let source = request.source();
        let context = resolve(self.permits.as_ref(), &source)?;
        if !context.has_reference() {
            return Err(ResolveError::MissingReference.into());
        }

        let total = request.costs.total()?;
        let inspection = Inspection {
            id: next_inspection_id(),
            permit_id: context.permit_id.clone(),
            intent_id: context.intent_id.clone(),
            entity_id: context.entity_id.clone(),
            source_category: source.category(),
            source_record_id: source.record_id().to_string(),
            inspection_type: request.inspection_type.trim().to_string(),
            scheduled_date: request.scheduled_date,
            province: request.province.trim().to_string(),
            notes: request
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            status: InspectionStatus::Scheduled,
            costs: request.costs,
            total_travel_cost: total,
            created_by: request.requested_by,
            created_at: self.clock.now(),
        };
        let inspection = self.ledger.insert_inspection(inspection)?;
        info!(
            inspection = %inspection.id,
            category = inspection.source_category.label(),
            source = %inspection.source_record_id,
            total = %total,
            "inspection scheduled"
        );

        if total <= Decimal::ZERO {
            return Ok(ScheduleOutcome::Scheduled {
                inspection,
                invoice: None,
            });
        }

        match self.raise_invoice(&inspection, &context) {
            Ok(invoice) => Ok(ScheduleOutcome::Scheduled {
                inspection,
                invoice: Some(invoice),
            }),
            Err(err) => {
                warn!(
                    inspection = %inspection.id,
                    error = %err,
                    "inspection registered but invoice creation failed"
                );
                Ok(ScheduleOutcome::PartialSuccess {
                    inspection,
                    invoice_error: err.to_string(),
                })
            }
        }
    }

    fn raise_invoice(
        &self,
        inspection: &Inspection,
        context: &ResolvedPermitContext,
    ) -> Result<Invoice, RepositoryError> {
        let created_at = self.clock.now();
        let (id, invoice_number) = next_invoice_ids(&created_at.format("%Y%m%d").to_string());
        let invoice = Invoice {
            id,
            invoice_number,
            inspection_id: inspection.id.clone(),
            entity_id: context.entity_id.clone(),
            payer: context.payer.clone(),
            amount: inspection.total_travel_cost,
            currency: self.invoices.currency.clone(),
            status: InvoiceStatus::Unpaid,
            due_date: created_at.date_naive() + Duration::days(i64::from(self.invoices.due_days)),
            created_at,
            paid_at: None,
        };
        let stored = self.ledger.insert_invoice(invoice)?;
        info!(
            invoice = %stored.invoice_number,
            inspection = %inspection.id,
            amount = %stored.amount,
            "invoice raised"
        );
        Ok(stored)
    }

    /// Put an inspection on hold, appending a dated note.
    pub fn suspend(
        &self,
        id: &InspectionId,
        reason: Option<&str>,
    ) -> Result<Inspection, InspectionServiceError> {
        let mut inspection = self.inspection(id)?;
        if !matches!(
            inspection.status,
            InspectionStatus::Scheduled | InspectionStatus::InProgress
        ) {
            return Err(InspectionServiceError::InvalidState {
                id: id.clone(),
                status: inspection.status,
                action: "suspend",
            });
        }

        let mut annotation = format!("Suspended on {}", self.clock.today());
        if let Some(reason) = reason.map(str::trim).filter(|reason| !reason.is_empty()) {
            annotation.push_str(": ");
            annotation.push_str(reason);
        }
        inspection.notes = Some(match inspection.notes.take() {
            Some(existing) => format!("{existing}\n{annotation}"),
            None => annotation,
        });
        inspection.status = InspectionStatus::Suspended;

        self.ledger.update_inspection(inspection.clone())?;
        warn!(inspection = %id, "inspection suspended");
        Ok(inspection)
    }

    pub fn reactivate(&self, id: &InspectionId) -> Result<Inspection, InspectionServiceError> {
        let mut inspection = self.inspection(id)?;
        if inspection.status != InspectionStatus::Suspended {
            return Err(InspectionServiceError::InvalidState {
                id: id.clone(),
                status: inspection.status,
                action: "reactivate",
            });
        }
        inspection.status = InspectionStatus::Scheduled;
        self.ledger.update_inspection(inspection.clone())?;
        info!(inspection = %id, "inspection reactivated");
        Ok(inspection)
    }

    pub fn update_status(
        &self,
        id: &InspectionId,
        progress: InspectionProgress,
    ) -> Result<Inspection, InspectionServiceError> {
        let mut inspection = self.inspection(id)?;
        let next = progress
            .apply(inspection.status)
            .ok_or(InspectionServiceError::InvalidState {
                id: id.clone(),
                status: inspection.status,
                action: match progress {
                    InspectionProgress::Start => "start",
                    InspectionProgress::Complete => "complete",
                    InspectionProgress::Cancel => "cancel",
                },
            })?;
        inspection.status = next;
        self.ledger.update_inspection(inspection.clone())?;
        info!(inspection = %id, status = next.label(), "inspection status updated");
        Ok(inspection)
    }

    /// Remove a suspended inspection. The linked invoice goes first so none is left dangling.
    pub fn delete(&self, id: &InspectionId) -> Result<(), InspectionServiceError> {
        let inspection = self.inspection(id)?;
        if inspection.status != InspectionStatus::Suspended {
            return Err(InspectionServiceError::InvalidState {
                id: id.clone(),
                status: inspection.status,
                action: "delete",
            });
        }

        if let Some(invoice) = self.ledger.invoice_for_inspection(id)? {
            self.ledger.delete_invoice(&invoice.id)?;
        }
        self.ledger.delete_inspection(id)?;
        warn!(inspection = %id, "inspection deleted");
        Ok(())
    }

    pub fn record_payment(&self, id: &InvoiceId) -> Result<Invoice, InspectionServiceError> {
        let mut invoice = self
            .ledger
            .fetch_invoice(id)?
            .ok_or_else(|| InspectionServiceError::InvoiceNotFound(id.clone()))?;
        if !invoice.is_outstanding() {
            return Err(InspectionServiceError::InvoiceNotPayable {
                id: id.clone(),
                status: invoice.status,
            });
        }
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(self.clock.now());
        self.ledger.update_invoice(invoice.clone())?;
        info!(invoice = %invoice.invoice_number, "invoice paid");
        Ok(invoice)
    }

    pub fn inspection(&self, id: &InspectionId) -> Result<Inspection, InspectionServiceError> {
        self.ledger
            .fetch_inspection(id)?
            .ok_or_else(|| InspectionServiceError::NotFound(id.clone()))
    }

    /// Inspections matching `filter`, soonest scheduled first.
    pub fn list(&self, filter: &InspectionFilter) -> Result<Vec<Inspection>, InspectionServiceError> {
        let mut inspections: Vec<_> = self
            .ledger
            .list_inspections()?
            .into_iter()
            .filter(|inspection| filter.matches(inspection))
            .collect();
        inspections.sort_by(|a, b| {
            a.scheduled_date
                .cmp(&b.scheduled_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(inspections)
    }

    pub fn invoice_for(&self, id: &InspectionId) -> Result<Option<Invoice>, InspectionServiceError> {
        Ok(self.ledger.invoice_for_inspection(id)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InspectionServiceError {
    #[error(transparent)]
    Validation(#[from] InspectionValidationError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("inspection {0} not found")]
    NotFound(InspectionId),
    #[error("cannot {action} inspection {id} while it is {}", .status.label())]
    InvalidState {
        id: InspectionId,
        status: InspectionStatus,
        action: &'static str,
    },
    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),
    #[error("invoice {id} is {} and cannot be paid", .status.label())]
    InvoiceNotPayable { id: InvoiceId, status: InvoiceStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
