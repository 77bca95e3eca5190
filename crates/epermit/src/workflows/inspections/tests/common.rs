use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(super) use crate::workflows::permits::tests::common::{
    action, fixed_clock, intent, now, permit, seeded_store, user, APPLICANT, ENTITY, REGISTRY,
};

use crate::workflows::inspections::{
    Inspection, InspectionId, InspectionLedger, InspectionRequest, InspectionService, Invoice,
    InvoiceId, InvoiceSettings, TravelCosts,
};
use crate::workflows::memory::{InMemoryInspectionLedger, InMemoryPermitStore};
use crate::workflows::permits::{
    IntentStatus, PermitActionKind, PermitId, PermitStatus, PermitStore,
};
use crate::workflows::RepositoryError;

pub(super) const PERMIT: &str = "pa-100";
pub(super) const INTENT: &str = "int-100";

/// Permit store with an approved permit, its intent, and one record per action kind.
pub(super) fn lineage_store() -> InMemoryPermitStore {
    let store = seeded_store();
    store
        .insert_permit(permit(PERMIT, PermitStatus::Approved))
        .expect("seed permit");

    let mut linked = intent(INTENT, IntentStatus::Approved);
    linked.existing_permit_id = Some(PermitId(PERMIT.to_string()));
    store.insert_intent(linked).expect("seed intent");
    store
        .insert_intent(intent("int-new", IntentStatus::UnderReview))
        .expect("seed intent");

    for record in [
        action(PermitActionKind::Renewal, "ren-1", &[PERMIT]),
        action(PermitActionKind::Amendment, "amd-1", &[PERMIT]),
        action(PermitActionKind::Surrender, "sur-1", &[PERMIT]),
        action(PermitActionKind::Transfer, "trf-1", &[PERMIT]),
        action(PermitActionKind::Amalgamation, "amal-1", &[PERMIT, "pa-other"]),
        action(PermitActionKind::Amalgamation, "amal-empty", &[]),
        action(PermitActionKind::Renewal, "ren-dangling", &["pa-ghost"]),
    ] {
        store.insert_permit_action(record).expect("seed action");
    }
    store
}

pub(super) fn costs(days: u32, accommodation: i64, transport: i64, allowance: i64) -> TravelCosts {
    TravelCosts {
        number_of_days: days,
        accommodation_cost: Decimal::from(accommodation),
        transportation_cost: Decimal::from(transport),
        daily_allowance: Decimal::from(allowance),
    }
}

pub(super) fn request(category: Option<&str>, source_id: &str, costs: TravelCosts) -> InspectionRequest {
    InspectionRequest {
        source_id: source_id.to_string(),
        category: category.map(str::to_string),
        inspection_type: "Compliance".to_string(),
        scheduled_date: NaiveDate::from_ymd_opt(2024, 4, 2).expect("valid date"),
        costs,
        province: "Morobe".to_string(),
        notes: None,
        requested_by: user(REGISTRY),
    }
}

pub(super) type MemoryInspections = InspectionService<InMemoryPermitStore, InMemoryInspectionLedger>;

pub(super) fn build_service() -> (
    Arc<MemoryInspections>,
    Arc<InMemoryPermitStore>,
    Arc<InMemoryInspectionLedger>,
) {
    let store = Arc::new(lineage_store());
    let ledger = Arc::new(InMemoryInspectionLedger::default());
    let service = Arc::new(InspectionService::with_clock(
        store.clone(),
        ledger.clone(),
        InvoiceSettings::default(),
        fixed_clock(),
    ));
    (service, store, ledger)
}

/// In-memory ledger with switchable outages for invoice inserts and inspection listing.
#[derive(Default)]
pub(super) struct OutageLedger {
    pub(super) inner: InMemoryInspectionLedger,
    invoices_down: bool,
    listing_down: bool,
}

impl OutageLedger {
    /// Stores inspections but refuses every invoice insert.
    pub(super) fn invoices() -> Self {
        Self {
            invoices_down: true,
            ..Self::default()
        }
    }

    /// Accepts every write but cannot list inspections.
    pub(super) fn listing() -> Self {
        Self {
            listing_down: true,
            ..Self::default()
        }
    }
}

impl InspectionLedger for OutageLedger {
    fn insert_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError> {
        self.inner.insert_inspection(inspection)
    }

    fn update_inspection(&self, inspection: Inspection) -> Result<(), RepositoryError> {
        self.inner.update_inspection(inspection)
    }

    fn fetch_inspection(&self, id: &InspectionId) -> Result<Option<Inspection>, RepositoryError> {
        self.inner.fetch_inspection(id)
    }

    fn list_inspections(&self) -> Result<Vec<Inspection>, RepositoryError> {
        if self.listing_down {
            return Err(RepositoryError::Unavailable(
                "inspection listing timed out".to_string(),
            ));
        }
        self.inner.list_inspections()
    }

    fn delete_inspection(&self, id: &InspectionId) -> Result<(), RepositoryError> {
        self.inner.delete_inspection(id)
    }

    fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, RepositoryError> {
        if self.invoices_down {
            return Err(RepositoryError::Unavailable(
                "invoices table locked".to_string(),
            ));
        }
        self.inner.insert_invoice(invoice)
    }

    fn update_invoice(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        self.inner.update_invoice(invoice)
    }

    fn fetch_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        self.inner.fetch_invoice(id)
    }

    fn invoice_for_inspection(
        &self,
        inspection: &InspectionId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        self.inner.invoice_for_inspection(inspection)
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>, RepositoryError> {
        self.inner.list_invoices()
    }

    fn delete_invoice(&self, id: &InvoiceId) -> Result<(), RepositoryError> {
        self.inner.delete_invoice(id)
    }
}
