use super::domain::{Inspection, InspectionId, Invoice, InvoiceId};
use crate::workflows::RepositoryError;

/// Storage for the `inspections` and `invoices` tables.
pub trait InspectionLedger: Send + Sync {
    fn insert_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError>;
    fn update_inspection(&self, inspection: Inspection) -> Result<(), RepositoryError>;
    fn fetch_inspection(&self, id: &InspectionId) -> Result<Option<Inspection>, RepositoryError>;
    fn list_inspections(&self) -> Result<Vec<Inspection>, RepositoryError>;
    fn delete_inspection(&self, id: &InspectionId) -> Result<(), RepositoryError>;

    fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, RepositoryError>;
    fn update_invoice(&self, invoice: Invoice) -> Result<(), RepositoryError>;
    fn fetch_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError>;
    fn invoice_for_inspection(
        &self,
        inspection: &InspectionId,
    ) -> Result<Option<Invoice>, RepositoryError>;
    fn list_invoices(&self) -> Result<Vec<Invoice>, RepositoryError>;
    fn delete_invoice(&self, id: &InvoiceId) -> Result<(), RepositoryError>;
}
