use std::fmt;
use std::string::FromUtf8Error;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::workflows::inspections::{Inspection, Invoice};
use crate::workflows::permits::PermitApplication;
use crate::workflows::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDataset {
    Permits,
    Inspections,
    Invoices,
}

impl ExportDataset {
    pub const fn name(self) -> &'static str {
        match self {
            ExportDataset::Permits => "permits",
            ExportDataset::Inspections => "inspections",
            ExportDataset::Invoices => "invoices",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Accepts `permits` as well as `permits.csv`.
    pub fn parse(raw: &str) -> Result<Self, ExportError> {
        let trimmed = raw.trim();
        let name = trimmed.strip_suffix(".csv").unwrap_or(trimmed);
        match name.to_ascii_lowercase().as_str() {
            "permits" => Ok(ExportDataset::Permits),
            "inspections" => Ok(ExportDataset::Inspections),
            "invoices" => Ok(ExportDataset::Invoices),
            _ => Err(ExportError::UnknownDataset(raw.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    UnknownDataset(String),
    Repository(RepositoryError),
    Csv(csv::Error),
    Io(std::io::Error),
    Utf8(FromUtf8Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::UnknownDataset(name) => write!(f, "unknown export dataset '{}'", name),
            ExportError::Repository(err) => write!(f, "could not load export rows: {}", err),
            ExportError::Csv(err) => write!(f, "failed to write CSV: {}", err),
            ExportError::Io(err) => write!(f, "failed to flush CSV: {}", err),
            ExportError::Utf8(err) => write!(f, "CSV output was not UTF-8: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::UnknownDataset(_) => None,
            ExportError::Repository(err) => Some(err),
            ExportError::Csv(err) => Some(err),
            ExportError::Io(err) => Some(err),
            ExportError::Utf8(err) => Some(err),
        }
    }
}

impl From<RepositoryError> for ExportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<FromUtf8Error> for ExportError {
    fn from(err: FromUtf8Error) -> Self {
        Self::Utf8(err)
    }
}

#[derive(Debug, Serialize)]
struct PermitRow<'a> {
    id: &'a str,
    entity_id: &'a str,
    applicant: &'a str,
    title: &'a str,
    permit_type: &'a str,
    category: &'a str,
    subcategory: Option<&'a str>,
    activity_level: u8,
    status: &'static str,
    permit_number: Option<&'a str>,
    approval_date: Option<String>,
    frozen: bool,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct InspectionRow<'a> {
    id: &'a str,
    permit_id: Option<&'a str>,
    intent_id: Option<&'a str>,
    entity_id: &'a str,
    source_category: &'static str,
    source_record_id: &'a str,
    inspection_type: &'a str,
    scheduled_date: String,
    province: &'a str,
    status: &'static str,
    number_of_days: u32,
    accommodation_cost: Decimal,
    transportation_cost: Decimal,
    daily_allowance: Decimal,
    total_travel_cost: Decimal,
}

#[derive(Debug, Serialize)]
struct InvoiceRow<'a> {
    invoice_number: &'a str,
    inspection_id: &'a str,
    entity_id: &'a str,
    payer: &'a str,
    amount: Decimal,
    currency: &'a str,
    status: &'static str,
    due_date: String,
    paid_at: Option<String>,
}

pub fn permits_csv(permits: &[PermitApplication]) -> Result<String, ExportError> {
    write_rows(permits.iter().map(|permit| PermitRow {
        id: &permit.id.0,
        entity_id: &permit.entity_id.0,
        applicant: &permit.applicant.0,
        title: &permit.title,
        permit_type: &permit.permit_type,
        category: &permit.classification.category,
        subcategory: permit.classification.subcategory.as_deref(),
        activity_level: u8::from(permit.activity_level),
        status: permit.status.label(),
        permit_number: permit.permit_number.as_deref(),
        approval_date: permit.approval_date.map(|date| date.to_string()),
        frozen: permit.frozen,
        created_at: permit.created_at.to_rfc3339(),
    }))
}

pub fn inspections_csv(inspections: &[Inspection]) -> Result<String, ExportError> {
    write_rows(inspections.iter().map(|inspection| InspectionRow {
        id: &inspection.id.0,
        permit_id: inspection.permit_id.as_ref().map(|id| id.0.as_str()),
        intent_id: inspection.intent_id.as_ref().map(|id| id.0.as_str()),
        entity_id: &inspection.entity_id.0,
        source_category: inspection.source_category.label(),
        source_record_id: &inspection.source_record_id,
        inspection_type: &inspection.inspection_type,
        scheduled_date: inspection.scheduled_date.to_string(),
        province: &inspection.province,
        status: inspection.status.label(),
        number_of_days: inspection.costs.number_of_days,
        accommodation_cost: inspection.costs.accommodation_cost,
        transportation_cost: inspection.costs.transportation_cost,
        daily_allowance: inspection.costs.daily_allowance,
        total_travel_cost: inspection.total_travel_cost,
    }))
}

pub fn invoices_csv(invoices: &[Invoice]) -> Result<String, ExportError> {
    write_rows(invoices.iter().map(|invoice| InvoiceRow {
        invoice_number: &invoice.invoice_number,
        inspection_id: &invoice.inspection_id.0,
        entity_id: &invoice.entity_id.0,
        payer: &invoice.payer.0,
        amount: invoice.amount,
        currency: &invoice.currency,
        status: invoice.status.label(),
        due_date: invoice.due_date.to_string(),
        paid_at: invoice.paid_at.map(|at| at.to_rfc3339()),
    }))
}

fn write_rows<T, I>(rows: I) -> Result<String, ExportError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
