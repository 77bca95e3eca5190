use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::workflows::inspections::{Inspection, InspectionStatus, Invoice, InvoiceStatus};
use crate::workflows::permits::{IntentRegistration, IntentStatus, PermitApplication, PermitStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    pub issued: usize,
    pub outstanding: Decimal,
    pub paid: Decimal,
}

/// Dashboard aggregates. Every known status appears, even with a zero count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermitAnalytics {
    pub generated_at: DateTime<Utc>,
    pub intents_by_status: BTreeMap<&'static str, usize>,
    pub permits_by_status: BTreeMap<&'static str, usize>,
    pub permits_by_activity_level: BTreeMap<u8, usize>,
    pub frozen_records: usize,
    pub inspections_by_status: BTreeMap<&'static str, usize>,
    pub total_travel_cost: Decimal,
    pub invoices: InvoiceTotals,
}

pub fn summarize(
    intents: &[IntentRegistration],
    permits: &[PermitApplication],
    inspections: &[Inspection],
    invoices: &[Invoice],
    generated_at: DateTime<Utc>,
) -> PermitAnalytics {
    let mut intents_by_status: BTreeMap<_, _> =
        IntentStatus::ALL.iter().map(|status| (status.label(), 0)).collect();
    for intent in intents {
        *intents_by_status.entry(intent.status.label()).or_default() += 1;
    }

    let mut permits_by_status: BTreeMap<_, _> =
        PermitStatus::ALL.iter().map(|status| (status.label(), 0)).collect();
    let mut permits_by_activity_level: BTreeMap<u8, usize> =
        [1, 2, 3].into_iter().map(|level| (level, 0)).collect();
    for permit in permits {
        *permits_by_status.entry(permit.status.label()).or_default() += 1;
        *permits_by_activity_level
            .entry(u8::from(permit.activity_level))
            .or_default() += 1;
    }

    let frozen_records = intents.iter().filter(|intent| intent.frozen).count()
        + permits.iter().filter(|permit| permit.frozen).count();

    let mut inspections_by_status: BTreeMap<_, _> = InspectionStatus::ALL
        .iter()
        .map(|status| (status.label(), 0))
        .collect();
    let mut total_travel_cost = Decimal::ZERO;
    for inspection in inspections {
        *inspections_by_status
            .entry(inspection.status.label())
            .or_default() += 1;
        if inspection.status != InspectionStatus::Cancelled {
            total_travel_cost = total_travel_cost.saturating_add(inspection.total_travel_cost);
        }
    }

    let mut totals = InvoiceTotals::default();
    for invoice in invoices {
        totals.issued += 1;
        match invoice.status {
            InvoiceStatus::Paid => totals.paid = totals.paid.saturating_add(invoice.amount),
            InvoiceStatus::Unpaid | InvoiceStatus::Overdue => {
                totals.outstanding = totals.outstanding.saturating_add(invoice.amount)
            }
            InvoiceStatus::Cancelled => {}
        }
    }

    PermitAnalytics {
        generated_at,
        intents_by_status,
        permits_by_status,
        permits_by_activity_level,
        frozen_records,
        inspections_by_status,
        total_travel_cost,
        invoices: totals,
    }
}
