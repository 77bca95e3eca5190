use chrono::NaiveDate;
use epermit::config::WorkflowConfig;
use epermit::workflows::inspections::{InspectionService, InvoiceSettings};
use epermit::workflows::memory::{
    InMemoryInspectionLedger, InMemoryNotificationCenter, InMemoryPermitStore,
};
use epermit::workflows::permits::PermitWorkflow;
use epermit::workflows::reporting::ReportingService;
use epermit::workflows::Clock;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryPermits = PermitWorkflow<InMemoryPermitStore, InMemoryNotificationCenter>;
pub(crate) type MemoryInspections = InspectionService<InMemoryPermitStore, InMemoryInspectionLedger>;
pub(crate) type MemoryReporting = ReportingService<InMemoryPermitStore, InMemoryInspectionLedger>;

/// Workflow services wired onto one shared set of in-memory stores.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) store: Arc<InMemoryPermitStore>,
    pub(crate) permits: Arc<MemoryPermits>,
    pub(crate) inspections: Arc<MemoryInspections>,
    pub(crate) reporting: Arc<MemoryReporting>,
}

impl Services {
    pub(crate) fn in_memory(config: &WorkflowConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryPermitStore::default());
        let ledger = Arc::new(InMemoryInspectionLedger::default());
        let notifications = Arc::new(InMemoryNotificationCenter::default());

        let permits = Arc::new(PermitWorkflow::new(
            store.clone(),
            notifications.clone(),
            config,
            clock.clone(),
        ));
        let inspections = Arc::new(InspectionService::with_clock(
            store.clone(),
            ledger.clone(),
            InvoiceSettings::from(config),
            clock.clone(),
        ));
        let reporting = Arc::new(ReportingService::with_clock(store.clone(), ledger, clock));

        Self {
            store,
            permits,
            inspections,
            reporting,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|err| format!("failed to parse '{raw}' as an amount ({err})"))?;
    if amount.is_sign_negative() {
        return Err(format!("'{raw}' must not be negative"));
    }
    Ok(amount)
}
