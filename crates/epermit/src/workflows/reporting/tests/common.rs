use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(super) use crate::workflows::permits::tests::common::{
    action, fixed_clock, intent, now, permit, seeded_store, user, REGISTRY,
};

use crate::workflows::inspections::{
    InspectionProgress, InspectionRequest, InspectionService, InvoiceSettings, TravelCosts,
};
use crate::workflows::memory::{InMemoryInspectionLedger, InMemoryPermitStore};
use crate::workflows::permits::{ActivityLevel, IntentStatus, PermitActionKind, PermitStatus, PermitStore};
use crate::workflows::reporting::ReportingService;

pub(super) type MemoryReporting = ReportingService<InMemoryPermitStore, InMemoryInspectionLedger>;

pub(super) struct Fixture {
    pub(super) reporting: Arc<MemoryReporting>,
    pub(super) inspections: InspectionService<InMemoryPermitStore, InMemoryInspectionLedger>,
}

pub(super) fn empty_fixture() -> Fixture {
    build(seeded_store())
}

/// Two permits and a frozen intent, with three inspections:
/// a 590 renewal visit, a paid 100 visit, and a cancelled 20 visit.
pub(super) fn busy_fixture() -> Fixture {
    let store = seeded_store();
    store
        .insert_permit(permit("pa-1", PermitStatus::Approved))
        .expect("seed permit");
    let mut level_three = permit("pa-2", PermitStatus::UnderReview);
    level_three.activity_level = ActivityLevel::Three;
    store.insert_permit(level_three).expect("seed permit");

    let mut frozen = intent("int-1", IntentStatus::Submitted);
    frozen.frozen = true;
    store.insert_intent(frozen).expect("seed intent");
    store
        .insert_permit_action(action(PermitActionKind::Renewal, "ren-1", &["pa-1"]))
        .expect("seed action");

    let fixture = build(store);
    let service = &fixture.inspections;

    service
        .schedule(request(Some("Permit Renewal"), "ren-1", 3, 100, 50, 80))
        .expect("renewal visit");

    let paid = service
        .schedule(request(None, "pa-2", 1, 100, 0, 0))
        .expect("site visit");
    let invoice = paid.invoice().expect("invoice raised").id.clone();
    service.record_payment(&invoice).expect("payment recorded");

    let cancelled = service
        .schedule(request(None, "pa-1", 2, 10, 0, 0))
        .expect("follow-up visit");
    service
        .update_status(&cancelled.inspection().id, InspectionProgress::Cancel)
        .expect("cancelled");

    fixture
}

fn build(store: InMemoryPermitStore) -> Fixture {
    let store = Arc::new(store);
    let ledger = Arc::new(InMemoryInspectionLedger::default());
    let inspections = InspectionService::with_clock(
        store.clone(),
        ledger.clone(),
        InvoiceSettings::default(),
        fixed_clock(),
    );
    let reporting = Arc::new(ReportingService::with_clock(store, ledger, fixed_clock()));
    Fixture {
        reporting,
        inspections,
    }
}

fn request(
    category: Option<&str>,
    source_id: &str,
    days: u32,
    accommodation: i64,
    transport: i64,
    allowance: i64,
) -> InspectionRequest {
    InspectionRequest {
        source_id: source_id.to_string(),
        category: category.map(str::to_string),
        inspection_type: "Compliance".to_string(),
        scheduled_date: NaiveDate::from_ymd_opt(2024, 4, 2).expect("valid date"),
        costs: TravelCosts {
            number_of_days: days,
            accommodation_cost: Decimal::from(accommodation),
            transportation_cost: Decimal::from(transport),
            daily_allowance: Decimal::from(allowance),
        },
        province: "Morobe".to_string(),
        notes: None,
        requested_by: user(REGISTRY),
    }
}
