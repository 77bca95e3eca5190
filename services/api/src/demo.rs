use crate::infra::{parse_amount, parse_date, Services};
use chrono::{Duration, NaiveDate, NaiveTime};
use clap::Args;
use epermit::config::WorkflowConfig;
use epermit::error::AppError;
use epermit::workflows::inspections::{InspectionRequest, TravelCosts};
use epermit::workflows::permits::{
    ActivityLevel, ContactInfo, EntityKind, EntityRegistration, IntentSubmission,
    PermitClassification, PermitDraftRequest, Profile, ReviewRequest, SiteLocation, StaffUnit,
    UserId, UserRole,
};
use epermit::workflows::reporting::ExportDataset;
use epermit::workflows::{Clock, FixedClock, SystemClock};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::sync::Arc;

const APPLICANT: &str = "demo-applicant";
const REGISTRY: &str = "demo-registry";
const DIRECTOR: &str = "demo-director";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pin the workflow clock to this date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Province used for the site and the inspection trip.
    #[arg(long, default_value = "Morobe")]
    pub(crate) province: String,
    /// Stop after the permit is approved.
    #[arg(long)]
    pub(crate) skip_inspection: bool,
    /// Print the CSV exports at the end of the walkthrough.
    #[arg(long)]
    pub(crate) show_exports: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TravelCostArgs {
    /// Number of days on site (at least one)
    #[arg(long)]
    pub(crate) days: u32,
    /// Accommodation cost per day
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub(crate) accommodation: Decimal,
    /// One-off transportation cost
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub(crate) transportation: Decimal,
    /// Daily allowance per day
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub(crate) allowance: Decimal,
}

pub(crate) fn run_travel_cost(args: TravelCostArgs) -> Result<(), AppError> {
    let costs = TravelCosts {
        number_of_days: args.days,
        accommodation_cost: args.accommodation,
        transportation_cost: args.transportation,
        daily_allowance: args.allowance,
    };

    let total = match costs.validate().and_then(|_| costs.total()) {
        Ok(total) => total,
        Err(err) => {
            println!("Travel costs rejected: {}", err);
            return Ok(());
        }
    };

    println!("Inspection travel cost");
    println!(
        "- Accommodation: {} x {} days",
        costs.accommodation_cost, costs.number_of_days
    );
    println!(
        "- Daily allowance: {} x {} days",
        costs.daily_allowance, costs.number_of_days
    );
    println!("- Transportation: {}", costs.transportation_cost);
    println!("Total: {}", total);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let clock: Arc<dyn Clock> = match args.today {
        Some(day) => Arc::new(FixedClock(day.and_time(NaiveTime::MIN).and_utc())),
        None => Arc::new(SystemClock),
    };
    let config = WorkflowConfig::default();
    let services = Services::in_memory(&config, clock.clone());
    seed_staff(&services)?;

    println!("ePermit workflow demo");

    let Some(entity) = step(
        "Entity registration",
        services.permits.applicants.register_entity(EntityRegistration {
            owner: user(APPLICANT),
            name: "Markham Valley Agro Ltd".to_string(),
            kind: EntityKind::Company,
            contact: ContactInfo {
                email: Some("compliance@markhamagro.example".to_string()),
                ..ContactInfo::default()
            },
        }),
    ) else {
        return Ok(());
    };
    println!("- Registered entity {} ({})", entity.name, entity.id);

    let Some(intent) = step(
        "Intent registration",
        services.permits.applicants.register_intent(IntentSubmission {
            entity_id: entity.id.clone(),
            applicant: user(APPLICANT),
            activity_description: "Palm oil mill effluent ponds".to_string(),
            activity_level: ActivityLevel::Two,
            site: SiteLocation {
                province: args.province.clone(),
                ..SiteLocation::default()
            },
            existing_permit_id: None,
        }),
    ) else {
        return Ok(());
    };
    println!("- Intent {} -> {}", intent.id, intent.status.label());

    for (reviewer, status) in [(REGISTRY, "under_review"), (DIRECTOR, "approved")] {
        let Some(intent) = step(
            "Intent review",
            services
                .permits
                .reviews
                .review_intent(&intent.id, review(reviewer, status)),
        ) else {
            return Ok(());
        };
        println!("  {} moved intent to {}", reviewer, intent.status.label());
    }

    let Some(draft) = step(
        "Permit draft",
        services.permits.applicants.create_permit(PermitDraftRequest {
            intent_id: intent.id.clone(),
            applicant: user(APPLICANT),
            title: "Mill effluent discharge".to_string(),
            permit_type: "Water Discharge".to_string(),
            classification: PermitClassification {
                category: "Agriculture".to_string(),
                subcategory: Some("Palm oil".to_string()),
            },
        }),
    ) else {
        return Ok(());
    };
    let Some(permit) = step(
        "Permit submission",
        services
            .permits
            .applicants
            .submit_permit(&draft.id, &user(APPLICANT)),
    ) else {
        return Ok(());
    };
    println!("- Permit {} -> {}", permit.id, permit.status.label());

    let mut approved = permit;
    for (reviewer, status) in [
        (REGISTRY, "under_initial_review"),
        (REGISTRY, "under_review"),
        (DIRECTOR, "approved"),
    ] {
        let Some(permit) = step(
            "Permit review",
            services
                .permits
                .reviews
                .review_permit(&approved.id, review(reviewer, status)),
        ) else {
            return Ok(());
        };
        println!("  {} moved permit to {}", reviewer, permit.status.label());
        approved = permit;
    }
    if let (Some(number), Some(date)) = (&approved.permit_number, approved.approval_date) {
        println!("  Issued {} on {}", number, date);
    }

    match services.permits.notifications_for(&user(APPLICANT)) {
        Ok(notices) => {
            println!("\nApplicant notifications ({})", notices.len());
            for notice in notices.iter().take(3) {
                println!("- [{:?}] {}", notice.tone, notice.title);
            }
        }
        Err(err) => println!("  Notifications unavailable: {}", err),
    }

    if args.skip_inspection {
        return Ok(());
    }

    let Some(outcome) = step(
        "Inspection scheduling",
        services.inspections.schedule(InspectionRequest {
            source_id: approved.id.0.clone(),
            category: Some("Permit Application".to_string()),
            inspection_type: "Post-approval compliance".to_string(),
            scheduled_date: clock.today() + Duration::days(14),
            costs: TravelCosts {
                number_of_days: 3,
                accommodation_cost: Decimal::from(180),
                transportation_cost: Decimal::from(650),
                daily_allowance: Decimal::from(95),
            },
            province: args.province.clone(),
            notes: Some("Sample effluent ponds 1-3".to_string()),
            requested_by: user(REGISTRY),
        }),
    ) else {
        return Ok(());
    };
    let inspection = outcome.inspection();
    println!(
        "\nInspection {} scheduled for {} in {} (travel cost {})",
        inspection.id, inspection.scheduled_date, inspection.province, inspection.total_travel_cost
    );

    match outcome.invoice() {
        Some(invoice) => {
            println!(
                "- Invoice {} for {} {} due {}",
                invoice.invoice_number, invoice.amount, invoice.currency, invoice.due_date
            );
            if let Some(paid) = step(
                "Invoice payment",
                services.inspections.record_payment(&invoice.id),
            ) {
                println!("  Payment recorded -> {}", paid.status.label());
            }
        }
        None => println!("- No invoice raised"),
    }

    let Some(summary) = step("Summary", services.reporting.summary()) else {
        return Ok(());
    };
    println!("\nPortfolio summary");
    for (status, count) in summary.permits_by_status.iter().filter(|(_, n)| **n > 0) {
        println!("- permits {}: {}", status, count);
    }
    println!("- travel cost committed: {}", summary.total_travel_cost);
    println!(
        "- invoices: {} issued, {} outstanding, {} paid",
        summary.invoices.issued, summary.invoices.outstanding, summary.invoices.paid
    );

    if args.show_exports {
        for dataset in [
            ExportDataset::Permits,
            ExportDataset::Inspections,
            ExportDataset::Invoices,
        ] {
            let csv = services.reporting.export(dataset)?;
            println!("\n{}\n{}", dataset.file_name(), csv.trim_end());
        }
    }

    Ok(())
}

fn step<T, E: Display>(stage: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            println!("  {} failed: {}", stage, err);
            None
        }
    }
}

fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

fn review(reviewer: &str, status: &str) -> ReviewRequest {
    ReviewRequest {
        reviewer_id: user(reviewer),
        status: status.to_string(),
        notes: format!("Demo decision: {}", status.replace('_', " ")),
        attachments: Vec::new(),
    }
}

fn seed_staff(services: &Services) -> Result<(), AppError> {
    let profiles = [
        (APPLICANT, "Demo Applicant", UserRole::Public, None),
        (
            REGISTRY,
            "Registry Officer",
            UserRole::Officer,
            Some(StaffUnit::Registry),
        ),
        (
            DIRECTOR,
            "Managing Director",
            UserRole::Director,
            Some(StaffUnit::ManagingDirector),
        ),
    ];
    for (id, name, role, unit) in profiles {
        services.store.insert_profile(Profile {
            user_id: user(id),
            full_name: name.to_string(),
            email: format!("{id}@cepa.gov.pg"),
            role,
            unit,
            position: None,
        })?;
    }
    Ok(())
}
