use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflows::permits::domain::{EntityId, IntentId, PermitActionKind, PermitId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InspectionId(pub String);

impl fmt::Display for InspectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of record an inspection was scheduled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionCategory {
    PermitApplication,
    IntentRegistration,
    PermitAmalgamation,
    PermitAmendment,
    PermitRenewal,
    PermitSurrender,
    PermitTransfer,
}

impl InspectionCategory {
    pub const fn label(self) -> &'static str {
        match self {
            InspectionCategory::PermitApplication => "Permit Application",
            InspectionCategory::IntentRegistration => "Intent Registration",
            InspectionCategory::PermitAmalgamation => "Permit Amalgamation",
            InspectionCategory::PermitAmendment => "Permit Amendment",
            InspectionCategory::PermitRenewal => "Permit Renewal",
            InspectionCategory::PermitSurrender => "Permit Surrender",
            InspectionCategory::PermitTransfer => "Permit Transfer",
        }
    }

    /// Unrecognised or missing categories are treated as direct permit applications.
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = raw
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match normalized.as_str() {
            "intent registration" => InspectionCategory::IntentRegistration,
            "permit amalgamation" => InspectionCategory::PermitAmalgamation,
            "permit amendment" | "amendment" => InspectionCategory::PermitAmendment,
            "permit renewal" | "renewal" => InspectionCategory::PermitRenewal,
            "permit surrender" | "surrender" => InspectionCategory::PermitSurrender,
            "permit transfer" | "transfer" => InspectionCategory::PermitTransfer,
            _ => InspectionCategory::PermitApplication,
        }
    }
}

/// Polymorphic reference an inspection request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionSource {
    PermitApplication(PermitId),
    Intent(IntentId),
    Amalgamation(String),
    Amendment(String),
    Renewal(String),
    Surrender(String),
    Transfer(String),
}

impl InspectionSource {
    pub fn from_category(category: Option<&str>, source_id: impl Into<String>) -> Self {
        let id = source_id.into();
        match InspectionCategory::parse(category) {
            InspectionCategory::PermitApplication => InspectionSource::PermitApplication(PermitId(id)),
            InspectionCategory::IntentRegistration => InspectionSource::Intent(IntentId(id)),
            InspectionCategory::PermitAmalgamation => InspectionSource::Amalgamation(id),
            InspectionCategory::PermitAmendment => InspectionSource::Amendment(id),
            InspectionCategory::PermitRenewal => InspectionSource::Renewal(id),
            InspectionCategory::PermitSurrender => InspectionSource::Surrender(id),
            InspectionCategory::PermitTransfer => InspectionSource::Transfer(id),
        }
    }

    pub fn category(&self) -> InspectionCategory {
        match self {
            InspectionSource::PermitApplication(_) => InspectionCategory::PermitApplication,
            InspectionSource::Intent(_) => InspectionCategory::IntentRegistration,
            InspectionSource::Amalgamation(_) => InspectionCategory::PermitAmalgamation,
            InspectionSource::Amendment(_) => InspectionCategory::PermitAmendment,
            InspectionSource::Renewal(_) => InspectionCategory::PermitRenewal,
            InspectionSource::Surrender(_) => InspectionCategory::PermitSurrender,
            InspectionSource::Transfer(_) => InspectionCategory::PermitTransfer,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            InspectionSource::PermitApplication(id) => &id.0,
            InspectionSource::Intent(id) => &id.0,
            InspectionSource::Amalgamation(id)
            | InspectionSource::Amendment(id)
            | InspectionSource::Renewal(id)
            | InspectionSource::Surrender(id)
            | InspectionSource::Transfer(id) => id,
        }
    }

    /// Permit-action table the source lives in, for the five intermediate kinds.
    pub fn action_kind(&self) -> Option<PermitActionKind> {
        match self {
            InspectionSource::Amalgamation(_) => Some(PermitActionKind::Amalgamation),
            InspectionSource::Amendment(_) => Some(PermitActionKind::Amendment),
            InspectionSource::Renewal(_) => Some(PermitActionKind::Renewal),
            InspectionSource::Surrender(_) => Some(PermitActionKind::Surrender),
            InspectionSource::Transfer(_) => Some(PermitActionKind::Transfer),
            InspectionSource::PermitApplication(_) | InspectionSource::Intent(_) => None,
        }
    }
}

/// Trip cost inputs. Accommodation and allowance are per day; transportation is flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelCosts {
    pub number_of_days: u32,
    #[serde(default)]
    pub accommodation_cost: Decimal,
    #[serde(default)]
    pub transportation_cost: Decimal,
    #[serde(default)]
    pub daily_allowance: Decimal,
}

impl TravelCosts {
    /// `accommodation × days + allowance × days + transportation`, or `CostOverflow`
    /// when the amounts exceed what a decimal can hold.
    pub fn total(&self) -> Result<Decimal, InspectionValidationError> {
        let days = Decimal::from(self.number_of_days);
        self.accommodation_cost
            .checked_mul(days)
            .and_then(|lodging| {
                self.daily_allowance
                    .checked_mul(days)
                    .and_then(|allowance| lodging.checked_add(allowance))
            })
            .and_then(|subtotal| subtotal.checked_add(self.transportation_cost))
            .ok_or(InspectionValidationError::CostOverflow)
    }

    pub fn validate(&self) -> Result<(), InspectionValidationError> {
        if self.number_of_days == 0 {
            return Err(InspectionValidationError::NumberOfDays);
        }
        for (field, amount) in [
            ("accommodation_cost", self.accommodation_cost),
            ("transportation_cost", self.transportation_cost),
            ("daily_allowance", self.daily_allowance),
        ] {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(InspectionValidationError::NegativeCost(field));
            }
        }
        self.total().map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectionValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("number_of_days must be at least 1")]
    NumberOfDays,
    #[error("{0} cannot be negative")]
    NegativeCost(&'static str),
    #[error("travel costs are too large to total")]
    CostOverflow,
}

/// Scheduling request captured from the inspection form.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectionRequest {
    pub source_id: String,
    #[serde(default)]
    pub category: Option<String>,
    pub inspection_type: String,
    pub scheduled_date: NaiveDate,
    #[serde(flatten)]
    pub costs: TravelCosts,
    pub province: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub requested_by: UserId,
}

impl InspectionRequest {
    pub fn source(&self) -> InspectionSource {
        InspectionSource::from_category(self.category.as_deref(), self.source_id.trim())
    }

    pub fn validate(&self) -> Result<(), InspectionValidationError> {
        if self.source_id.trim().is_empty() {
            return Err(InspectionValidationError::MissingField("source_id"));
        }
        if self.inspection_type.trim().is_empty() {
            return Err(InspectionValidationError::MissingField("inspection_type"));
        }
        if self.province.trim().is_empty() {
            return Err(InspectionValidationError::MissingField("province"));
        }
        self.costs.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InspectionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Suspended,
}

impl InspectionStatus {
    pub const ALL: [InspectionStatus; 5] = [
        InspectionStatus::Scheduled,
        InspectionStatus::InProgress,
        InspectionStatus::Completed,
        InspectionStatus::Cancelled,
        InspectionStatus::Suspended,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            InspectionStatus::Scheduled => "scheduled",
            InspectionStatus::InProgress => "in-progress",
            InspectionStatus::Completed => "completed",
            InspectionStatus::Cancelled => "cancelled",
            InspectionStatus::Suspended => "suspended",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: InspectionId,
    pub permit_id: Option<PermitId>,
    pub intent_id: Option<IntentId>,
    pub entity_id: EntityId,
    pub source_category: InspectionCategory,
    pub source_record_id: String,
    pub inspection_type: String,
    pub scheduled_date: NaiveDate,
    pub province: String,
    pub notes: Option<String>,
    pub status: InspectionStatus,
    #[serde(flatten)]
    pub costs: TravelCosts,
    pub total_travel_cost: Decimal,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub inspection_id: InspectionId,
    pub entity_id: EntityId,
    pub payer: UserId,
    pub amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn is_outstanding(&self) -> bool {
        matches!(self.status, InvoiceStatus::Unpaid | InvoiceStatus::Overdue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(days: u32, accommodation: i64, transport: i64, allowance: i64) -> TravelCosts {
        TravelCosts {
            number_of_days: days,
            accommodation_cost: Decimal::from(accommodation),
            transportation_cost: Decimal::from(transport),
            daily_allowance: Decimal::from(allowance),
        }
    }

    #[test]
    fn transportation_is_not_scaled_by_days() {
        for days in 1..=10u32 {
            let total = costs(days, 100, 50, 80).total().expect("fits");
            let expected = Decimal::from(100 * days + 80 * days + 50);
            assert_eq!(total, expected, "days = {days}");
        }
    }

    #[test]
    fn fractional_amounts_stay_exact() {
        let trip = TravelCosts {
            number_of_days: 3,
            accommodation_cost: Decimal::new(12050, 2),
            transportation_cost: Decimal::new(999, 2),
            daily_allowance: Decimal::new(3333, 2),
        };
        assert_eq!(trip.total(), Ok(Decimal::new(47148, 2)));
    }

    #[test]
    fn rejects_zero_days_and_negative_costs() {
        assert_eq!(
            costs(0, 1, 1, 1).validate(),
            Err(InspectionValidationError::NumberOfDays)
        );
        assert_eq!(
            costs(2, 10, -5, 0).validate(),
            Err(InspectionValidationError::NegativeCost("transportation_cost"))
        );
        assert!(costs(1, 0, 0, 0).validate().is_ok());
    }

    #[test]
    fn oversized_costs_fail_validation_instead_of_overflowing() {
        let trip = TravelCosts {
            number_of_days: 2,
            accommodation_cost: Decimal::MAX,
            transportation_cost: Decimal::ZERO,
            daily_allowance: Decimal::ZERO,
        };
        assert_eq!(trip.total(), Err(InspectionValidationError::CostOverflow));
        assert_eq!(trip.validate(), Err(InspectionValidationError::CostOverflow));

        let flat = TravelCosts {
            number_of_days: 1,
            accommodation_cost: Decimal::MAX,
            transportation_cost: Decimal::ONE,
            daily_allowance: Decimal::ZERO,
        };
        assert_eq!(flat.validate(), Err(InspectionValidationError::CostOverflow));
    }

    #[test]
    fn unknown_categories_fall_back_to_permit_applications() {
        for raw in [
            None,
            Some(""),
            Some("Compliance Audit"),
            Some("permit"),
            Some("Intent"),
            Some("Amalgamation"),
        ] {
            assert_eq!(
                InspectionSource::from_category(raw, "pa-1"),
                InspectionSource::PermitApplication(PermitId("pa-1".to_string())),
                "category {raw:?}"
            );
        }
    }

    #[test]
    fn recognised_categories_map_to_their_sources() {
        let cases = [
            ("Intent Registration", InspectionCategory::IntentRegistration),
            ("Permit Amalgamation", InspectionCategory::PermitAmalgamation),
            ("Amendment", InspectionCategory::PermitAmendment),
            ("permit renewal", InspectionCategory::PermitRenewal),
            (" Surrender ", InspectionCategory::PermitSurrender),
            ("Permit Transfer", InspectionCategory::PermitTransfer),
            ("Permit Application", InspectionCategory::PermitApplication),
        ];
        for (raw, expected) in cases {
            let source = InspectionSource::from_category(Some(raw), "rec-1");
            assert_eq!(source.category(), expected, "category {raw}");
            assert_eq!(source.record_id(), "rec-1");
        }
    }

    #[test]
    fn inspection_status_uses_hyphenated_labels() {
        assert_eq!(
            serde_json::to_value(InspectionStatus::InProgress).expect("serializes"),
            serde_json::json!("in-progress")
        );
        assert_eq!(
            InspectionStatus::parse("In-Progress"),
            Some(InspectionStatus::InProgress)
        );
    }
}
