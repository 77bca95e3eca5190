use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Registrant (company, individual, agency, or NGO) identifier.
    EntityId
);
identifier!(
    /// Account identifier shared by applicants and staff.
    UserId
);
identifier!(IntentId);
identifier!(PermitId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Individual,
    Company,
    Government,
    Ngo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Registered party that owns intents and permit applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub owner: UserId,
    pub name: String,
    pub kind: EntityKind,
    pub contact: ContactInfo,
    pub suspended: bool,
    pub suspension_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Public,
    Officer,
    Manager,
    Director,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub const fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    pub const fn is_staff(self) -> bool {
        !matches!(self, UserRole::Public)
    }
}

/// Organisational unit a staff member reviews on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffUnit {
    Registry,
    Compliance,
    Finance,
    ManagingDirector,
    Revenue,
}

impl StaffUnit {
    pub const fn label(self) -> &'static str {
        match self {
            StaffUnit::Registry => "registry",
            StaffUnit::Compliance => "compliance",
            StaffUnit::Finance => "finance",
            StaffUnit::ManagingDirector => "managing_director",
            StaffUnit::Revenue => "revenue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub unit: Option<StaffUnit>,
    #[serde(default)]
    pub position: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        let name = self.full_name.trim();
        if name.is_empty() {
            &self.email
        } else {
            name
        }
    }
}

/// Environmental impact tier; level 3 activities carry the heaviest review burden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ActivityLevel {
    One,
    Two,
    Three,
}

impl TryFrom<u8> for ActivityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ActivityLevel::One),
            2 => Ok(ActivityLevel::Two),
            3 => Ok(ActivityLevel::Three),
            other => Err(format!("activity level must be 1, 2, or 3 (found {other})")),
        }
    }
}

impl From<ActivityLevel> for u8 {
    fn from(level: ActivityLevel) -> Self {
        match level {
            ActivityLevel::One => 1,
            ActivityLevel::Two => 2,
            ActivityLevel::Three => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub province: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    RequiresClarification,
}

impl IntentStatus {
    pub const ALL: [IntentStatus; 6] = [
        IntentStatus::Pending,
        IntentStatus::Submitted,
        IntentStatus::UnderReview,
        IntentStatus::Approved,
        IntentStatus::Rejected,
        IntentStatus::RequiresClarification,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            IntentStatus::Pending => "pending",
            IntentStatus::Submitted => "submitted",
            IntentStatus::UnderReview => "under_review",
            IntentStatus::Approved => "approved",
            IntentStatus::Rejected => "rejected",
            IntentStatus::RequiresClarification => "requires_clarification",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    Draft,
    Submitted,
    UnderInitialReview,
    UnderReview,
    RequiresClarification,
    Approved,
    Rejected,
}

impl PermitStatus {
    pub const ALL: [PermitStatus; 7] = [
        PermitStatus::Draft,
        PermitStatus::Submitted,
        PermitStatus::UnderInitialReview,
        PermitStatus::UnderReview,
        PermitStatus::RequiresClarification,
        PermitStatus::Approved,
        PermitStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PermitStatus::Draft => "draft",
            PermitStatus::Submitted => "submitted",
            PermitStatus::UnderInitialReview => "under_initial_review",
            PermitStatus::UnderReview => "under_review",
            PermitStatus::RequiresClarification => "requires_clarification",
            PermitStatus::Approved => "approved",
            PermitStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw))
    }
}

/// Buckets used when filing uploads in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    ConsultationEvidence,
    RegistryFeedback,
    ComplianceReport,
}

impl DocumentCategory {
    pub const fn folder(self) -> &'static str {
        match self {
            DocumentCategory::ConsultationEvidence => "consultation-evidence",
            DocumentCategory::RegistryFeedback => "registry-feedback",
            DocumentCategory::ComplianceReport => "compliance-reports",
        }
    }

    /// Bucket key for an upload: `{user}/{category}/{file}`.
    pub fn storage_key(self, owner: &UserId, file_name: &str) -> String {
        let file_name = file_name.trim().replace('/', "_");
        format!("{}/{}/{}", owner.0, self.folder(), file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub category: DocumentCategory,
    pub storage_key: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// One audited status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord<S> {
    pub from: S,
    pub to: S,
    pub actor: UserId,
    pub at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Review fields written by staff. Attachments and history only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMetadata<S> {
    pub notes: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub attachments: Vec<AttachmentRef>,
    pub history: Vec<TransitionRecord<S>>,
}

impl<S> Default for ReviewMetadata<S> {
    fn default() -> Self {
        Self {
            notes: None,
            reviewed_by: None,
            reviewed_at: None,
            attachments: Vec::new(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRegistration {
    pub id: IntentId,
    pub entity_id: EntityId,
    pub applicant: UserId,
    pub activity_description: String,
    pub activity_level: ActivityLevel,
    pub site: SiteLocation,
    pub existing_permit_id: Option<PermitId>,
    pub status: IntentStatus,
    pub review: ReviewMetadata<IntentStatus>,
    pub frozen: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitClassification {
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitApplication {
    pub id: PermitId,
    pub entity_id: EntityId,
    pub applicant: UserId,
    pub intent_id: Option<IntentId>,
    pub title: String,
    pub permit_type: String,
    pub classification: PermitClassification,
    pub activity_level: ActivityLevel,
    pub status: PermitStatus,
    pub approval_date: Option<NaiveDate>,
    pub permit_number: Option<String>,
    pub review: ReviewMetadata<PermitStatus>,
    pub frozen: bool,
    pub created_at: DateTime<Utc>,
}

/// Post-approval actions that reference one or more existing permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitActionKind {
    Amalgamation,
    Amendment,
    Renewal,
    Surrender,
    Transfer,
}

impl PermitActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            PermitActionKind::Amalgamation => "Permit Amalgamation",
            PermitActionKind::Amendment => "Permit Amendment",
            PermitActionKind::Renewal => "Permit Renewal",
            PermitActionKind::Surrender => "Permit Surrender",
            PermitActionKind::Transfer => "Permit Transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitActionRecord {
    pub id: String,
    pub kind: PermitActionKind,
    pub permit_ids: Vec<PermitId>,
}

impl PermitActionRecord {
    /// Amalgamations list several permits; the first one anchors the lineage.
    pub fn underlying_permit(&self) -> Option<&PermitId> {
        self.permit_ids.first()
    }
}

/// Result of the atomic entity freeze toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeReport {
    pub entity_id: EntityId,
    pub frozen: bool,
    pub intents: usize,
    pub permits: usize,
}
