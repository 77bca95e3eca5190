use std::fmt;

use super::domain::{
    IntentRegistration, IntentStatus, PermitApplication, PermitStatus, Profile, ReviewMetadata,
    StaffUnit, UserId,
};
use crate::workflows::notifications::NotificationSubject;

/// Allowed move into `to` from any of `from`, and the units that may make it.
#[derive(Debug)]
pub struct TransitionRule<S: 'static> {
    pub from: &'static [S],
    pub to: S,
    pub units: &'static [StaffUnit],
}

const INTENT_RULES: &[TransitionRule<IntentStatus>] = &[
    TransitionRule {
        from: &[IntentStatus::Pending, IntentStatus::Submitted],
        to: IntentStatus::UnderReview,
        units: &[StaffUnit::Registry],
    },
    TransitionRule {
        from: &[IntentStatus::RequiresClarification],
        to: IntentStatus::UnderReview,
        units: &[StaffUnit::Registry],
    },
    TransitionRule {
        from: &[IntentStatus::UnderReview],
        to: IntentStatus::Approved,
        units: &[StaffUnit::Registry, StaffUnit::ManagingDirector],
    },
    TransitionRule {
        from: &[IntentStatus::UnderReview],
        to: IntentStatus::Rejected,
        units: &[StaffUnit::Registry, StaffUnit::ManagingDirector],
    },
    TransitionRule {
        from: &[IntentStatus::UnderReview],
        to: IntentStatus::RequiresClarification,
        units: &[StaffUnit::Registry, StaffUnit::ManagingDirector],
    },
];

const PERMIT_RULES: &[TransitionRule<PermitStatus>] = &[
    TransitionRule {
        from: &[PermitStatus::Submitted],
        to: PermitStatus::UnderInitialReview,
        units: &[StaffUnit::Registry],
    },
    TransitionRule {
        from: &[PermitStatus::UnderInitialReview],
        to: PermitStatus::UnderReview,
        units: &[StaffUnit::Registry],
    },
    TransitionRule {
        from: &[PermitStatus::RequiresClarification],
        to: PermitStatus::UnderReview,
        units: &[StaffUnit::Registry, StaffUnit::Compliance],
    },
    TransitionRule {
        from: &[PermitStatus::UnderInitialReview],
        to: PermitStatus::RequiresClarification,
        units: &[StaffUnit::Registry],
    },
    TransitionRule {
        from: &[PermitStatus::UnderInitialReview],
        to: PermitStatus::Rejected,
        units: &[StaffUnit::Registry],
    },
    TransitionRule {
        from: &[PermitStatus::UnderReview],
        to: PermitStatus::RequiresClarification,
        units: &[StaffUnit::Compliance, StaffUnit::ManagingDirector],
    },
    TransitionRule {
        from: &[PermitStatus::UnderReview],
        to: PermitStatus::Rejected,
        units: &[StaffUnit::Compliance, StaffUnit::ManagingDirector],
    },
    TransitionRule {
        from: &[PermitStatus::UnderReview],
        to: PermitStatus::Approved,
        units: &[StaffUnit::ManagingDirector],
    },
];

/// Status vocabulary shared by reviewable records.
pub trait ReviewStatus: Copy + Eq + fmt::Debug + 'static {
    fn parse(raw: &str) -> Option<Self>;
    fn label(self) -> &'static str;
    fn is_terminal(self) -> bool;
    fn rules() -> &'static [TransitionRule<Self>];
}

impl ReviewStatus for IntentStatus {
    fn parse(raw: &str) -> Option<Self> {
        IntentStatus::parse(raw)
    }

    fn label(self) -> &'static str {
        IntentStatus::label(self)
    }

    fn is_terminal(self) -> bool {
        matches!(self, IntentStatus::Approved | IntentStatus::Rejected)
    }

    fn rules() -> &'static [TransitionRule<Self>] {
        INTENT_RULES
    }
}

impl ReviewStatus for PermitStatus {
    fn parse(raw: &str) -> Option<Self> {
        PermitStatus::parse(raw)
    }

    fn label(self) -> &'static str {
        PermitStatus::label(self)
    }

    fn is_terminal(self) -> bool {
        matches!(self, PermitStatus::Approved | PermitStatus::Rejected)
    }

    fn rules() -> &'static [TransitionRule<Self>] {
        PERMIT_RULES
    }
}

/// Why a reviewer may not perform a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionDenied {
    #[error("{status} is a final decision")]
    Terminal { status: &'static str },
    #[error("cannot move from {from} to {to}")]
    NotAllowed {
        from: &'static str,
        to: &'static str,
    },
    #[error("{reviewer} is not permitted to move a record to {to}")]
    Forbidden { reviewer: UserId, to: &'static str },
}

/// Check the state graph first, then the reviewer's unit. Admins skip the unit check only.
pub fn authorize<S: ReviewStatus>(
    reviewer: &Profile,
    from: S,
    to: S,
) -> Result<(), TransitionDenied> {
    if from.is_terminal() {
        return Err(TransitionDenied::Terminal {
            status: from.label(),
        });
    }

    let rule = S::rules()
        .iter()
        .find(|rule| rule.to == to && rule.from.contains(&from))
        .ok_or(TransitionDenied::NotAllowed {
            from: from.label(),
            to: to.label(),
        })?;

    if reviewer.role.is_admin() {
        return Ok(());
    }

    let permitted = reviewer.role.is_staff()
        && reviewer
            .unit
            .is_some_and(|unit| rule.units.contains(&unit));
    if permitted {
        Ok(())
    } else {
        Err(TransitionDenied::Forbidden {
            reviewer: reviewer.user_id.clone(),
            to: to.label(),
        })
    }
}

/// Record type that moves through the review workflow.
pub trait Reviewable: Clone {
    type Status: ReviewStatus;

    const SUBJECT: &'static str;

    fn record_id(&self) -> String;
    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
    fn review(&self) -> &ReviewMetadata<Self::Status>;
    fn review_mut(&mut self) -> &mut ReviewMetadata<Self::Status>;
    fn applicant(&self) -> &UserId;
    fn is_frozen(&self) -> bool;
    fn headline(&self) -> &str;
    fn notification_subject(&self) -> NotificationSubject;
}

impl Reviewable for IntentRegistration {
    type Status = IntentStatus;

    const SUBJECT: &'static str = "intent registration";

    fn record_id(&self) -> String {
        self.id.0.clone()
    }

    fn status(&self) -> IntentStatus {
        self.status
    }

    fn set_status(&mut self, status: IntentStatus) {
        self.status = status;
    }

    fn review(&self) -> &ReviewMetadata<IntentStatus> {
        &self.review
    }

    fn review_mut(&mut self) -> &mut ReviewMetadata<IntentStatus> {
        &mut self.review
    }

    fn applicant(&self) -> &UserId {
        &self.applicant
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn headline(&self) -> &str {
        &self.activity_description
    }

    fn notification_subject(&self) -> NotificationSubject {
        NotificationSubject::Intent(self.id.clone())
    }
}

impl Reviewable for PermitApplication {
    type Status = PermitStatus;

    const SUBJECT: &'static str = "permit application";

    fn record_id(&self) -> String {
        self.id.0.clone()
    }

    fn status(&self) -> PermitStatus {
        self.status
    }

    fn set_status(&mut self, status: PermitStatus) {
        self.status = status;
    }

    fn review(&self) -> &ReviewMetadata<PermitStatus> {
        &self.review
    }

    fn review_mut(&mut self) -> &mut ReviewMetadata<PermitStatus> {
        &mut self.review
    }

    fn applicant(&self) -> &UserId {
        &self.applicant
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn headline(&self) -> &str {
        &self.title
    }

    fn notification_subject(&self) -> NotificationSubject {
        NotificationSubject::Permit(self.id.clone())
    }
}
