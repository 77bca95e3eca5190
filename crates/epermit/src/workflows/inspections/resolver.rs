use serde::Serialize;

use super::domain::{InspectionCategory, InspectionSource};
use crate::workflows::permits::domain::{EntityId, IntentId, PermitId, UserId};
use crate::workflows::permits::PermitStore;
use crate::workflows::RepositoryError;

/// Concrete lineage an inspection is attached to, plus what the invoice needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPermitContext {
    pub permit_id: Option<PermitId>,
    pub intent_id: Option<IntentId>,
    pub entity_id: EntityId,
    pub payer: UserId,
    pub title: String,
}

impl ResolvedPermitContext {
    pub fn has_reference(&self) -> bool {
        self.permit_id.is_some() || self.intent_id.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{} {id} not found", .category.label())]
    NotFound {
        category: InspectionCategory,
        id: String,
    },
    #[error("{} {id} does not reference an underlying permit", .category.label())]
    MissingUnderlyingPermit {
        category: InspectionCategory,
        id: String,
    },
    #[error("no permit application or intent registration could be resolved")]
    MissingReference,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Walk `source` to the permit (or intent) it belongs to.
pub fn resolve<S>(store: &S, source: &InspectionSource) -> Result<ResolvedPermitContext, ResolveError>
where
    S: PermitStore + ?Sized,
{
    let not_found = || ResolveError::NotFound {
        category: source.category(),
        id: source.record_id().to_string(),
    };

    match source {
        InspectionSource::Intent(id) => {
            let intent = store.fetch_intent(id)?.ok_or_else(not_found)?;
            Ok(ResolvedPermitContext {
                permit_id: intent.existing_permit_id,
                intent_id: Some(intent.id),
                entity_id: intent.entity_id,
                payer: intent.applicant,
                title: intent.activity_description,
            })
        }
        InspectionSource::PermitApplication(id) => permit_context(store, id, not_found),
        other => {
            let Some(kind) = other.action_kind() else {
                return Err(ResolveError::MissingReference);
            };
            let action = store
                .fetch_permit_action(kind, other.record_id())?
                .ok_or_else(not_found)?;
            let permit_id = action.underlying_permit().cloned().ok_or_else(|| {
                ResolveError::MissingUnderlyingPermit {
                    category: other.category(),
                    id: action.id.clone(),
                }
            })?;
            permit_context(store, &permit_id, || ResolveError::NotFound {
                category: InspectionCategory::PermitApplication,
                id: permit_id.0.clone(),
            })
        }
    }
}

fn permit_context<S, F>(
    store: &S,
    id: &PermitId,
    not_found: F,
) -> Result<ResolvedPermitContext, ResolveError>
where
    S: PermitStore + ?Sized,
    F: FnOnce() -> ResolveError,
{
    let permit = store.fetch_permit(id)?.ok_or_else(not_found)?;
    Ok(ResolvedPermitContext {
        permit_id: Some(permit.id),
        intent_id: None,
        entity_id: permit.entity_id,
        payer: permit.applicant,
        title: permit.title,
    })
}
