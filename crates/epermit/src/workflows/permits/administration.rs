use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{EntityId, FreezeReport, Profile, StaffUnit, UserId, UserRole};
use super::repository::PermitStore;
use crate::workflows::RepositoryError;

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpdate {
    pub role: UserRole,
    #[serde(default)]
    pub unit: Option<StaffUnit>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Admin-only actions: entity suspension cascade and staff role changes.
pub struct AdministrationService<S> {
    store: Arc<S>,
}

impl<S> AdministrationService<S>
where
    S: PermitStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Freeze the entity and every intent/permit it owns through the store's atomic toggle.
    pub fn suspend_entity(
        &self,
        entity_id: &EntityId,
        actor: &UserId,
        reason: &str,
    ) -> Result<FreezeReport, AdministrationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AdministrationError::MissingReason);
        }
        self.require_admin(actor)?;
        let entity = self
            .store
            .fetch_entity(entity_id)?
            .ok_or_else(|| AdministrationError::EntityNotFound(entity_id.clone()))?;
        if entity.suspended {
            return Err(AdministrationError::AlreadySuspended(entity.id));
        }

        let report = self.store.set_entity_frozen(entity_id, true, Some(reason))?;
        warn!(
            entity = %entity_id,
            intents = report.intents,
            permits = report.permits,
            actor = %actor,
            "entity suspended"
        );
        Ok(report)
    }

    pub fn activate_entity(
        &self,
        entity_id: &EntityId,
        actor: &UserId,
    ) -> Result<FreezeReport, AdministrationError> {
        self.require_admin(actor)?;
        let entity = self
            .store
            .fetch_entity(entity_id)?
            .ok_or_else(|| AdministrationError::EntityNotFound(entity_id.clone()))?;
        if !entity.suspended {
            return Err(AdministrationError::NotSuspended(entity.id));
        }

        let report = self.store.set_entity_frozen(entity_id, false, None)?;
        info!(
            entity = %entity_id,
            intents = report.intents,
            permits = report.permits,
            actor = %actor,
            "entity reactivated"
        );
        Ok(report)
    }

    pub fn update_staff_role(
        &self,
        actor: &UserId,
        target: &UserId,
        update: RoleUpdate,
    ) -> Result<Profile, AdministrationError> {
        let admin = self.require_admin(actor)?;
        if actor == target {
            return Err(AdministrationError::SelfRoleChange);
        }
        if update.role == UserRole::SuperAdmin && admin.role != UserRole::SuperAdmin {
            return Err(AdministrationError::Forbidden(actor.clone()));
        }

        let mut profile = self
            .store
            .fetch_profile(target)?
            .ok_or_else(|| AdministrationError::ProfileNotFound(target.clone()))?;
        profile.role = update.role;
        profile.unit = if update.role.is_staff() {
            update.unit
        } else {
            None
        };
        profile.position = update
            .position
            .map(|position| position.trim().to_string())
            .filter(|position| !position.is_empty());

        self.store.update_profile(profile.clone())?;
        info!(target = %target, actor = %actor, role = ?profile.role, "staff role updated");
        Ok(profile)
    }

    fn require_admin(&self, actor: &UserId) -> Result<Profile, AdministrationError> {
        let profile = self
            .store
            .fetch_profile(actor)?
            .ok_or_else(|| AdministrationError::ProfileNotFound(actor.clone()))?;
        if profile.role.is_admin() {
            Ok(profile)
        } else {
            Err(AdministrationError::Forbidden(actor.clone()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdministrationError {
    #[error("a suspension reason is required")]
    MissingReason,
    #[error("user {0} is not an administrator")]
    Forbidden(UserId),
    #[error("administrators cannot change their own role")]
    SelfRoleChange,
    #[error("profile {0} not found")]
    ProfileNotFound(UserId),
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("entity {0} is already suspended")]
    AlreadySuspended(EntityId),
    #[error("entity {0} is not suspended")]
    NotSuspended(EntityId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
