use super::domain::{
    Entity, EntityId, FreezeReport, IntentId, IntentRegistration, PermitActionKind,
    PermitActionRecord, PermitApplication, PermitId, Profile, UserId,
};
use crate::workflows::RepositoryError;

/// Storage abstraction over the registrant, intent, permit, and permit-action tables.
///
/// Updates overwrite the stored row; concurrent reviewers race with last-write-wins
/// semantics because no version column is checked.
pub trait PermitStore: Send + Sync {
    fn insert_entity(&self, entity: Entity) -> Result<Entity, RepositoryError>;
    fn fetch_entity(&self, id: &EntityId) -> Result<Option<Entity>, RepositoryError>;

    fn fetch_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError>;
    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError>;

    fn insert_intent(
        &self,
        intent: IntentRegistration,
    ) -> Result<IntentRegistration, RepositoryError>;
    fn update_intent(&self, intent: IntentRegistration) -> Result<(), RepositoryError>;
    fn fetch_intent(&self, id: &IntentId) -> Result<Option<IntentRegistration>, RepositoryError>;
    fn list_intents(&self) -> Result<Vec<IntentRegistration>, RepositoryError>;

    fn insert_permit(&self, permit: PermitApplication)
        -> Result<PermitApplication, RepositoryError>;
    fn update_permit(&self, permit: PermitApplication) -> Result<(), RepositoryError>;
    fn fetch_permit(&self, id: &PermitId) -> Result<Option<PermitApplication>, RepositoryError>;
    fn list_permits(&self) -> Result<Vec<PermitApplication>, RepositoryError>;

    fn fetch_permit_action(
        &self,
        kind: PermitActionKind,
        id: &str,
    ) -> Result<Option<PermitActionRecord>, RepositoryError>;

    /// Flip the entity's suspension flag and the `frozen` flag of every intent and permit it
    /// owns in one atomic operation. `reason` is only recorded when freezing.
    fn set_entity_frozen(
        &self,
        id: &EntityId,
        frozen: bool,
        reason: Option<&str>,
    ) -> Result<FreezeReport, RepositoryError>;
}
