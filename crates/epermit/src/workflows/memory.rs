//! Process-local stores used by the bundled server, the demo walkthrough, and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::inspections::{Inspection, InspectionId, InspectionLedger, Invoice, InvoiceId};
use super::notifications::{Notification, NotificationError, NotificationId, NotificationPublisher};
use super::permits::{
    Entity, EntityId, FreezeReport, IntentId, IntentRegistration, PermitActionKind,
    PermitActionRecord, PermitApplication, PermitId, PermitStore, Profile, UserId,
};
use super::RepositoryError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

#[derive(Default)]
struct PermitTables {
    entities: HashMap<EntityId, Entity>,
    profiles: HashMap<UserId, Profile>,
    intents: HashMap<IntentId, IntentRegistration>,
    permits: HashMap<PermitId, PermitApplication>,
    actions: HashMap<(PermitActionKind, String), PermitActionRecord>,
}

/// All permit tables behind one lock, so the entity freeze toggle is atomic.
#[derive(Default, Clone)]
pub struct InMemoryPermitStore {
    tables: Arc<Mutex<PermitTables>>,
}

impl InMemoryPermitStore {
    pub fn insert_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.profiles.contains_key(&profile.user_id) {
            return Err(RepositoryError::Conflict);
        }
        tables.profiles.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    pub fn insert_permit_action(&self, record: PermitActionRecord) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let key = (record.kind, record.id.clone());
        if tables.actions.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        tables.actions.insert(key, record);
        Ok(())
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        let tables = lock(&self.tables)?;
        let mut profiles: Vec<_> = tables.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(profiles)
    }
}

impl PermitStore for InMemoryPermitStore {
    fn insert_entity(&self, entity: Entity) -> Result<Entity, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.entities.contains_key(&entity.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.entities.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    fn fetch_entity(&self, id: &EntityId) -> Result<Option<Entity>, RepositoryError> {
        Ok(lock(&self.tables)?.entities.get(id).cloned())
    }

    fn fetch_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(lock(&self.tables)?.profiles.get(id).cloned())
    }

    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.profiles.get_mut(&profile.user_id) {
            Some(slot) => {
                *slot = profile;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn insert_intent(
        &self,
        intent: IntentRegistration,
    ) -> Result<IntentRegistration, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.intents.contains_key(&intent.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.intents.insert(intent.id.clone(), intent.clone());
        Ok(intent)
    }

    fn update_intent(&self, intent: IntentRegistration) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.intents.get_mut(&intent.id) {
            Some(slot) => {
                *slot = intent;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_intent(&self, id: &IntentId) -> Result<Option<IntentRegistration>, RepositoryError> {
        Ok(lock(&self.tables)?.intents.get(id).cloned())
    }

    fn list_intents(&self) -> Result<Vec<IntentRegistration>, RepositoryError> {
        let tables = lock(&self.tables)?;
        let mut intents: Vec<_> = tables.intents.values().cloned().collect();
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(intents)
    }

    fn insert_permit(
        &self,
        permit: PermitApplication,
    ) -> Result<PermitApplication, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.permits.contains_key(&permit.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.permits.insert(permit.id.clone(), permit.clone());
        Ok(permit)
    }

    fn update_permit(&self, permit: PermitApplication) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.permits.get_mut(&permit.id) {
            Some(slot) => {
                *slot = permit;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_permit(&self, id: &PermitId) -> Result<Option<PermitApplication>, RepositoryError> {
        Ok(lock(&self.tables)?.permits.get(id).cloned())
    }

    fn list_permits(&self) -> Result<Vec<PermitApplication>, RepositoryError> {
        let tables = lock(&self.tables)?;
        let mut permits: Vec<_> = tables.permits.values().cloned().collect();
        permits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(permits)
    }

    fn fetch_permit_action(
        &self,
        kind: PermitActionKind,
        id: &str,
    ) -> Result<Option<PermitActionRecord>, RepositoryError> {
        let tables = lock(&self.tables)?;
        Ok(tables.actions.get(&(kind, id.to_string())).cloned())
    }

    fn set_entity_frozen(
        &self,
        id: &EntityId,
        frozen: bool,
        reason: Option<&str>,
    ) -> Result<FreezeReport, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let entity = tables.entities.get_mut(id).ok_or(RepositoryError::NotFound)?;
        entity.suspended = frozen;
        entity.suspension_reason = if frozen {
            reason.map(str::to_string)
        } else {
            None
        };

        let mut intents = 0;
        for intent in tables.intents.values_mut().filter(|intent| &intent.entity_id == id) {
            intent.frozen = frozen;
            intents += 1;
        }
        let mut permits = 0;
        for permit in tables.permits.values_mut().filter(|permit| &permit.entity_id == id) {
            permit.frozen = frozen;
            permits += 1;
        }

        Ok(FreezeReport {
            entity_id: id.clone(),
            frozen,
            intents,
            permits,
        })
    }
}

#[derive(Default)]
struct LedgerTables {
    inspections: HashMap<InspectionId, Inspection>,
    invoices: HashMap<InvoiceId, Invoice>,
}

#[derive(Default, Clone)]
pub struct InMemoryInspectionLedger {
    tables: Arc<Mutex<LedgerTables>>,
}

impl InspectionLedger for InMemoryInspectionLedger {
    fn insert_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.inspections.contains_key(&inspection.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .inspections
            .insert(inspection.id.clone(), inspection.clone());
        Ok(inspection)
    }

    fn update_inspection(&self, inspection: Inspection) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.inspections.get_mut(&inspection.id) {
            Some(slot) => {
                *slot = inspection;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_inspection(&self, id: &InspectionId) -> Result<Option<Inspection>, RepositoryError> {
        Ok(lock(&self.tables)?.inspections.get(id).cloned())
    }

    fn list_inspections(&self) -> Result<Vec<Inspection>, RepositoryError> {
        Ok(lock(&self.tables)?.inspections.values().cloned().collect())
    }

    fn delete_inspection(&self, id: &InspectionId) -> Result<(), RepositoryError> {
        lock(&self.tables)?
            .inspections
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let duplicate = tables.invoices.values().any(|existing| {
            existing.id == invoice.id || existing.invoice_number == invoice.invoice_number
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        tables.invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(invoice)
    }

    fn update_invoice(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.invoices.get_mut(&invoice.id) {
            Some(slot) => {
                *slot = invoice;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        Ok(lock(&self.tables)?.invoices.get(id).cloned())
    }

    fn invoice_for_inspection(
        &self,
        inspection: &InspectionId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let tables = lock(&self.tables)?;
        Ok(tables
            .invoices
            .values()
            .find(|invoice| &invoice.inspection_id == inspection)
            .cloned())
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>, RepositoryError> {
        let tables = lock(&self.tables)?;
        let mut invoices: Vec<_> = tables.invoices.values().cloned().collect();
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        Ok(invoices)
    }

    fn delete_invoice(&self, id: &InvoiceId) -> Result<(), RepositoryError> {
        lock(&self.tables)?
            .invoices
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Notification inbox keyed by insertion order.
#[derive(Default, Clone)]
pub struct InMemoryNotificationCenter {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationCenter {
    pub fn all(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn events(&self) -> Result<MutexGuard<'_, Vec<Notification>>, NotificationError> {
        self.events
            .lock()
            .map_err(|_| NotificationError::Transport("notification mutex poisoned".to_string()))
    }
}

impl NotificationPublisher for InMemoryNotificationCenter {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events()?.push(notification);
        Ok(())
    }

    fn for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, NotificationError> {
        Ok(self
            .events()?
            .iter()
            .filter(|notification| &notification.user_id == user_id)
            .cloned()
            .collect())
    }

    fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationError> {
        let mut events = self.events()?;
        let notification = events
            .iter_mut()
            .find(|notification| &notification.id == id)
            .ok_or_else(|| NotificationError::NotFound(id.clone()))?;
        notification.read = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::workflows::permits::{
        ActivityLevel, ContactInfo, EntityKind, IntentStatus, PermitClassification, PermitStatus,
        ReviewMetadata, SiteLocation,
    };

    fn entity(id: &str) -> Entity {
        Entity {
            id: EntityId(id.to_string()),
            owner: UserId("owner".to_string()),
            name: "Kumul Minerals".to_string(),
            kind: EntityKind::Company,
            contact: ContactInfo::default(),
            suspended: false,
            suspension_reason: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn intent(id: &str, entity: &str) -> IntentRegistration {
        IntentRegistration {
            id: IntentId(id.to_string()),
            entity_id: EntityId(entity.to_string()),
            applicant: UserId("owner".to_string()),
            activity_description: "Alluvial mining".to_string(),
            activity_level: ActivityLevel::Two,
            site: SiteLocation {
                province: "Morobe".to_string(),
                district: None,
                description: None,
            },
            existing_permit_id: None,
            status: IntentStatus::Pending,
            review: ReviewMetadata::default(),
            frozen: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    fn permit(id: &str, entity: &str) -> PermitApplication {
        PermitApplication {
            id: PermitId(id.to_string()),
            entity_id: EntityId(entity.to_string()),
            applicant: UserId("owner".to_string()),
            intent_id: None,
            title: "Waste discharge".to_string(),
            permit_type: "water".to_string(),
            classification: PermitClassification::default(),
            activity_level: ActivityLevel::Two,
            status: PermitStatus::Draft,
            approval_date: None,
            permit_number: None,
            review: ReviewMetadata::default(),
            frozen: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn freeze_toggle_touches_only_the_entitys_records() {
        let store = InMemoryPermitStore::default();
        store.insert_entity(entity("ent-a")).unwrap();
        store.insert_entity(entity("ent-b")).unwrap();
        store.insert_intent(intent("int-a", "ent-a")).unwrap();
        store.insert_intent(intent("int-b", "ent-b")).unwrap();
        store.insert_permit(permit("pa-a1", "ent-a")).unwrap();
        store.insert_permit(permit("pa-a2", "ent-a")).unwrap();

        let report = store
            .set_entity_frozen(&EntityId("ent-a".to_string()), true, Some("unpaid levies"))
            .unwrap();
        assert_eq!((report.intents, report.permits), (1, 2));

        let frozen = store.fetch_entity(&EntityId("ent-a".to_string())).unwrap().unwrap();
        assert!(frozen.suspended);
        assert_eq!(frozen.suspension_reason.as_deref(), Some("unpaid levies"));
        assert!(store.fetch_permit(&PermitId("pa-a2".to_string())).unwrap().unwrap().frozen);
        assert!(!store.fetch_intent(&IntentId("int-b".to_string())).unwrap().unwrap().frozen);

        store
            .set_entity_frozen(&EntityId("ent-a".to_string()), false, Some("ignored"))
            .unwrap();
        let thawed = store.fetch_entity(&EntityId("ent-a".to_string())).unwrap().unwrap();
        assert!(!thawed.suspended);
        assert_eq!(thawed.suspension_reason, None);
        assert!(!store.fetch_intent(&IntentId("int-a".to_string())).unwrap().unwrap().frozen);
    }

    #[test]
    fn freeze_toggle_rejects_unknown_entities() {
        let store = InMemoryPermitStore::default();
        let err = store
            .set_entity_frozen(&EntityId("ghost".to_string()), true, Some("reason"))
            .unwrap_err();
        assert_eq!(err, RepositoryError::NotFound);
    }

    #[test]
    fn duplicate_inserts_conflict() {
        let store = InMemoryPermitStore::default();
        store.insert_entity(entity("ent-a")).unwrap();
        assert_eq!(
            store.insert_entity(entity("ent-a")).unwrap_err(),
            RepositoryError::Conflict
        );
    }
}
