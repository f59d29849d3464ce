//! In-memory implementation of every storage trait.
//!
//! All tables sit behind one mutex, so every operation is atomic with
//! respect to every other one. That makes the capacity and uniqueness
//! checks in `insert_registration` race-free, matching what the
//! `PostgreSQL` store achieves with a row lock and a unique constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use volunteer_core::listing::{EventFilter, PageWindow, SortKey};
use volunteer_core::role::Role;
use volunteer_core::store::{
    CauseRepository, EventCatalog, EventSlice, FeedbackRepository, OrganizationRepository,
    StoreError, StoreResult, UserDirectory, VolunteerStore, entity,
};
use volunteer_core::types::{
    Cause, CauseDetails, CauseId, CauseSummary, Event, EventId, Feedback, FeedbackId,
    ListedEvent, Organization, OrganizationDetails, OrganizationId, Participant, Registration,
    RegistrationId, User, UserId,
};
use volunteer_core::validation::{CauseDraft, EventDraft, OrganizationDraft, UserDraft};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    registrations: HashMap<RegistrationId, Registration>,
    users: HashMap<UserId, User>,
    roles: HashMap<UserId, BTreeSet<Role>>,
    organizations: HashMap<OrganizationId, Organization>,
    causes: HashMap<CauseId, Cause>,
    feedback: HashMap<FeedbackId, Feedback>,
}

impl Tables {
    fn count_for(&self, event_id: EventId) -> u32 {
        let count = self
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn registration_for(&self, event_id: EventId, user_id: UserId) -> Option<&Registration> {
        self.registrations
            .values()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
    }

    fn check_cause(&self, cause_id: Option<CauseId>) -> StoreResult<()> {
        match cause_id {
            Some(id) if !self.causes.contains_key(&id) => {
                Err(StoreError::not_found(entity::CAUSE, id))
            }
            _ => Ok(()),
        }
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn remove_cause(&mut self, id: CauseId) -> bool {
        if self.causes.remove(&id).is_none() {
            return false;
        }
        self.feedback.retain(|_, f| f.cause_id != id);
        for event in self.events.values_mut() {
            if event.cause_id == Some(id) {
                event.cause_id = None;
            }
        }
        true
    }

    fn summary(&self, cause: &Cause) -> StoreResult<CauseSummary> {
        let organization = self
            .organizations
            .get(&cause.organization_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(entity::ORGANIZATION, cause.organization_id))?;
        Ok(CauseSummary {
            cause: cause.clone(),
            organization,
        })
    }

    fn feedback_for(&self, cause_id: CauseId) -> Vec<Feedback> {
        let mut feedback: Vec<Feedback> = self
            .feedback
            .values()
            .filter(|f| f.cause_id == cause_id)
            .cloned()
            .collect();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        feedback
    }
}

/// In-memory store for fast, deterministic tests.
///
/// Clones share the same tables.
///
/// # Example
///
/// ```
/// use volunteer_testing::InMemoryStore;
/// use volunteer_core::store::EventCatalog;
/// use volunteer_core::types::EventId;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new();
/// assert!(store.find_event_by_id(EventId::new()).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StoreError::Database`]
    /// (or succeed again when `false`). Simulates an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored registrations across all events.
    #[must_use]
    pub fn registration_total(&self) -> usize {
        self.lock().registrations.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        Ok(self.lock())
    }
}

#[async_trait]
impl EventCatalog for InMemoryStore {
    async fn find_event_by_id(&self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.tables()?.events.get(&id).cloned())
    }

    async fn count_registrations(&self, event_id: EventId) -> StoreResult<u32> {
        Ok(self.tables()?.count_for(event_id))
    }

    async fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> StoreResult<Option<Registration>> {
        Ok(self.tables()?.registration_for(event_id, user_id).cloned())
    }

    async fn insert_registration(&self, registration: &Registration) -> StoreResult<()> {
        let mut tables = self.tables()?;
        let event_id = registration.event_id;
        let user_id = registration.user_id;

        let max = tables
            .events
            .get(&event_id)
            .map(|e| e.max_participants)
            .ok_or_else(|| StoreError::not_found(entity::EVENT, event_id))?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::not_found(entity::USER, user_id));
        }
        if tables.registration_for(event_id, user_id).is_some() {
            return Err(StoreError::DuplicateRegistration { event_id, user_id });
        }
        if tables.count_for(event_id) >= max {
            return Err(StoreError::CapacityReached { event_id });
        }

        tables
            .registrations
            .insert(registration.id, registration.clone());
        Ok(())
    }

    async fn delete_registration(&self, registration: &Registration) -> StoreResult<bool> {
        Ok(self
            .tables()?
            .registrations
            .remove(&registration.id)
            .is_some())
    }

    async fn query_events(
        &self,
        filter: &EventFilter,
        sort: SortKey,
        window: PageWindow,
    ) -> StoreResult<EventSlice> {
        let tables = self.tables()?;

        let mut matching: Vec<ListedEvent> = tables
            .events
            .values()
            .filter(|event| filter.matches(event))
            .map(|event| ListedEvent {
                event: event.clone(),
                registration_count: tables.count_for(event.id),
            })
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let items = matching
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .collect();

        Ok(EventSlice { items, total })
    }

    async fn create_event(&self, event: &Event) -> StoreResult<()> {
        let mut tables = self.tables()?;
        tables.check_cause(event.cause_id)?;
        if tables.events.contains_key(&event.id) {
            return Err(StoreError::Conflict(format!("event {} exists", event.id)));
        }
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update_event(
        &self,
        id: EventId,
        draft: &EventDraft,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Event> {
        let mut tables = self.tables()?;
        tables.check_cause(draft.cause_id)?;
        let taken = tables.count_for(id);

        let event = tables
            .events
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(entity::EVENT, id))?;
        if taken > draft.max_participants {
            return Err(StoreError::Conflict(format!(
                "event {id} already has {taken} registrations"
            )));
        }

        event.title.clone_from(&draft.title);
        event.description.clone_from(&draft.description);
        event.event_date = draft.event_date;
        event.location.clone_from(&draft.location);
        event.max_participants = draft.max_participants;
        event.image_url.clone_from(&draft.image_url);
        event.cause_id = draft.cause_id;
        event.updated_at = Some(updated_at);
        Ok(event.clone())
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }
        tables.registrations.retain(|_, r| r.event_id != id);
        Ok(true)
    }

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>> {
        let tables = self.tables()?;
        let mut registrations: Vec<&Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .collect();
        registrations.sort_by(|a, b| a.registered_at.cmp(&b.registered_at).then(a.id.cmp(&b.id)));

        Ok(registrations
            .into_iter()
            .map(|r| Participant {
                display_name: tables
                    .users
                    .get(&r.user_id)
                    .map_or_else(|| r.user_id.to_string(), User::display_name),
                registration: r.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryStore {
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let mut organizations: Vec<Organization> =
            self.tables()?.organizations.values().cloned().collect();
        organizations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(organizations)
    }

    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> StoreResult<Option<OrganizationDetails>> {
        let tables = self.tables()?;
        let Some(organization) = tables.organizations.get(&id).cloned() else {
            return Ok(None);
        };
        let mut causes: Vec<Cause> = tables
            .causes
            .values()
            .filter(|c| c.organization_id == id)
            .cloned()
            .collect();
        causes.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(Some(OrganizationDetails {
            organization,
            causes,
        }))
    }

    async fn create_organization(&self, organization: &Organization) -> StoreResult<()> {
        self.tables()?
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }

    async fn update_organization(
        &self,
        id: OrganizationId,
        draft: &OrganizationDraft,
    ) -> StoreResult<Organization> {
        let mut tables = self.tables()?;
        let organization = tables
            .organizations
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(entity::ORGANIZATION, id))?;
        organization.name.clone_from(&draft.name);
        organization.address.clone_from(&draft.address);
        organization.email.clone_from(&draft.email);
        organization.phone.clone_from(&draft.phone);
        Ok(organization.clone())
    }

    async fn delete_organization(&self, id: OrganizationId) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        if tables.organizations.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<CauseId> = tables
            .causes
            .values()
            .filter(|c| c.organization_id == id)
            .map(|c| c.id)
            .collect();
        for cause_id in owned {
            tables.remove_cause(cause_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl CauseRepository for InMemoryStore {
    async fn list_causes(&self) -> StoreResult<Vec<CauseSummary>> {
        let tables = self.tables()?;
        let mut causes: Vec<&Cause> = tables.causes.values().collect();
        causes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        causes.into_iter().map(|c| tables.summary(c)).collect()
    }

    async fn find_cause(&self, id: CauseId) -> StoreResult<Option<CauseDetails>> {
        let tables = self.tables()?;
        let Some(cause) = tables.causes.get(&id) else {
            return Ok(None);
        };
        let summary = tables.summary(cause)?;

        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.cause_id == Some(id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));

        Ok(Some(CauseDetails {
            summary,
            events,
            feedback: tables.feedback_for(id),
        }))
    }

    async fn create_cause(&self, cause: &Cause) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if !tables.organizations.contains_key(&cause.organization_id) {
            return Err(StoreError::not_found(
                entity::ORGANIZATION,
                cause.organization_id,
            ));
        }
        tables.causes.insert(cause.id, cause.clone());
        Ok(())
    }

    async fn update_cause(&self, id: CauseId, draft: &CauseDraft) -> StoreResult<Cause> {
        let mut tables = self.tables()?;
        if !tables.organizations.contains_key(&draft.organization_id) {
            return Err(StoreError::not_found(
                entity::ORGANIZATION,
                draft.organization_id,
            ));
        }
        let cause = tables
            .causes
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(entity::CAUSE, id))?;
        cause.organization_id = draft.organization_id;
        cause.name.clone_from(&draft.name);
        cause.description.clone_from(&draft.description);
        cause.start_date = draft.start_date;
        cause.end_date = draft.end_date;
        Ok(cause.clone())
    }

    async fn delete_cause(&self, id: CauseId) -> StoreResult<bool> {
        Ok(self.tables()?.remove_cause(id))
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryStore {
    async fn add_feedback(&self, feedback: &Feedback) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if !tables.causes.contains_key(&feedback.cause_id) {
            return Err(StoreError::not_found(entity::CAUSE, feedback.cause_id));
        }
        if !tables.users.contains_key(&feedback.user_id) {
            return Err(StoreError::not_found(entity::USER, feedback.user_id));
        }
        tables.feedback.insert(feedback.id, feedback.clone());
        Ok(())
    }

    async fn feedback_for_cause(&self, cause_id: CauseId) -> StoreResult<Vec<Feedback>> {
        Ok(self.tables()?.feedback_for(cause_id))
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.tables()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!(
                "email {} is already in use",
                user.email
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, id: UserId, draft: &UserDraft) -> StoreResult<User> {
        let mut tables = self.tables()?;
        if tables.email_taken(&draft.email, Some(id)) {
            return Err(StoreError::Conflict(format!(
                "email {} is already in use",
                draft.email
            )));
        }
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(entity::USER, id))?;
        user.email.clone_from(&draft.email);
        user.first_name.clone_from(&draft.first_name);
        user.last_name.clone_from(&draft.last_name);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.roles.remove(&id);
        tables.registrations.retain(|_, r| r.user_id != id);
        tables.feedback.retain(|_, f| f.user_id != id);
        Ok(true)
    }

    async fn roles_of(&self, id: UserId) -> StoreResult<BTreeSet<Role>> {
        Ok(self.tables()?.roles.get(&id).cloned().unwrap_or_default())
    }

    async fn grant_role(&self, id: UserId, role: Role) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::not_found(entity::USER, id));
        }
        tables.roles.entry(id).or_default().insert(role);
        Ok(())
    }

    async fn set_roles(&self, id: UserId, roles: &BTreeSet<Role>) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::not_found(entity::USER, id));
        }
        tables.roles.insert(id, roles.clone());
        Ok(())
    }

    async fn users_without_roles(&self) -> StoreResult<Vec<UserId>> {
        let tables = self.tables()?;
        let mut users: Vec<&User> = tables
            .users
            .values()
            .filter(|u| tables.roles.get(&u.id).is_none_or(BTreeSet::is_empty))
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users.into_iter().map(|u| u.id).collect())
    }
}

#[async_trait]
impl VolunteerStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.tables().map(drop)
    }
}
