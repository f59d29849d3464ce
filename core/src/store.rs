//! Storage contracts.
//!
//! The workflows in this crate never see SQL or connection pools; they talk
//! to these traits. Two implementations exist:
//!
//! - `PostgresStore` (in `volunteer-postgres`): production storage
//! - `InMemoryStore` (in `volunteer-testing`): fast, deterministic tests
//!
//! # Concurrency
//!
//! [`EventCatalog::insert_registration`] must re-check uniqueness and
//! capacity atomically with the insert. The workflow's own pre-checks only
//! produce friendlier errors; they are not what keeps the invariants true
//! when two requests race.
//!
//! # Dyn Compatibility
//!
//! Traits use `async_trait` so the web layer can hold an
//! `Arc<dyn VolunteerStore>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::listing::{EventFilter, PageWindow, SortKey};
use crate::role::Role;
use crate::types::{
    Cause, CauseDetails, CauseId, CauseSummary, Event, EventId, Feedback, ListedEvent,
    Organization, OrganizationDetails, OrganizationId, Participant, Registration, User, UserId,
};
use crate::validation::{CauseDraft, EventDraft, OrganizationDraft, UserDraft};

/// Errors returned by store implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The (event, user) pair already has a registration.
    #[error("user {user_id} is already registered for event {event_id}")]
    DuplicateRegistration {
        /// Event
        event_id: EventId,
        /// User
        user_id: UserId,
    },

    /// The event has no seats left.
    #[error("event {event_id} has no seats left")]
    CapacityReached {
        /// Event
        event_id: EventId,
    },

    /// The write would violate a constraint other than the ones above.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying storage failed.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Entity names used in [`StoreError::NotFound`].
pub mod entity {
    /// An event
    pub const EVENT: &str = "event";
    /// A registration
    pub const REGISTRATION: &str = "registration";
    /// A user
    pub const USER: &str = "user";
    /// An organization
    pub const ORGANIZATION: &str = "organization";
    /// A cause
    pub const CAUSE: &str = "cause";
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// One window of listing results plus the total number of matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSlice {
    /// Events inside the requested window, in order
    pub items: Vec<ListedEvent>,
    /// Number of events matching the filter, ignoring the window
    pub total: u64,
}

/// Events and their registrations.
#[async_trait]
pub trait EventCatalog: Send + Sync {
    /// Look up an event.
    async fn find_event_by_id(&self, id: EventId) -> StoreResult<Option<Event>>;

    /// Live number of registrations for an event.
    async fn count_registrations(&self, event_id: EventId) -> StoreResult<u32>;

    /// The registration for an (event, user) pair, if any.
    async fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> StoreResult<Option<Registration>>;

    /// Insert a registration.
    ///
    /// Implementations check, atomically with the insert, that the event
    /// exists, that the pair is not registered yet and that a seat is left.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`], [`StoreError::DuplicateRegistration`] or
    /// [`StoreError::CapacityReached`] when a check fails.
    async fn insert_registration(&self, registration: &Registration) -> StoreResult<()>;

    /// Delete a registration. Returns `false` when it was already gone.
    async fn delete_registration(&self, registration: &Registration) -> StoreResult<bool>;

    /// Filter, sort and window the event catalog.
    async fn query_events(
        &self,
        filter: &EventFilter,
        sort: SortKey,
        window: PageWindow,
    ) -> StoreResult<EventSlice>;

    /// Persist a new event.
    async fn create_event(&self, event: &Event) -> StoreResult<()>;

    /// Overwrite an event's editable fields.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown event, [`StoreError::Conflict`]
    /// when the new limit is below the current number of registrations.
    async fn update_event(
        &self,
        id: EventId,
        draft: &EventDraft,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Event>;

    /// Delete an event and its registrations. Returns `false` when absent.
    async fn delete_event(&self, id: EventId) -> StoreResult<bool>;

    /// Registrations of an event with the participants' display names,
    /// oldest first.
    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>>;
}

/// Organizations.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// All organizations, by name.
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>>;

    /// An organization with its causes.
    async fn find_organization(&self, id: OrganizationId)
    -> StoreResult<Option<OrganizationDetails>>;

    /// Persist a new organization.
    async fn create_organization(&self, organization: &Organization) -> StoreResult<()>;

    /// Overwrite an organization's editable fields.
    async fn update_organization(
        &self,
        id: OrganizationId,
        draft: &OrganizationDraft,
    ) -> StoreResult<Organization>;

    /// Delete an organization and its causes. Returns `false` when absent.
    async fn delete_organization(&self, id: OrganizationId) -> StoreResult<bool>;
}

/// Causes.
#[async_trait]
pub trait CauseRepository: Send + Sync {
    /// All causes with their organizations.
    async fn list_causes(&self) -> StoreResult<Vec<CauseSummary>>;

    /// A cause with organization, events and feedback.
    async fn find_cause(&self, id: CauseId) -> StoreResult<Option<CauseDetails>>;

    /// Persist a new cause.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the organization does not exist.
    async fn create_cause(&self, cause: &Cause) -> StoreResult<()>;

    /// Overwrite a cause's editable fields.
    async fn update_cause(&self, id: CauseId, draft: &CauseDraft) -> StoreResult<Cause>;

    /// Delete a cause and its feedback; its events are detached.
    async fn delete_cause(&self, id: CauseId) -> StoreResult<bool>;
}

/// Feedback on causes.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Persist feedback.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the cause does not exist.
    async fn add_feedback(&self, feedback: &Feedback) -> StoreResult<()>;

    /// Feedback left on a cause, newest first.
    async fn feedback_for_cause(&self, cause_id: CauseId) -> StoreResult<Vec<Feedback>>;
}

/// Users and their roles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users, by email.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Look up a user by id.
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Look up a user by email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persist a new user.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    /// Overwrite a user's editable fields.
    async fn update_user(&self, id: UserId, draft: &UserDraft) -> StoreResult<User>;

    /// Delete a user together with their registrations, feedback and roles.
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;

    /// Roles held by a user.
    async fn roles_of(&self, id: UserId) -> StoreResult<BTreeSet<Role>>;

    /// Grant a role. Granting a held role is a no-op.
    async fn grant_role(&self, id: UserId, role: Role) -> StoreResult<()>;

    /// Replace a user's roles.
    async fn set_roles(&self, id: UserId, roles: &BTreeSet<Role>) -> StoreResult<()>;

    /// Users that hold no role at all.
    async fn users_without_roles(&self) -> StoreResult<Vec<UserId>>;
}

/// Everything the platform stores, behind one handle.
#[async_trait]
pub trait VolunteerStore:
    EventCatalog + OrganizationRepository + CauseRepository + FeedbackRepository + UserDirectory
{
    /// Cheap round-trip used by readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}
