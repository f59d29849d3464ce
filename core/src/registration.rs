//! Registration workflow.
//!
//! Per (event, user) pair the state machine is
//! `Unregistered → Registered → Unregistered`. [`register`] is the only way
//! in, [`unregister`] the only way out.
//!
//! Both operations run their checks against the catalog first so callers
//! get a precise error, then rely on the catalog to re-check atomically
//! while writing. A rejection from the catalog is mapped back onto the same
//! error the pre-check would have produced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::environment::Clock;
use crate::role::Member;
use crate::store::{EventCatalog, StoreError, entity};
use crate::types::{EventId, Registration, RegistrationId};
use crate::validation::{ValidationError, validate_note};

/// Why a registration request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The event does not exist.
    #[error("event {0} not found")]
    NotFound(EventId),

    /// The user already holds a seat at the event.
    #[error("already registered for this event")]
    AlreadyRegistered,

    /// Every seat is taken.
    #[error("event is full")]
    EventFull,

    /// The user holds no seat to give back.
    #[error("not registered for this event")]
    NotRegistered,

    /// The registration note was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RegistrationError {
    /// The outcome to report for this error, if it is an expected one.
    #[must_use]
    pub const fn outcome(&self) -> Option<RegistrationOutcome> {
        match self {
            Self::AlreadyRegistered => Some(RegistrationOutcome::AlreadyRegistered),
            Self::EventFull => Some(RegistrationOutcome::EventFull),
            Self::NotRegistered => Some(RegistrationOutcome::NotRegistered),
            Self::NotFound(_) | Self::Validation(_) | Self::Storage(_) => None,
        }
    }

    fn from_insert(event_id: EventId, error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity: entity::EVENT, .. } => Self::NotFound(event_id),
            StoreError::DuplicateRegistration { .. } => Self::AlreadyRegistered,
            StoreError::CapacityReached { .. } => Self::EventFull,
            other => Self::Storage(other),
        }
    }
}

/// Result of a register or unregister request, as reported back to the
/// caller on the event's details view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// Seat taken
    Registered,
    /// Seat given back
    Unregistered,
    /// Seat was already held
    AlreadyRegistered,
    /// No seat left
    EventFull,
    /// No seat to give back
    NotRegistered,
}

impl RegistrationOutcome {
    /// Every outcome.
    pub const ALL: [Self; 5] = [
        Self::Registered,
        Self::Unregistered,
        Self::AlreadyRegistered,
        Self::EventFull,
        Self::NotRegistered,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Unregistered => "unregistered",
            Self::AlreadyRegistered => "already_registered",
            Self::EventFull => "event_full",
            Self::NotRegistered => "not_registered",
        }
    }

    /// Whether the request succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Registered | Self::Unregistered)
    }

    /// Human-readable notice.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Registered => "You are registered for this event.",
            Self::Unregistered => "Your registration has been cancelled.",
            Self::AlreadyRegistered => "You are already registered for this event.",
            Self::EventFull => "This event is full.",
            Self::NotRegistered => "You are not registered for this event.",
        }
    }
}

impl fmt::Display for RegistrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown outcome name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown registration outcome: {0}")]
pub struct UnknownOutcome(pub String);

impl FromStr for RegistrationOutcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| UnknownOutcome(s.to_string()))
    }
}

/// Take a seat at an event.
///
/// # Errors
///
/// - [`RegistrationError::NotFound`]: unknown event
/// - [`RegistrationError::AlreadyRegistered`]: the member already holds a seat
/// - [`RegistrationError::EventFull`]: no seat left
/// - [`RegistrationError::Validation`]: the note is too long
/// - [`RegistrationError::Storage`]: anything else from the catalog
#[tracing::instrument(skip(catalog, clock, note), fields(user_id = %member.user_id()))]
pub async fn register<C>(
    catalog: &C,
    clock: &dyn Clock,
    member: Member,
    event_id: EventId,
    note: Option<String>,
) -> Result<Registration, RegistrationError>
where
    C: EventCatalog + ?Sized,
{
    validate_note(note.as_deref())?;
    let user_id = member.user_id();

    let event = catalog
        .find_event_by_id(event_id)
        .await?
        .ok_or(RegistrationError::NotFound(event_id))?;

    if catalog.find_registration(event_id, user_id).await?.is_some() {
        return Err(RegistrationError::AlreadyRegistered);
    }

    let taken = catalog.count_registrations(event_id).await?;
    if taken >= event.max_participants {
        tracing::debug!(taken, max = event.max_participants, "Event is full");
        return Err(RegistrationError::EventFull);
    }

    let registration = Registration {
        id: RegistrationId::new(),
        event_id,
        user_id,
        registered_at: clock.now(),
        notes: note.filter(|n| !n.trim().is_empty()),
    };

    catalog
        .insert_registration(&registration)
        .await
        .map_err(|e| RegistrationError::from_insert(event_id, e))?;

    tracing::info!(registration_id = %registration.id, "Registered");
    Ok(registration)
}

/// Give a seat back.
///
/// # Errors
///
/// - [`RegistrationError::NotRegistered`]: the member holds no seat
/// - [`RegistrationError::Storage`]: anything else from the catalog
#[tracing::instrument(skip(catalog), fields(user_id = %member.user_id()))]
pub async fn unregister<C>(
    catalog: &C,
    member: Member,
    event_id: EventId,
) -> Result<(), RegistrationError>
where
    C: EventCatalog + ?Sized,
{
    let registration = catalog
        .find_registration(event_id, member.user_id())
        .await?
        .ok_or(RegistrationError::NotRegistered)?;

    // A concurrent unregister may have removed it in between.
    if !catalog.delete_registration(&registration).await? {
        return Err(RegistrationError::NotRegistered);
    }

    tracing::info!(registration_id = %registration.id, "Unregistered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_parse_from_their_wire_form() {
        for outcome in RegistrationOutcome::ALL {
            assert_eq!(outcome.as_str().parse(), Ok(outcome));
        }
        assert_eq!(
            "nope".parse::<RegistrationOutcome>(),
            Err(UnknownOutcome("nope".to_string()))
        );
    }

    #[test]
    fn only_expected_errors_have_outcomes() {
        assert_eq!(
            RegistrationError::EventFull.outcome(),
            Some(RegistrationOutcome::EventFull)
        );
        assert_eq!(RegistrationError::NotFound(EventId::new()).outcome(), None);
        assert_eq!(
            RegistrationError::Storage(StoreError::Database("down".into())).outcome(),
            None
        );
    }

    #[test]
    fn store_rejections_map_to_workflow_errors() {
        let event_id = EventId::new();
        assert_eq!(
            RegistrationError::from_insert(event_id, StoreError::CapacityReached { event_id }),
            RegistrationError::EventFull
        );
        assert_eq!(
            RegistrationError::from_insert(event_id, StoreError::not_found(entity::EVENT, event_id)),
            RegistrationError::NotFound(event_id)
        );
        assert!(matches!(
            RegistrationError::from_insert(event_id, StoreError::Conflict("x".into())),
            RegistrationError::Storage(_)
        ));
    }

    #[test]
    fn success_outcomes() {
        assert!(RegistrationOutcome::Registered.is_success());
        assert!(RegistrationOutcome::Unregistered.is_success());
        assert!(!RegistrationOutcome::EventFull.is_success());
    }
}
