//! Domain types for the volunteer platform.
//!
//! Identifiers are UUID newtypes so that an `EventId` can never be passed
//! where a `UserId` is expected. Entities are plain data: every relation is
//! loaded explicitly through the store traits in [`crate::store`], there is
//! no lazy navigation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner `Uuid`.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an event.
    EventId
);
define_id!(
    /// Unique identifier for a registration.
    RegistrationId
);
define_id!(
    /// Unique identifier for a user.
    UserId
);
define_id!(
    /// Unique identifier for an organization.
    OrganizationId
);
define_id!(
    /// Unique identifier for a cause.
    CauseId
);
define_id!(
    /// Unique identifier for a feedback entry.
    FeedbackId
);

// ============================================================================
// Events & registrations
// ============================================================================

/// A scheduled volunteer activity with a capacity limit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Cause this event belongs to, if any
    pub cause_id: Option<CauseId>,
    /// Title shown in listings
    pub title: String,
    /// Free-form description
    pub description: String,
    /// When the event takes place
    pub event_date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// Maximum number of registrations accepted
    pub max_participants: u32,
    /// Optional image reference (URL)
    pub image_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// An event together with the live count of its registrations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedEvent {
    /// The event
    #[serde(flatten)]
    pub event: Event,
    /// Number of registrations currently stored for the event
    pub registration_count: u32,
}

impl ListedEvent {
    /// Seats still available.
    #[must_use]
    pub const fn seats_left(&self) -> u32 {
        self.event.max_participants.saturating_sub(self.registration_count)
    }
}

/// A user's claim to one seat at an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration identifier
    pub id: RegistrationId,
    /// Event the seat belongs to
    pub event_id: EventId,
    /// Registered user
    pub user_id: UserId,
    /// When the registration was made
    pub registered_at: DateTime<Utc>,
    /// Optional note left by the user
    pub notes: Option<String>,
}

/// A registration joined with the registered user's display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The registration
    #[serde(flatten)]
    pub registration: Registration,
    /// Display name of the registered user
    pub display_name: String,
}

// ============================================================================
// Users
// ============================================================================

/// A user known to the platform's directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Email address (unique)
    pub email: String,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// When the user was added to the directory
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full name, falling back to the email when no name is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            &self.email,
        )
    }
}

/// `"first last"`, trimmed, or `email` when that leaves nothing.
#[must_use]
pub fn display_name(first_name: Option<&str>, last_name: Option<&str>, email: &str) -> String {
    let full = format!(
        "{} {}",
        first_name.unwrap_or_default(),
        last_name.unwrap_or_default()
    );
    let full = full.trim();
    if full.is_empty() {
        email.to_string()
    } else {
        full.to_string()
    }
}

// ============================================================================
// Organizations, causes & feedback
// ============================================================================

/// The entity on behalf of which causes are run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier
    pub id: OrganizationId,
    /// Name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A campaign belonging to an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// Cause identifier
    pub id: CauseId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Campaign start
    pub start_date: DateTime<Utc>,
    /// Campaign end (strictly after `start_date`)
    pub end_date: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A user's rating and comment on a cause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Feedback identifier
    pub id: FeedbackId,
    /// Cause being rated
    pub cause_id: CauseId,
    /// Author
    pub user_id: UserId,
    /// Comment text
    pub comment: String,
    /// Rating from 1 to 5
    pub rating: u8,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Event details with its participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// The event with its live registration count
    #[serde(flatten)]
    pub listed: ListedEvent,
    /// Everyone registered for the event
    pub participants: Vec<Participant>,
}

/// Organization with the causes it runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDetails {
    /// The organization
    #[serde(flatten)]
    pub organization: Organization,
    /// Causes run by the organization
    pub causes: Vec<Cause>,
}

/// Cause with its owning organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseSummary {
    /// The cause
    #[serde(flatten)]
    pub cause: Cause,
    /// Owning organization
    pub organization: Organization,
}

/// Cause with organization, events and feedback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseDetails {
    /// The cause and its organization
    #[serde(flatten)]
    pub summary: CauseSummary,
    /// Events grouped under the cause
    pub events: Vec<Event>,
    /// Feedback left on the cause
    pub feedback: Vec<Feedback>,
}
