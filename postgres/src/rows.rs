//! Row types and their mapping into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use volunteer_core::types::{
    Cause, Event, Feedback, ListedEvent, Organization, Participant, Registration, User,
    display_name,
};

use crate::to_count;

pub(crate) const EVENT_COLUMNS: &str = "e.id, e.cause_id, e.title, e.description, e.event_date, \
     e.location, e.max_participants, e.image_url, e.created_at, e.updated_at";

pub(crate) const REGISTRATION_COLUMNS: &str =
    "r.id, r.event_id, r.user_id, r.registered_at, r.notes";

pub(crate) const USER_COLUMNS: &str = "u.id, u.email, u.first_name, u.last_name, u.created_at";

pub(crate) const ORGANIZATION_COLUMNS: &str =
    "o.id, o.name, o.address, o.email, o.phone, o.created_at";

pub(crate) const CAUSE_COLUMNS: &str =
    "c.id, c.organization_id, c.name, c.description, c.start_date, c.end_date, c.created_at";

pub(crate) const FEEDBACK_COLUMNS: &str =
    "f.id, f.cause_id, f.user_id, f.comment, f.rating, f.created_at";

#[derive(FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    cause_id: Option<Uuid>,
    title: String,
    description: String,
    event_date: DateTime<Utc>,
    location: String,
    max_participants: i32,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id.into(),
            cause_id: row.cause_id.map(Into::into),
            title: row.title,
            description: row.description,
            event_date: row.event_date,
            location: row.location,
            max_participants: u32::try_from(row.max_participants).unwrap_or_default(),
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct ListedEventRow {
    #[sqlx(flatten)]
    event: EventRow,
    registration_count: i64,
}

impl From<ListedEventRow> for ListedEvent {
    fn from(row: ListedEventRow) -> Self {
        Self {
            event: row.event.into(),
            registration_count: to_count(row.registration_count),
        }
    }
}

#[derive(FromRow)]
pub(crate) struct RegistrationRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    registered_at: DateTime<Utc>,
    notes: Option<String>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: row.id.into(),
            event_id: row.event_id.into(),
            user_id: row.user_id.into(),
            registered_at: row.registered_at,
            notes: row.notes,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct ParticipantRow {
    #[sqlx(flatten)]
    registration: RegistrationRow,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            display_name: display_name(
                row.first_name.as_deref(),
                row.last_name.as_deref(),
                &row.email,
            ),
            registration: row.registration.into(),
        }
    }
}

#[derive(FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.into(),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct OrganizationRow {
    id: Uuid,
    name: String,
    address: String,
    email: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            address: row.address,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct CauseRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<CauseRow> for Cause {
    fn from(row: CauseRow) -> Self {
        Self {
            id: row.id.into(),
            organization_id: row.organization_id.into(),
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct FeedbackRow {
    id: Uuid,
    cause_id: Uuid,
    user_id: Uuid,
    comment: String,
    rating: i16,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Self {
            id: row.id.into(),
            cause_id: row.cause_id.into(),
            user_id: row.user_id.into(),
            comment: row.comment,
            rating: u8::try_from(row.rating).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}
