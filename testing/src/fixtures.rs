//! Builders for test data.

use chrono::{DateTime, Duration, TimeZone, Utc};
use volunteer_core::role::{Actor, Role};
use volunteer_core::store::{StoreResult, UserDirectory};
use volunteer_core::types::{Cause, CauseId, Event, EventId, Organization, OrganizationId, User, UserId};

/// Midnight UTC on the given day. Out-of-range dates fall back to the Unix
/// epoch.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Fluent builder for [`Event`].
///
/// ```
/// use volunteer_testing::fixtures::{EventBuilder, date};
///
/// let event = EventBuilder::new("Beach cleanup")
///     .on(date(2024, 3, 1))
///     .at("Venice Beach")
///     .capacity(2)
///     .build();
/// assert_eq!(event.max_participants, 2);
/// ```
#[derive(Clone, Debug)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// Start from an event with sensible defaults.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            event: Event {
                id: EventId::new(),
                cause_id: None,
                title: title.to_string(),
                description: format!("{title}: bring water and a friend"),
                event_date: date(2024, 1, 1),
                location: "Community Center".to_string(),
                max_participants: 10,
                image_url: None,
                created_at: date(2023, 12, 1),
                updated_at: None,
            },
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.event.description = description.to_string();
        self
    }

    /// Set the date.
    #[must_use]
    pub const fn on(mut self, event_date: DateTime<Utc>) -> Self {
        self.event.event_date = event_date;
        self
    }

    /// Set the location.
    #[must_use]
    pub fn at(mut self, location: &str) -> Self {
        self.event.location = location.to_string();
        self
    }

    /// Set the participant limit.
    #[must_use]
    pub const fn capacity(mut self, max_participants: u32) -> Self {
        self.event.max_participants = max_participants;
        self
    }

    /// Attach to a cause.
    #[must_use]
    pub const fn in_cause(mut self, cause_id: CauseId) -> Self {
        self.event.cause_id = Some(cause_id);
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> Event {
        self.event
    }
}

/// A user with the given email and no name.
#[must_use]
pub fn user(email: &str) -> User {
    User {
        id: UserId::new(),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        created_at: date(2024, 1, 1),
    }
}

/// A user with a first and last name.
#[must_use]
pub fn named_user(email: &str, first_name: &str, last_name: &str) -> User {
    User {
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        ..user(email)
    }
}

/// An organization with placeholder contact details.
#[must_use]
pub fn organization(name: &str) -> Organization {
    Organization {
        id: OrganizationId::new(),
        name: name.to_string(),
        address: "1 Main Street".to_string(),
        email: "contact@example.org".to_string(),
        phone: "555-0100".to_string(),
        created_at: date(2024, 1, 1),
    }
}

/// A cause running for 90 days from 2024-01-01.
#[must_use]
pub fn cause(organization_id: OrganizationId, name: &str) -> Cause {
    let start = date(2024, 1, 1);
    Cause {
        id: CauseId::new(),
        organization_id,
        name: name.to_string(),
        description: format!("{name} campaign"),
        start_date: start,
        end_date: start + Duration::days(90),
        created_at: start,
    }
}

/// Store a new user holding `roles` and return the matching actor.
///
/// # Errors
///
/// Propagates [`volunteer_core::store::StoreError`] from the directory.
pub async fn enroll<D>(directory: &D, email: &str, roles: &[Role]) -> StoreResult<Actor>
where
    D: UserDirectory + ?Sized,
{
    let user = user(email);
    directory.create_user(&user).await?;
    for role in roles {
        directory.grant_role(user.id, *role).await?;
    }
    Ok(Actor::authenticated(user.id, roles.iter().copied()))
}
