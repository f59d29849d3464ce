//! Event endpoints.
//!
//! - `GET /api/events` - filtered, sorted, paginated listing
//! - `POST /api/events` - create (Admin)
//! - `GET /api/events/:id` - details with participants
//! - `PUT /api/events/:id` - edit (Admin)
//! - `DELETE /api/events/:id` - delete with its registrations (Admin)

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use volunteer_core::listing::{self, EventListing, ListingRequest};
use volunteer_core::registration::RegistrationOutcome;
use volunteer_core::types::{Event, EventDetails, EventId, ListedEvent};
use volunteer_core::validation::EventDraft;

use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentActor, RequireAdmin};
use crate::metrics;
use crate::state::AppState;
use crate::WebResult;

/// List events.
///
/// Query parameters (all optional): `sortOrder`, `searchString`,
/// `locationFilter`, `currentFilter`, `currentLocation`, `pageNumber`.
///
/// ```bash
/// curl 'http://localhost:8080/api/events?searchString=beach&sortOrder=date_desc'
/// ```
pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(request): ApiQuery<ListingRequest>,
) -> WebResult<Json<EventListing>> {
    let listing = listing::list_events(state.store.as_ref(), request).await?;
    Ok(Json(listing))
}

/// Create an event.
pub async fn create_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<EventDraft>,
) -> WebResult<(StatusCode, Json<Event>)> {
    draft.validate()?;

    let event = Event {
        id: EventId::new(),
        cause_id: draft.cause_id,
        title: draft.title,
        description: draft.description,
        event_date: draft.event_date,
        location: draft.location,
        max_participants: draft.max_participants,
        image_url: draft.image_url.filter(|url| !url.trim().is_empty()),
        created_at: state.clock.now(),
        updated_at: None,
    };
    state.store.create_event(&event).await?;

    metrics::record_event_created();
    tracing::info!(event_id = %event.id, admin = %admin.user_id(), "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

/// Query parameters of the details view.
#[derive(Debug, Default, Deserialize)]
pub struct DetailsQuery {
    /// Outcome of the register/unregister request that redirected here
    pub outcome: Option<String>,
}

/// Notice shown after a register/unregister redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeNotice {
    /// The outcome
    pub outcome: RegistrationOutcome,
    /// Whether the request succeeded
    pub success: bool,
    /// Text to show the user
    pub message: &'static str,
}

impl From<RegistrationOutcome> for OutcomeNotice {
    fn from(outcome: RegistrationOutcome) -> Self {
        Self {
            outcome,
            success: outcome.is_success(),
            message: outcome.message(),
        }
    }
}

/// Event details as seen by the caller.
#[derive(Debug, Serialize)]
pub struct EventView {
    /// Event, live count and participants
    #[serde(flatten)]
    pub details: EventDetails,
    /// Whether the caller holds a seat
    pub is_registered: bool,
    /// Result of the caller's last register/unregister request
    pub notice: Option<OutcomeNotice>,
}

/// Event details.
///
/// An unrecognised `outcome` value is ignored.
pub async fn get_event(
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<EventId>,
    ApiQuery(query): ApiQuery<DetailsQuery>,
    State(state): State<AppState>,
) -> WebResult<Json<EventView>> {
    let event = state
        .store
        .find_event_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("event", id))?;
    let participants = state.store.list_participants(id).await?;

    let is_registered = match actor.user_id() {
        Some(user_id) => state.store.find_registration(id, user_id).await?.is_some(),
        None => false,
    };

    let notice = query
        .outcome
        .and_then(|raw| raw.parse::<RegistrationOutcome>().ok())
        .map(OutcomeNotice::from);

    let registration_count = u32::try_from(participants.len()).unwrap_or(u32::MAX);
    Ok(Json(EventView {
        details: EventDetails {
            listed: ListedEvent {
                event,
                registration_count,
            },
            participants,
        },
        is_registered,
        notice,
    }))
}

/// Edit an event.
///
/// Lowering the limit below the current number of registrations is a 409.
pub async fn update_event(
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<EventId>,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<EventDraft>,
) -> WebResult<Json<Event>> {
    draft.validate()?;
    let event = state
        .store
        .update_event(id, &draft, state.clock.now())
        .await?;
    Ok(Json(event))
}

/// Delete an event and its registrations.
pub async fn delete_event(
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<EventId>,
    State(state): State<AppState>,
) -> WebResult<StatusCode> {
    if !state.store.delete_event(id).await? {
        return Err(AppError::not_found("event", id));
    }
    tracing::info!(event_id = %id, admin = %admin.user_id(), "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_carries_message_and_success() {
        let notice = OutcomeNotice::from(RegistrationOutcome::EventFull);
        assert!(!notice.success);
        assert_eq!(notice.message, "This event is full.");

        assert!(OutcomeNotice::from(RegistrationOutcome::Registered).success);
    }
}
