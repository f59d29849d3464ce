//! Register and unregister.
//!
//! Both endpoints answer `303 See Other` pointing at the event's details
//! with `?outcome=<outcome>`; the details view turns the outcome into a
//! notice. Only a missing event (on register), an invalid note or a
//! storage failure are reported as errors instead.

use axum::{
    Json,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use volunteer_core::registration::{self, RegistrationError, RegistrationOutcome};
use volunteer_core::types::EventId;

use crate::WebResult;
use crate::extractors::{ApiPath, RequireMember};
use crate::metrics;
use crate::state::AppState;

/// Optional body of a register request.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    /// Note left for the organizers
    #[serde(default)]
    pub notes: Option<String>,
}

/// Where the caller is sent after a register or unregister request.
#[must_use]
pub fn details_location(event_id: EventId, outcome: RegistrationOutcome) -> String {
    format!("/api/events/{event_id}?outcome={outcome}")
}

fn settle(
    event_id: EventId,
    success: RegistrationOutcome,
    result: Result<(), RegistrationError>,
) -> WebResult<Redirect> {
    let outcome = match result {
        Ok(()) => success,
        Err(err) => err.outcome().ok_or(err)?,
    };
    metrics::record_registration(outcome);
    Ok(Redirect::to(&details_location(event_id, outcome)))
}

/// Take a seat.
///
/// ```bash
/// curl -i -X POST http://localhost:8080/api/events/<id>/register \
///   -H 'X-User-Id: <user id>' -H 'Content-Type: application/json' \
///   -d '{"notes": "Bringing gloves"}'
/// ```
pub async fn register(
    RequireMember(member): RequireMember,
    ApiPath(event_id): ApiPath<EventId>,
    State(state): State<AppState>,
    form: Option<Json<RegisterForm>>,
) -> WebResult<Redirect> {
    let notes = form.and_then(|Json(form)| form.notes);
    let result = registration::register(
        state.store.as_ref(),
        state.clock.as_ref(),
        member,
        event_id,
        notes,
    )
    .await
    .map(|_| ());

    settle(event_id, RegistrationOutcome::Registered, result)
}

/// Give a seat back.
pub async fn unregister(
    RequireMember(member): RequireMember,
    ApiPath(event_id): ApiPath<EventId>,
    State(state): State<AppState>,
) -> WebResult<Redirect> {
    let result = registration::unregister(state.store.as_ref(), member, event_id).await;
    settle(event_id, RegistrationOutcome::Unregistered, result)
}
