//! Cause and feedback endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use volunteer_core::types::{Cause, CauseDetails, CauseId, CauseSummary, Feedback, FeedbackId};
use volunteer_core::validation::{CauseDraft, FeedbackDraft};

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, RequireAdmin, RequireMember};
use crate::state::AppState;

/// All causes with their organizations.
pub async fn list_causes(State(state): State<AppState>) -> WebResult<Json<Vec<CauseSummary>>> {
    Ok(Json(state.store.list_causes().await?))
}

/// A cause with organization, events and feedback.
pub async fn get_cause(
    ApiPath(id): ApiPath<CauseId>,
    State(state): State<AppState>,
) -> WebResult<Json<CauseDetails>> {
    state
        .store
        .find_cause(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("cause", id))
}

/// Create a cause. The organization must exist.
pub async fn create_cause(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<CauseDraft>,
) -> WebResult<(StatusCode, Json<Cause>)> {
    draft.validate()?;
    let cause = Cause {
        id: CauseId::new(),
        organization_id: draft.organization_id,
        name: draft.name,
        description: draft.description,
        start_date: draft.start_date,
        end_date: draft.end_date,
        created_at: state.clock.now(),
    };
    state.store.create_cause(&cause).await?;
    tracing::info!(cause_id = %cause.id, organization_id = %cause.organization_id, "Cause created");
    Ok((StatusCode::CREATED, Json(cause)))
}

/// Edit a cause.
pub async fn update_cause(
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CauseId>,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<CauseDraft>,
) -> WebResult<Json<Cause>> {
    draft.validate()?;
    Ok(Json(state.store.update_cause(id, &draft).await?))
}

/// Delete a cause and its feedback. Its events stay, detached.
pub async fn delete_cause(
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CauseId>,
    State(state): State<AppState>,
) -> WebResult<StatusCode> {
    if state.store.delete_cause(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("cause", id))
    }
}

/// Feedback on a cause, newest first.
pub async fn list_feedback(
    ApiPath(id): ApiPath<CauseId>,
    State(state): State<AppState>,
) -> WebResult<Json<Vec<Feedback>>> {
    Ok(Json(state.store.feedback_for_cause(id).await?))
}

/// Leave feedback on a cause.
pub async fn add_feedback(
    RequireMember(member): RequireMember,
    ApiPath(id): ApiPath<CauseId>,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<FeedbackDraft>,
) -> WebResult<(StatusCode, Json<Feedback>)> {
    draft.validate()?;
    let feedback = Feedback {
        id: FeedbackId::new(),
        cause_id: id,
        user_id: member.user_id(),
        comment: draft.comment,
        rating: draft.rating,
        created_at: state.clock.now(),
    };
    state.store.add_feedback(&feedback).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}
