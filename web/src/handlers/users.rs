//! User directory endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use volunteer_core::role::Role;
use volunteer_core::types::{User, UserId};
use volunteer_core::validation::UserDraft;

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, RequireAdmin, RequireMember};
use crate::state::AppState;

/// All users, by email.
pub async fn list_users(
    RequireMember(_member): RequireMember,
    State(state): State<AppState>,
) -> WebResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

/// One user.
pub async fn get_user(
    RequireMember(_member): RequireMember,
    ApiPath(id): ApiPath<UserId>,
    State(state): State<AppState>,
) -> WebResult<Json<User>> {
    state
        .store
        .find_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("user", id))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Add a user to the directory with the `User` role.
pub async fn create_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<UserDraft>,
) -> WebResult<(StatusCode, Json<User>)> {
    draft.validate()?;
    let user = User {
        id: UserId::new(),
        email: draft.email.trim().to_string(),
        first_name: blank_to_none(draft.first_name),
        last_name: blank_to_none(draft.last_name),
        created_at: state.clock.now(),
    };
    state.store.create_user(&user).await?;
    state.store.grant_role(user.id, Role::User).await?;
    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Edit a user. Emails stay unique.
pub async fn update_user(
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<UserDraft>,
) -> WebResult<Json<User>> {
    draft.validate()?;
    let draft = UserDraft {
        email: draft.email.trim().to_string(),
        first_name: blank_to_none(draft.first_name),
        last_name: blank_to_none(draft.last_name),
    };
    Ok(Json(state.store.update_user(id, &draft).await?))
}

/// Delete a user with their registrations, feedback and roles.
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    State(state): State<AppState>,
) -> WebResult<StatusCode> {
    if admin.user_id() == id {
        return Err(AppError::conflict("Administrators cannot delete themselves"));
    }
    if state.store.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user", id))
    }
}
