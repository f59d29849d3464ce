//! Role administration.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use volunteer_core::role::Role;
use volunteer_core::types::{User, UserId};

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, RequireAdmin};
use crate::state::AppState;

/// A user with the roles they hold.
#[derive(Debug, Serialize)]
pub struct UserRoles {
    /// The user
    #[serde(flatten)]
    pub user: User,
    /// Roles held
    pub roles: BTreeSet<Role>,
}

/// Every user's roles, plus the roles that can be assigned.
#[derive(Debug, Serialize)]
pub struct RolesOverview {
    /// Assignable roles
    pub roles: Vec<Role>,
    /// Users and their roles
    pub users: Vec<UserRoles>,
}

/// Body of a role replacement.
#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    /// The user's new roles
    pub roles: BTreeSet<Role>,
}

/// Users with their roles.
pub async fn list_roles(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> WebResult<Json<RolesOverview>> {
    let mut users = Vec::new();
    for user in state.store.list_users().await? {
        let roles = state.store.roles_of(user.id).await?;
        users.push(UserRoles { user, roles });
    }
    Ok(Json(RolesOverview {
        roles: Role::ALL.to_vec(),
        users,
    }))
}

/// Replace a user's roles.
///
/// An administrator cannot drop their own `Admin` role.
pub async fn set_roles(
    RequireAdmin(admin): RequireAdmin,
    ApiPath(user_id): ApiPath<UserId>,
    State(state): State<AppState>,
    ApiJson(update): ApiJson<RoleUpdate>,
) -> WebResult<Json<UserRoles>> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user", user_id))?;

    if admin.user_id() == user_id && !update.roles.contains(&Role::Admin) {
        return Err(AppError::conflict(
            "Administrators cannot remove their own Admin role",
        ));
    }

    state.store.set_roles(user_id, &update.roles).await?;
    tracing::info!(%user_id, roles = ?update.roles, "Roles replaced");

    Ok(Json(UserRoles {
        user,
        roles: update.roles,
    }))
}
