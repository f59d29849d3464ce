//! Organization endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use volunteer_core::types::{Organization, OrganizationDetails, OrganizationId};
use volunteer_core::validation::OrganizationDraft;

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, RequireAdmin};
use crate::state::AppState;

/// All organizations, by name.
pub async fn list_organizations(
    State(state): State<AppState>,
) -> WebResult<Json<Vec<Organization>>> {
    Ok(Json(state.store.list_organizations().await?))
}

/// An organization with its causes.
pub async fn get_organization(
    ApiPath(id): ApiPath<OrganizationId>,
    State(state): State<AppState>,
) -> WebResult<Json<OrganizationDetails>> {
    state
        .store
        .find_organization(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("organization", id))
}

/// Create an organization.
pub async fn create_organization(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<OrganizationDraft>,
) -> WebResult<(StatusCode, Json<Organization>)> {
    draft.validate()?;
    let organization = Organization {
        id: OrganizationId::new(),
        name: draft.name,
        address: draft.address,
        email: draft.email.trim().to_string(),
        phone: draft.phone,
        created_at: state.clock.now(),
    };
    state.store.create_organization(&organization).await?;
    tracing::info!(organization_id = %organization.id, "Organization created");
    Ok((StatusCode::CREATED, Json(organization)))
}

/// Edit an organization.
pub async fn update_organization(
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrganizationId>,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<OrganizationDraft>,
) -> WebResult<Json<Organization>> {
    draft.validate()?;
    Ok(Json(state.store.update_organization(id, &draft).await?))
}

/// Delete an organization and its causes.
pub async fn delete_organization(
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrganizationId>,
    State(state): State<AppState>,
) -> WebResult<StatusCode> {
    if state.store.delete_organization(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("organization", id))
    }
}
