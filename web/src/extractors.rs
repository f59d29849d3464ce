//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`CurrentActor`]: the caller, resolved from the identity header
//! - [`RequireMember`] / [`RequireAdmin`]: the caller, proven to hold a role
//! - [`ApiPath`] / [`ApiQuery`] / [`ApiJson`]: axum's extractors with
//!   rejections rendered as [`AppError`]
//!
//! Authentication happens upstream. A proxy sets the configured identity
//! header to the caller's user id; a request without it is a guest.
//!
//! ```ignore
//! async fn register(
//!     RequireMember(member): RequireMember,
//!     Path(event_id): Path<EventId>,
//!     State(state): State<AppState>,
//! ) -> Result<Redirect, AppError> { ... }
//! ```

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;
use volunteer_core::role::{Actor, Admin, Member, ensure_default_role};
use volunteer_core::types::UserId;

use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

/// Correlation ID for request tracing.
///
/// Taken from the middleware's request extension, then from the
/// `X-Correlation-ID` header, else freshly generated.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| middleware::from_header(&parts.headers))
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// The caller of the current request.
///
/// A request without the identity header is [`Actor::Guest`]. A request
/// with it must name a known user; that user is given the default role if
/// they hold none yet, and the resulting roles are attached.
///
/// # Rejections
///
/// - 401 when the header is malformed or names an unknown user
/// - 500 when the directory is unavailable
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(&state.identity_header) else {
            return Ok(Self(Actor::Guest));
        };

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| AppError::unauthorized("Malformed identity header"))?;

        if state.store.find_user(user_id).await?.is_none() {
            tracing::warn!(%user_id, "Identity header names an unknown user");
            return Err(AppError::unauthorized("Unknown user"));
        }

        let roles = ensure_default_role(state.store.as_ref(), user_id).await?;
        tracing::debug!(%user_id, ?roles, "Resolved caller");

        Ok(Self(Actor::Authenticated { user_id, roles }))
    }
}

/// Caller holding `User` or `Admin`.
///
/// Rejects guests with 401 and role-less callers with 403.
#[derive(Debug, Clone, Copy)]
pub struct RequireMember(pub Member);

#[async_trait]
impl FromRequestParts<AppState> for RequireMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;
        Ok(Self(actor.require_member()?))
    }
}

/// Caller holding `Admin`.
///
/// Rejects guests with 401 and everyone else with 403.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Admin);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;
        Ok(Self(actor.require_admin()?))
    }
}

/// Path parameters. A malformed id answers with the JSON error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string. Undecodable parameters answer with the JSON error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// JSON request body. Missing content type, bad syntax and wrong shapes
/// answer with the JSON error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
