//! Router configuration.

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{causes, events, health, organizations, registrations, roles, users};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;

/// Build the complete router.
///
/// - `/health`, `/ready`: probes
/// - `/api/...`: events, registrations, organizations, causes, users, roles
///
/// Every request runs inside the correlation id span and `TraceLayer`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Events
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        // Registrations
        .route("/events/:id/register", post(registrations::register))
        .route("/events/:id/unregister", post(registrations::unregister))
        // Organizations
        .route(
            "/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/organizations/:id",
            get(organizations::get_organization)
                .put(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        // Causes
        .route(
            "/causes",
            get(causes::list_causes).post(causes::create_cause),
        )
        .route(
            "/causes/:id",
            get(causes::get_cause)
                .put(causes::update_cause)
                .delete(causes::delete_cause),
        )
        .route(
            "/causes/:id/feedback",
            get(causes::list_feedback).post(causes::add_feedback),
        )
        // Users and roles
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/roles", get(roles::list_roles))
        .route("/roles/:user_id", put(roles::set_roles));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
