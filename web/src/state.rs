//! Application state shared across handlers.

use http::HeaderName;
use std::sync::Arc;
use volunteer_core::{Clock, SystemClock, VolunteerStore};

/// Header carrying the caller's user id when none is configured.
pub const DEFAULT_IDENTITY_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: every field is reference counted or `Copy`-like.
///
/// # Examples
///
/// ```ignore
/// let state = AppState::new(Arc::new(PostgresStore::from_pool(pool)), Arc::new(SystemClock));
/// let app = build_router(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Storage for every entity
    pub store: Arc<dyn VolunteerStore>,
    /// Source of timestamps for new records
    pub clock: Arc<dyn Clock>,
    /// Header the upstream identity proxy sets to the caller's user id
    pub identity_header: HeaderName,
}

impl AppState {
    /// State with the default identity header.
    #[must_use]
    pub fn new(store: Arc<dyn VolunteerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            identity_header: DEFAULT_IDENTITY_HEADER,
        }
    }

    /// State backed by `store` and the system clock.
    #[must_use]
    pub fn with_store(store: Arc<dyn VolunteerStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// Read identities from `header` instead.
    #[must_use]
    pub fn identity_header(mut self, header: HeaderName) -> Self {
        self.identity_header = header;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("identity_header", &self.identity_header)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        // Axum requires Clone state
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn default_header_is_lowercase() {
        assert_eq!(DEFAULT_IDENTITY_HEADER.as_str(), "x-user-id");
    }
}
