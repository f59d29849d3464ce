//! HTTP API for the volunteer platform.
//!
//! Handlers are thin: they extract the caller and the request, call the
//! workflows and stores from `volunteer-core`, and map the result onto a
//! response.
//!
//! # Request Flow
//!
//! 1. [`middleware`] assigns a correlation id and opens a tracing span
//! 2. [`extractors`] resolve the caller from the identity header
//! 3. The handler validates input and calls the store or a workflow
//! 4. Domain errors become [`AppError`] responses through `From`
//!
//! # Example
//!
//! ```ignore
//! use volunteer_web::{AppState, build_router};
//!
//! let state = AppState::new(store, Arc::new(SystemClock));
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{
    ApiJson, ApiPath, ApiQuery, CorrelationId, CurrentActor, RequireAdmin, RequireMember,
};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
