//! HTTP request handlers, one module per resource.

pub mod causes;
pub mod events;
pub mod health;
pub mod organizations;
pub mod registrations;
pub mod roles;
pub mod users;

pub use health::{health_check, readiness_check};
