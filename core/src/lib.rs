//! # Volunteer Core
//!
//! Domain types and workflows of the volunteer platform.
//!
//! ## Components
//!
//! - [`listing`]: filtered, sorted and paginated event listing
//! - [`registration`]: capacity- and uniqueness-checked registration
//! - [`store`]: storage contracts the workflows depend on
//! - [`role`]: roles, actors and capability checks
//! - [`validation`]: input drafts and their rules
//!
//! ## Architecture
//!
//! Workflows are plain async functions taking an explicit storage handle:
//!
//! ```ignore
//! use volunteer_core::{listing, registration};
//!
//! let page = listing::list_events(store.as_ref(), request).await?;
//!
//! let member = actor.require_member()?;
//! registration::register(store.as_ref(), &clock, member, event_id, None).await?;
//! ```
//!
//! Nothing here knows about SQL or HTTP. Storage lives behind the
//! [`store`] traits and capability checks are expressed as proof values
//! ([`role::Member`], [`role::Admin`]) that callers must obtain first.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod environment;
pub mod listing;
pub mod registration;
pub mod role;
pub mod store;
pub mod types;
pub mod validation;

pub use environment::{Clock, SystemClock};
pub use listing::{EventListing, ListingRequest, PAGE_SIZE, Paginated, SortKey};
pub use registration::{RegistrationError, RegistrationOutcome};
pub use role::{AccessError, Actor, Role};
pub use store::{StoreError, StoreResult, VolunteerStore};
