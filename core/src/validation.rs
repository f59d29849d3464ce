//! Input drafts and their validation rules.
//!
//! Drafts are what callers submit to create or edit a record. Each draft
//! validates itself before it reaches a store, so stores only ever see
//! well-formed data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CauseId, OrganizationId};

/// Maximum length of an event title.
pub const MAX_TITLE_LEN: usize = 150;
/// Maximum length of an event or cause description.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum length of an event location.
pub const MAX_LOCATION_LEN: usize = 200;
/// Maximum length of a registration note.
pub const MAX_NOTE_LEN: usize = 500;
/// Maximum length of a feedback comment.
pub const MAX_COMMENT_LEN: usize = 2000;
/// Allowed range for an event's participant limit.
pub const PARTICIPANT_LIMIT: std::ops::RangeInclusive<u32> = 1..=1000;
/// Allowed range for a feedback rating.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// A draft failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty or blank.
    #[error("{field} is required")]
    Required {
        /// Field name
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Maximum length in characters
        max: usize,
    },

    /// A numeric field was outside its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Lower bound (inclusive)
        min: i64,
        /// Upper bound (inclusive)
        max: i64,
    },

    /// A date range ended before it started.
    #[error("end date must be after start date")]
    EndBeforeStart,

    /// An email address was malformed.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),
}

fn required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    bounded(field, value, max)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !trimmed.contains(' ') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail(value.to_string())),
    }
}

/// Validate an optional registration note.
///
/// # Errors
///
/// Returns [`ValidationError::TooLong`] if the note exceeds [`MAX_NOTE_LEN`].
pub fn validate_note(note: Option<&str>) -> Result<(), ValidationError> {
    note.map_or(Ok(()), |n| bounded("notes", n, MAX_NOTE_LEN))
}

/// Fields submitted when creating or editing an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Date and time
    pub event_date: DateTime<Utc>,
    /// Location
    pub location: String,
    /// Participant limit
    pub max_participants: u32,
    /// Optional image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Optional cause the event belongs to
    #[serde(default)]
    pub cause_id: Option<CauseId>,
}

impl EventDraft {
    /// Check every field of the draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("title", &self.title, MAX_TITLE_LEN)?;
        required("description", &self.description, MAX_DESCRIPTION_LEN)?;
        required("location", &self.location, MAX_LOCATION_LEN)?;
        if !PARTICIPANT_LIMIT.contains(&self.max_participants) {
            return Err(ValidationError::OutOfRange {
                field: "max_participants",
                min: i64::from(*PARTICIPANT_LIMIT.start()),
                max: i64::from(*PARTICIPANT_LIMIT.end()),
            });
        }
        Ok(())
    }
}

/// Fields submitted when creating or editing an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    /// Name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
}

impl OrganizationDraft {
    /// Check every field of the draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name, 200)?;
        required("address", &self.address, 300)?;
        required("phone", &self.phone, 50)?;
        email(&self.email)
    }
}

/// Fields submitted when creating or editing a cause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseDraft {
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Campaign start
    pub start_date: DateTime<Utc>,
    /// Campaign end
    pub end_date: DateTime<Utc>,
}

impl CauseDraft {
    /// Check every field of the draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found; a cause whose end is not
    /// strictly after its start is rejected with
    /// [`ValidationError::EndBeforeStart`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name, 200)?;
        required("description", &self.description, MAX_DESCRIPTION_LEN)?;
        if self.start_date >= self.end_date {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(())
    }
}

/// Fields submitted when leaving feedback on a cause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    /// Comment text
    pub comment: String,
    /// Rating from 1 to 5
    pub rating: u8,
}

impl FeedbackDraft {
    /// Check every field of the draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("comment", &self.comment, MAX_COMMENT_LEN)?;
        if !RATING_RANGE.contains(&self.rating) {
            return Err(ValidationError::OutOfRange {
                field: "rating",
                min: i64::from(*RATING_RANGE.start()),
                max: i64::from(*RATING_RANGE.end()),
            });
        }
        Ok(())
    }
}

/// Fields submitted when an administrator creates or edits a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    /// Email address
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserDraft {
    /// Check every field of the draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        email(&self.email)?;
        if let Some(first) = &self.first_name {
            bounded("first_name", first, 100)?;
        }
        if let Some(last) = &self.last_name {
            bounded("last_name", last, 100)?;
        }
        Ok(())
    }
}
