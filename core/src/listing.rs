//! Event listing: search, location filter, sort and pagination.
//!
//! # Flow
//!
//! ```text
//! ListingRequest ──resolve()──▶ ResolvedListing ──query_events()──▶ EventSlice
//!   (raw query)                  (sort, filter, page)                 (window + total)
//!                                                                        │
//!                                           EventListing ◀──Paginated::new()
//! ```
//!
//! Filters apply before sorting and sorting before pagination; all three are
//! pushed down into the store in a single call so that the page is cut from
//! the sorted, filtered set.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::store::{EventCatalog, StoreResult};
use crate::types::{Event, ListedEvent};

/// Number of events on one listing page.
pub const PAGE_SIZE: u32 = 6;

/// Column a listing is ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    /// Event title
    Title,
    /// Event date
    Date,
    /// Event location
    Location,
    /// Live registration count
    Participants,
}

/// Requested listing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Title, A→Z
    Title,
    /// Title, Z→A
    TitleDesc,
    /// Date, oldest first
    #[default]
    Date,
    /// Date, newest first
    DateDesc,
    /// Location, A→Z
    Location,
    /// Location, Z→A
    LocationDesc,
    /// Fewest participants first
    Participants,
    /// Most participants first
    ParticipantsDesc,
}

impl SortKey {
    /// Every sort key.
    pub const ALL: [Self; 8] = [
        Self::Title,
        Self::TitleDesc,
        Self::Date,
        Self::DateDesc,
        Self::Location,
        Self::LocationDesc,
        Self::Participants,
        Self::ParticipantsDesc,
    ];

    /// Parse a raw sort key. Never fails: anything unrecognised, including
    /// a missing key, sorts by date ascending. Matching ignores ASCII case.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::default();
        };
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(raw))
            .unwrap_or_default()
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::TitleDesc => "title_desc",
            Self::Date => "date",
            Self::DateDesc => "date_desc",
            Self::Location => "location",
            Self::LocationDesc => "location_desc",
            Self::Participants => "participants",
            Self::ParticipantsDesc => "participants_desc",
        }
    }

    /// Column this key orders by.
    #[must_use]
    pub const fn field(&self) -> SortField {
        match self {
            Self::Title | Self::TitleDesc => SortField::Title,
            Self::Date | Self::DateDesc => SortField::Date,
            Self::Location | Self::LocationDesc => SortField::Location,
            Self::Participants | Self::ParticipantsDesc => SortField::Participants,
        }
    }

    /// Whether the order is descending.
    #[must_use]
    pub const fn is_descending(&self) -> bool {
        matches!(
            self,
            Self::TitleDesc | Self::DateDesc | Self::LocationDesc | Self::ParticipantsDesc
        )
    }

    /// Compare two listed events under this key. Ties fall back to the
    /// event id so that pages are stable.
    #[must_use]
    pub fn compare(&self, a: &ListedEvent, b: &ListedEvent) -> Ordering {
        let primary = match self.field() {
            SortField::Title => a.event.title.cmp(&b.event.title),
            SortField::Date => a.event.event_date.cmp(&b.event.event_date),
            SortField::Location => a.event.location.cmp(&b.event.location),
            SortField::Participants => a.registration_count.cmp(&b.registration_count),
        };
        let primary = if self.is_descending() {
            primary.reverse()
        } else {
            primary
        };
        primary.then_with(|| a.event.id.cmp(&b.event.id))
    }
}

/// Text filters applied to the catalog.
///
/// Matching is a case-sensitive substring test; an empty filter matches
/// everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Matched against title OR description
    pub search: Option<String>,
    /// Matched against location
    pub location: Option<String>,
}

impl EventFilter {
    /// Build a filter, dropping empty strings.
    #[must_use]
    pub fn new(search: Option<String>, location: Option<String>) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()),
            location: location.filter(|s| !s.is_empty()),
        }
    }

    /// Whether `event` passes the filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            event.title.contains(needle) || event.description.contains(needle)
        });
        let location_ok = self
            .location
            .as_deref()
            .is_none_or(|needle| event.location.contains(needle));
        search_ok && location_ok
    }
}

/// Offset/limit window handed to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// Number of matching rows to skip
    pub offset: u64,
    /// Maximum number of rows to return
    pub limit: u32,
}

impl PageWindow {
    /// Window for a 1-based page number.
    #[must_use]
    pub fn for_page(page_number: u32) -> Self {
        Self {
            offset: u64::from(page_number.saturating_sub(1)) * u64::from(PAGE_SIZE),
            limit: PAGE_SIZE,
        }
    }
}

/// Raw listing parameters as they arrive from a caller. All optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    /// Requested sort key
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Search text remembered from a previous page
    #[serde(default)]
    pub current_filter: Option<String>,
    /// Newly submitted search text
    #[serde(default)]
    pub search_string: Option<String>,
    /// Newly submitted location filter
    #[serde(default)]
    pub location_filter: Option<String>,
    /// Location filter remembered from a previous page
    #[serde(default)]
    pub current_location: Option<String>,
    /// Requested page, 1-based. Kept raw; see [`parse_page_number`].
    #[serde(default)]
    pub page_number: Option<String>,
}

/// Read a page number leniently.
///
/// Anything that is not an integer is page 1, values below 1 clamp to 1 and
/// values beyond `u32` saturate. Never fails.
#[must_use]
pub fn parse_page_number(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return 1;
    };
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    // Only overflow can fail once the input is all digits.
    digits.parse::<u32>().unwrap_or(u32::MAX).max(1)
}

/// Listing parameters after defaults and page-reset rules were applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedListing {
    /// Sort order
    pub sort: SortKey,
    /// Text filters
    pub filter: EventFilter,
    /// Page number, at least 1
    pub page_number: u32,
}

impl ListingRequest {
    /// Apply the listing rules.
    ///
    /// Submitting a non-empty search or location filter returns to page
    /// one. Otherwise, including when the submitted fields are empty, the
    /// remembered filters are reused so paging keeps the current result
    /// set. Page numbers are read with [`parse_page_number`].
    #[must_use]
    pub fn resolve(self) -> ResolvedListing {
        let sort = SortKey::parse(self.sort_order.as_deref());
        let search_string = self.search_string.filter(|s| !s.is_empty());
        let location_filter = self.location_filter.filter(|s| !s.is_empty());
        let filters_submitted = search_string.is_some() || location_filter.is_some();

        let (search, location, page_number) = if filters_submitted {
            (search_string, location_filter, 1)
        } else {
            (
                self.current_filter,
                self.current_location,
                parse_page_number(self.page_number.as_deref()),
            )
        };

        ResolvedListing {
            sort,
            filter: EventFilter::new(search, location),
            page_number,
        }
    }
}

/// One page of results with navigation metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page (at most `page_size`)
    pub items: Vec<T>,
    /// 1-based page number
    pub page_number: u32,
    /// Page size
    pub page_size: u32,
    /// Number of matching items across all pages
    pub total_count: u64,
    /// `ceil(total_count / page_size)`, at least 1
    pub total_pages: u32,
    /// `page_number > 1`
    pub has_previous: bool,
    /// `page_number < total_pages`
    pub has_next: bool,
}

impl<T> Paginated<T> {
    /// Wrap a page of items.
    #[must_use]
    pub fn new(items: Vec<T>, page_number: u32, page_size: u32, total_count: u64) -> Self {
        let pages = total_count.div_ceil(u64::from(page_size.max(1)));
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX).max(1);

        Self {
            items,
            page_number,
            page_size,
            total_count,
            total_pages,
            has_previous: page_number > 1,
            has_next: page_number < total_pages,
        }
    }
}

/// A listing page plus the parameters needed to request the next one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListing {
    /// The page
    #[serde(flatten)]
    pub page: Paginated<ListedEvent>,
    /// Sort order in effect
    pub current_sort: SortKey,
    /// Search text in effect (send back as `currentFilter`)
    pub current_filter: Option<String>,
    /// Location filter in effect (send back as `currentLocation`)
    pub location_filter: Option<String>,
}

/// Produce one page of the event catalog.
///
/// # Errors
///
/// Propagates [`crate::store::StoreError`] from the catalog.
#[tracing::instrument(skip(catalog))]
pub async fn list_events<C>(catalog: &C, request: ListingRequest) -> StoreResult<EventListing>
where
    C: EventCatalog + ?Sized,
{
    let resolved = request.resolve();
    let window = PageWindow::for_page(resolved.page_number);

    let slice = catalog
        .query_events(&resolved.filter, resolved.sort, window)
        .await?;

    tracing::debug!(
        total = slice.total,
        returned = slice.items.len(),
        page = resolved.page_number,
        "Listed events"
    );

    Ok(EventListing {
        page: Paginated::new(slice.items, resolved.page_number, PAGE_SIZE, slice.total),
        current_sort: resolved.sort,
        current_filter: resolved.filter.search,
        location_filter: resolved.filter.location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sort_keys_round_trip_through_parse() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(Some(key.as_str())), key);
        }
    }

    #[test]
    fn unknown_sort_keys_default_to_date() {
        assert_eq!(SortKey::parse(None), SortKey::Date);
        assert_eq!(SortKey::parse(Some("")), SortKey::Date);
        assert_eq!(SortKey::parse(Some("popularity")), SortKey::Date);
    }

    #[test]
    fn capitalised_keys_are_accepted() {
        assert_eq!(SortKey::parse(Some("Date")), SortKey::Date);
        assert_eq!(SortKey::parse(Some("Location")), SortKey::Location);
        assert_eq!(SortKey::parse(Some("Participants")), SortKey::Participants);
    }

    #[test]
    fn submitted_search_resets_page() {
        let resolved = ListingRequest {
            search_string: Some("beach".to_string()),
            current_filter: Some("park".to_string()),
            page_number: Some("4".to_string()),
            ..ListingRequest::default()
        }
        .resolve();

        assert_eq!(resolved.page_number, 1);
        assert_eq!(resolved.filter.search.as_deref(), Some("beach"));
    }

    #[test]
    fn submitted_location_resets_page() {
        let resolved = ListingRequest {
            location_filter: Some("Lisbon".to_string()),
            page_number: Some("3".to_string()),
            ..ListingRequest::default()
        }
        .resolve();

        assert_eq!(resolved.page_number, 1);
        assert_eq!(resolved.filter.location.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn remembered_filters_keep_page() {
        let resolved = ListingRequest {
            current_filter: Some("park".to_string()),
            current_location: Some("Porto".to_string()),
            page_number: Some("2".to_string()),
            ..ListingRequest::default()
        }
        .resolve();

        assert_eq!(resolved.page_number, 2);
        assert_eq!(resolved.filter.search.as_deref(), Some("park"));
        assert_eq!(resolved.filter.location.as_deref(), Some("Porto"));
    }

    #[test]
    fn empty_submitted_filters_keep_remembered_filter_and_page() {
        let resolved = ListingRequest {
            search_string: Some(String::new()),
            location_filter: Some(String::new()),
            current_filter: Some("park".to_string()),
            page_number: Some("2".to_string()),
            ..ListingRequest::default()
        }
        .resolve();

        assert_eq!(resolved.page_number, 2);
        assert_eq!(resolved.filter.search.as_deref(), Some("park"));
        assert_eq!(resolved.filter.location, None);
    }

    #[test]
    fn page_numbers_below_one_are_clamped() {
        for page in ["0", "-3", "-9223372036854775808"] {
            let resolved = ListingRequest {
                page_number: Some(page.to_string()),
                ..ListingRequest::default()
            }
            .resolve();
            assert_eq!(resolved.page_number, 1);
        }
    }

    #[test]
    fn unreadable_page_numbers_are_page_one() {
        for raw in ["", "abc", "2.5", "1e3", "+", "--1"] {
            assert_eq!(parse_page_number(Some(raw)), 1, "{raw:?}");
        }
        assert_eq!(parse_page_number(None), 1);
    }

    #[test]
    fn oversized_page_numbers_saturate() {
        assert_eq!(parse_page_number(Some("99999999999999999999")), u32::MAX);
        assert_eq!(parse_page_number(Some("4294967296")), u32::MAX);
        assert_eq!(parse_page_number(Some(" +7 ")), 7);
    }

    #[test]
    fn window_for_page() {
        assert_eq!(PageWindow::for_page(1), PageWindow { offset: 0, limit: 6 });
        assert_eq!(PageWindow::for_page(3), PageWindow { offset: 12, limit: 6 });
    }

    #[test]
    fn pagination_metadata_for_thirteen_items() {
        let first: Paginated<u8> = Paginated::new(vec![0; 6], 1, PAGE_SIZE, 13);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_previous);
        assert!(first.has_next);

        let last: Paginated<u8> = Paginated::new(vec![0; 1], 3, PAGE_SIZE, 13);
        assert!(last.has_previous);
        assert!(!last.has_next);
    }

    #[test]
    fn empty_result_has_one_page() {
        let page: Paginated<u8> = Paginated::new(Vec::new(), 1, PAGE_SIZE, 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling(total in 0u64..10_000, page in 1u32..2_000) {
            let paginated: Paginated<()> = Paginated::new(Vec::new(), page, PAGE_SIZE, total);
            let expected = u32::try_from(total.div_ceil(6)).unwrap_or(u32::MAX).max(1);
            prop_assert_eq!(paginated.total_pages, expected);
            prop_assert_eq!(paginated.has_next, page < expected);
            prop_assert_eq!(paginated.has_previous, page > 1);
        }

        #[test]
        fn parse_is_total(raw in ".*") {
            let key = SortKey::parse(Some(&raw));
            prop_assert!(SortKey::ALL.contains(&key));
        }
    }
}
