//! Event listing against the in-memory store.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use volunteer_core::listing::{ListingRequest, PAGE_SIZE, SortKey, list_events};
use volunteer_core::registration;
use volunteer_core::role::Role;
use volunteer_core::store::EventCatalog;
use volunteer_core::types::EventId;
use volunteer_testing::fixtures::{self, EventBuilder, date};
use volunteer_testing::{InMemoryStore, test_clock};

fn sorted(key: &str) -> ListingRequest {
    ListingRequest {
        sort_order: Some(key.to_string()),
        ..ListingRequest::default()
    }
}

fn page(number: i64) -> ListingRequest {
    ListingRequest {
        page_number: Some(number.to_string()),
        ..ListingRequest::default()
    }
}

async fn add(store: &InMemoryStore, builder: EventBuilder) -> EventId {
    let event = builder.build();
    store.create_event(&event).await.unwrap();
    event.id
}

async fn fill(store: &InMemoryStore, event: EventId, seats: usize) {
    for i in 0..seats {
        let member = fixtures::enroll(store, &format!("{event}-{i}@example.org"), &[Role::User])
            .await
            .unwrap()
            .require_member()
            .unwrap();
        registration::register(store, &test_clock(), member, event, None)
            .await
            .unwrap();
    }
}

async fn thirteen_events() -> InMemoryStore {
    let store = InMemoryStore::new();
    for day in 1..=13 {
        add(
            &store,
            EventBuilder::new(&format!("Event {day:02}")).on(date(2024, 5, day)),
        )
        .await;
    }
    store
}

#[tokio::test]
async fn date_sort_is_chronological_and_date_desc_reverses() {
    let store = InMemoryStore::new();
    let jan = add(&store, EventBuilder::new("January").on(date(2024, 1, 1))).await;
    let mar = add(&store, EventBuilder::new("March").on(date(2024, 3, 1))).await;
    let feb = add(&store, EventBuilder::new("February").on(date(2024, 2, 1))).await;

    let ascending = list_events(&store, sorted("date")).await.unwrap();
    let ids: Vec<_> = ascending.page.items.iter().map(|e| e.event.id).collect();
    assert_eq!(ids, vec![jan, feb, mar]);

    let descending = list_events(&store, sorted("date_desc")).await.unwrap();
    let ids: Vec<_> = descending.page.items.iter().map(|e| e.event.id).collect();
    assert_eq!(ids, vec![mar, feb, jan]);
    assert_eq!(descending.current_sort, SortKey::DateDesc);
}

#[tokio::test]
async fn default_and_unknown_sort_use_date_ascending() {
    let store = InMemoryStore::new();
    let late = add(&store, EventBuilder::new("Late").on(date(2024, 6, 1))).await;
    let early = add(&store, EventBuilder::new("Early").on(date(2024, 1, 1))).await;

    for request in [ListingRequest::default(), sorted("nonsense")] {
        let listing = list_events(&store, request).await.unwrap();
        let ids: Vec<_> = listing.page.items.iter().map(|e| e.event.id).collect();
        assert_eq!(ids, vec![early, late]);
        assert_eq!(listing.current_sort, SortKey::Date);
    }
}

#[tokio::test]
async fn search_resets_page_and_matches_title_or_description() {
    let store = thirteen_events().await;
    let in_title = add(&store, EventBuilder::new("beach cleanup").on(date(2024, 7, 1))).await;
    let in_description = add(
        &store,
        EventBuilder::new("Shore day")
            .description("Meet at the beach parking lot")
            .on(date(2024, 7, 2)),
    )
    .await;
    // Case-sensitive: not a match.
    add(&store, EventBuilder::new("Beach volleyball").on(date(2024, 7, 3))).await;

    let listing = list_events(
        &store,
        ListingRequest {
            search_string: Some("beach".to_string()),
            page_number: Some("3".to_string()),
            ..ListingRequest::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(listing.page.page_number, 1);
    assert_eq!(listing.page.total_count, 2);
    let ids: Vec<_> = listing.page.items.iter().map(|e| e.event.id).collect();
    assert_eq!(ids, vec![in_title, in_description]);
    assert_eq!(listing.current_filter.as_deref(), Some("beach"));
}

#[tokio::test]
async fn location_filter_applies_before_pagination() {
    let store = InMemoryStore::new();
    for day in 1..=8 {
        let location = if day % 2 == 0 { "Lisbon Harbor" } else { "Porto" };
        add(
            &store,
            EventBuilder::new(&format!("Day {day}"))
                .on(date(2024, 4, day))
                .at(location),
        )
        .await;
    }

    let listing = list_events(
        &store,
        ListingRequest {
            location_filter: Some("Lisbon".to_string()),
            ..ListingRequest::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(listing.page.total_count, 4);
    assert_eq!(listing.page.total_pages, 1);
    assert!(listing.page.items.iter().all(|e| e.event.location.contains("Lisbon")));
    assert_eq!(listing.location_filter.as_deref(), Some("Lisbon"));
}

#[tokio::test]
async fn remembered_filter_continues_pagination() {
    let store = InMemoryStore::new();
    for day in 1..=9 {
        add(
            &store,
            EventBuilder::new(&format!("Park walk {day}")).on(date(2024, 8, day)),
        )
        .await;
    }
    add(&store, EventBuilder::new("Museum").on(date(2024, 8, 10))).await;

    let second = list_events(
        &store,
        ListingRequest {
            current_filter: Some("Park".to_string()),
            page_number: Some("2".to_string()),
            ..ListingRequest::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(second.page.page_number, 2);
    assert_eq!(second.page.total_count, 9);
    assert_eq!(second.page.items.len(), 3);
    assert!(second.page.has_previous);
    assert!(!second.page.has_next);
}

#[tokio::test]
async fn thirteen_events_span_three_pages() {
    let store = thirteen_events().await;

    let first = list_events(&store, page(1)).await.unwrap();
    assert_eq!(first.page.items.len(), 6);
    assert_eq!(first.page.total_pages, 3);
    assert!(first.page.has_next);
    assert!(!first.page.has_previous);

    let second = list_events(&store, page(2)).await.unwrap();
    assert_eq!(second.page.items.len(), 6);
    assert!(second.page.has_next);
    assert!(second.page.has_previous);

    let third = list_events(&store, page(3)).await.unwrap();
    assert_eq!(third.page.items.len(), 1);
    assert!(!third.page.has_next);
    assert!(third.page.has_previous);
    assert_eq!(third.page.items[0].event.title, "Event 13");
}

#[tokio::test]
async fn pages_never_exceed_page_size_and_past_end_is_empty() {
    let store = thirteen_events().await;

    let beyond = list_events(&store, page(9)).await.unwrap();
    assert!(beyond.page.items.is_empty());
    assert_eq!(beyond.page.total_pages, 3);
    assert!(!beyond.page.has_next);

    let clamped = list_events(&store, page(-4)).await.unwrap();
    assert_eq!(clamped.page.page_number, 1);
    assert_eq!(clamped.page.items.len(), usize::try_from(PAGE_SIZE).unwrap());
}

#[tokio::test]
async fn empty_catalog_has_one_empty_page() {
    let store = InMemoryStore::new();

    let listing = list_events(&store, ListingRequest::default()).await.unwrap();

    assert!(listing.page.items.is_empty());
    assert_eq!(listing.page.total_pages, 1);
    assert!(!listing.page.has_next);
    assert!(!listing.page.has_previous);
}

#[tokio::test]
async fn participants_desc_orders_by_live_count() {
    let store = InMemoryStore::new();
    let none = add(&store, EventBuilder::new("Zero").on(date(2024, 1, 1))).await;
    let five = add(&store, EventBuilder::new("Five").on(date(2024, 1, 2))).await;
    let two = add(&store, EventBuilder::new("Two").on(date(2024, 1, 3))).await;
    fill(&store, five, 5).await;
    fill(&store, two, 2).await;

    let listing = list_events(&store, sorted("participants_desc")).await.unwrap();
    let counts: Vec<_> = listing
        .page
        .items
        .iter()
        .map(|e| (e.event.id, e.registration_count))
        .collect();
    assert_eq!(counts, vec![(five, 5), (two, 2), (none, 0)]);

    let ascending = list_events(&store, sorted("participants")).await.unwrap();
    let counts: Vec<_> = ascending
        .page
        .items
        .iter()
        .map(|e| e.registration_count)
        .collect();
    assert_eq!(counts, vec![0, 2, 5]);
}

#[tokio::test]
async fn title_and_location_sorts() {
    let store = InMemoryStore::new();
    add(&store, EventBuilder::new("Bravo").at("Cairo")).await;
    add(&store, EventBuilder::new("Alpha").at("Zagreb")).await;
    add(&store, EventBuilder::new("Charlie").at("Athens")).await;

    let titles = |listing: &volunteer_core::EventListing| -> Vec<String> {
        listing
            .page
            .items
            .iter()
            .map(|e| e.event.title.clone())
            .collect()
    };

    let by_title = list_events(&store, sorted("title")).await.unwrap();
    assert_eq!(titles(&by_title), ["Alpha", "Bravo", "Charlie"]);

    let by_title_desc = list_events(&store, sorted("title_desc")).await.unwrap();
    assert_eq!(titles(&by_title_desc), ["Charlie", "Bravo", "Alpha"]);

    let by_location = list_events(&store, sorted("Location")).await.unwrap();
    assert_eq!(titles(&by_location), ["Charlie", "Bravo", "Alpha"]);

    let by_location_desc = list_events(&store, sorted("location_desc")).await.unwrap();
    assert_eq!(titles(&by_location_desc), ["Alpha", "Bravo", "Charlie"]);
}
