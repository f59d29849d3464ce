//! Behaviour of the in-memory store that the web layer relies on.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use chrono::Utc;
use std::collections::BTreeSet;
use volunteer_core::registration;
use volunteer_core::role::Role;
use volunteer_core::store::{
    CauseRepository, EventCatalog, FeedbackRepository, OrganizationRepository, StoreError,
    UserDirectory, VolunteerStore,
};
use volunteer_core::types::{Feedback, FeedbackId, UserId};
use volunteer_core::validation::{EventDraft, UserDraft};
use volunteer_testing::fixtures::{self, EventBuilder, date};
use volunteer_testing::{InMemoryStore, test_clock};

fn draft_from(event: &volunteer_core::types::Event, max_participants: u32) -> EventDraft {
    EventDraft {
        title: event.title.clone(),
        description: event.description.clone(),
        event_date: event.event_date,
        location: event.location.clone(),
        max_participants,
        image_url: event.image_url.clone(),
        cause_id: event.cause_id,
    }
}

#[tokio::test]
async fn participants_carry_display_names_in_registration_order() {
    let store = InMemoryStore::new();
    let event = EventBuilder::new("Food drive").build();
    store.create_event(&event).await.unwrap();

    let named = fixtures::named_user("ana@example.org", "Ana", "Lopez");
    store.create_user(&named).await.unwrap();
    store.grant_role(named.id, Role::User).await.unwrap();
    let bo = fixtures::enroll(&store, "bo@example.org", &[Role::User])
        .await
        .unwrap();

    for actor in [
        volunteer_core::Actor::authenticated(named.id, [Role::User]),
        bo,
    ] {
        let member = actor.require_member().unwrap();
        registration::register(&store, &test_clock(), member, event.id, None)
            .await
            .unwrap();
    }

    let names: Vec<_> = store
        .list_participants(event.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.display_name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Ana Lopez".to_string()));
    assert!(names.contains(&"bo@example.org".to_string()));
}

#[tokio::test]
async fn lowering_capacity_below_registrations_is_a_conflict() {
    let store = InMemoryStore::new();
    let event = EventBuilder::new("Shelter").capacity(5).build();
    store.create_event(&event).await.unwrap();
    for i in 0..3 {
        let member = fixtures::enroll(&store, &format!("v{i}@example.org"), &[Role::User])
            .await
            .unwrap()
            .require_member()
            .unwrap();
        registration::register(&store, &test_clock(), member, event.id, None)
            .await
            .unwrap();
    }

    let result = store
        .update_event(event.id, &draft_from(&event, 2), Utc::now())
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));

    let updated = store
        .update_event(event.id, &draft_from(&event, 3), Utc::now())
        .await
        .unwrap();
    assert_eq!(updated.max_participants, 3);
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn deleting_event_removes_its_registrations() {
    let store = InMemoryStore::new();
    let event = EventBuilder::new("Library").build();
    store.create_event(&event).await.unwrap();
    let member = fixtures::enroll(&store, "ana@example.org", &[Role::User])
        .await
        .unwrap()
        .require_member()
        .unwrap();
    registration::register(&store, &test_clock(), member, event.id, None)
        .await
        .unwrap();

    assert!(store.delete_event(event.id).await.unwrap());
    assert!(!store.delete_event(event.id).await.unwrap());
    assert_eq!(store.registration_total(), 0);
}

#[tokio::test]
async fn deleting_organization_cascades_to_causes_and_detaches_events() {
    let store = InMemoryStore::new();
    let author = fixtures::enroll(&store, "ana@example.org", &[Role::User])
        .await
        .unwrap();
    let organization = fixtures::organization("Green Coast");
    store.create_organization(&organization).await.unwrap();
    let cause = fixtures::cause(organization.id, "Clean beaches");
    store.create_cause(&cause).await.unwrap();
    let event = EventBuilder::new("Dune walk").in_cause(cause.id).build();
    store.create_event(&event).await.unwrap();
    store
        .add_feedback(&Feedback {
            id: FeedbackId::new(),
            cause_id: cause.id,
            user_id: author.user_id().unwrap(),
            comment: "Great".to_string(),
            rating: 4,
            created_at: date(2024, 2, 1),
        })
        .await
        .unwrap();

    let details = store.find_cause(cause.id).await.unwrap().unwrap();
    assert_eq!(details.events.len(), 1);
    assert_eq!(details.feedback.len(), 1);
    assert_eq!(details.summary.organization.name, "Green Coast");

    assert!(store.delete_organization(organization.id).await.unwrap());
    assert!(store.find_cause(cause.id).await.unwrap().is_none());
    assert!(store.feedback_for_cause(cause.id).await.unwrap().is_empty());
    let event = store.find_event_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event.cause_id, None);
}

#[tokio::test]
async fn cause_requires_existing_organization() {
    let store = InMemoryStore::new();
    let orphan = fixtures::cause(volunteer_core::types::OrganizationId::new(), "Orphan");

    let result = store.create_cause(&orphan).await;

    assert!(matches!(result, Err(StoreError::NotFound { entity: "organization", .. })));
}

#[tokio::test]
async fn feedback_is_listed_newest_first() {
    let store = InMemoryStore::new();
    let author = fixtures::enroll(&store, "ana@example.org", &[Role::User])
        .await
        .unwrap()
        .user_id()
        .unwrap();
    let organization = fixtures::organization("Helpers");
    store.create_organization(&organization).await.unwrap();
    let cause = fixtures::cause(organization.id, "Warm meals");
    store.create_cause(&cause).await.unwrap();

    for (day, comment) in [(1, "first"), (3, "third"), (2, "second")] {
        store
            .add_feedback(&Feedback {
                id: FeedbackId::new(),
                cause_id: cause.id,
                user_id: author,
                comment: comment.to_string(),
                rating: 5,
                created_at: date(2024, 3, day),
            })
            .await
            .unwrap();
    }

    let comments: Vec<_> = store
        .feedback_for_cause(cause.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.comment)
        .collect();
    assert_eq!(comments, ["third", "second", "first"]);
}

#[tokio::test]
async fn emails_are_unique() {
    let store = InMemoryStore::new();
    store
        .create_user(&fixtures::user("ana@example.org"))
        .await
        .unwrap();
    let bo = fixtures::user("bo@example.org");
    store.create_user(&bo).await.unwrap();

    assert!(matches!(
        store.create_user(&fixtures::user("ana@example.org")).await,
        Err(StoreError::Conflict(_))
    ));

    let rename = UserDraft {
        email: "ana@example.org".to_string(),
        first_name: None,
        last_name: None,
    };
    assert!(matches!(
        store.update_user(bo.id, &rename).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn roles_backfill_and_replacement() {
    let store = InMemoryStore::new();
    let ana = fixtures::user("ana@example.org");
    let bo = fixtures::user("bo@example.org");
    store.create_user(&ana).await.unwrap();
    store.create_user(&bo).await.unwrap();
    store.grant_role(ana.id, Role::Admin).await.unwrap();

    assert_eq!(store.users_without_roles().await.unwrap(), vec![bo.id]);

    store
        .set_roles(bo.id, &BTreeSet::from([Role::User, Role::Admin]))
        .await
        .unwrap();
    assert!(store.users_without_roles().await.unwrap().is_empty());
    assert_eq!(store.roles_of(bo.id).await.unwrap().len(), 2);

    assert!(matches!(
        store.grant_role(UserId::new(), Role::User).await,
        Err(StoreError::NotFound { entity: "user", .. })
    ));
}

#[tokio::test]
async fn deleting_user_removes_their_registrations_and_roles() {
    let store = InMemoryStore::new();
    let event = EventBuilder::new("Garden").build();
    store.create_event(&event).await.unwrap();
    let actor = fixtures::enroll(&store, "ana@example.org", &[Role::User])
        .await
        .unwrap();
    let user_id = actor.user_id().unwrap();
    registration::register(
        &store,
        &test_clock(),
        actor.require_member().unwrap(),
        event.id,
        None,
    )
    .await
    .unwrap();

    assert!(store.delete_user(user_id).await.unwrap());
    assert_eq!(store.count_registrations(event.id).await.unwrap(), 0);
    assert!(store.roles_of(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn outage_fails_every_operation_until_restored() {
    let store = InMemoryStore::new();
    store.set_unavailable(true);

    assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
    assert!(store.list_users().await.is_err());

    store.set_unavailable(false);
    assert!(store.ping().await.is_ok());
}
