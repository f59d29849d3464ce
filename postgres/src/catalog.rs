//! Events and registrations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use volunteer_core::listing::{EventFilter, PageWindow, SortField, SortKey};
use volunteer_core::store::{EventCatalog, EventSlice, StoreError, StoreResult, entity};
use volunteer_core::types::{CauseId, Event, EventId, Participant, Registration, UserId};
use volunteer_core::validation::EventDraft;

use crate::rows::{
    EVENT_COLUMNS, EventRow, ListedEventRow, ParticipantRow, REGISTRATION_COLUMNS,
    RegistrationRow,
};
use crate::{PostgresStore, database, is_foreign_key_violation, is_unique_violation, to_count};

fn reject(reason: &'static str) {
    metrics::counter!("volunteer_store_registration_rejections_total", "reason" => reason)
        .increment(1);
}

/// Append the text filters. Matching uses `strpos`, a case-sensitive
/// substring test that needs no escaping of `%` or `_`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    builder.push(" WHERE TRUE");
    if let Some(search) = &filter.search {
        builder
            .push(" AND (strpos(e.title, ")
            .push_bind(search.clone())
            .push(") > 0 OR strpos(e.description, ")
            .push_bind(search.clone())
            .push(") > 0)");
    }
    if let Some(location) = &filter.location {
        builder
            .push(" AND strpos(e.location, ")
            .push_bind(location.clone())
            .push(") > 0");
    }
}

const fn order_column(field: SortField) -> &'static str {
    match field {
        SortField::Title => "e.title",
        SortField::Date => "e.event_date",
        SortField::Location => "e.location",
        SortField::Participants => "registration_count",
    }
}

fn missing_cause(cause_id: Option<CauseId>) -> StoreError {
    StoreError::not_found(
        entity::CAUSE,
        cause_id.map(|c| c.to_string()).unwrap_or_default(),
    )
}

fn participant_limit(draft: &EventDraft) -> i32 {
    i32::try_from(draft.max_participants).unwrap_or(i32::MAX)
}

#[async_trait]
impl EventCatalog for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn find_event_by_id(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(database("load event"))?;

        Ok(row.map(Event::from))
    }

    async fn count_registrations(&self, event_id: EventId) -> StoreResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(*event_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(database("count registrations"))?;

        Ok(to_count(count))
    }

    async fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> StoreResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations r \
             WHERE r.event_id = $1 AND r.user_id = $2"
        ))
        .bind(*event_id.as_uuid())
        .bind(*user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(database("load registration"))?;

        Ok(row.map(Registration::from))
    }

    #[tracing::instrument(skip(self, registration), fields(event_id = %registration.event_id, user_id = %registration.user_id))]
    async fn insert_registration(&self, registration: &Registration) -> StoreResult<()> {
        let event_id = registration.event_id;
        let user_id = registration.user_id;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(database("begin transaction"))?;

        // Serialises registrations per event.
        let max: Option<i32> =
            sqlx::query_scalar("SELECT max_participants FROM events WHERE id = $1 FOR UPDATE")
                .bind(*event_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(database("lock event"))?;
        let Some(max) = max else {
            return Err(StoreError::not_found(entity::EVENT, event_id));
        };

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(*event_id.as_uuid())
        .bind(*user_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(database("check registration"))?;
        if exists {
            reject("duplicate");
            return Err(StoreError::DuplicateRegistration { event_id, user_id });
        }

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(*event_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(database("count registrations"))?;
        if taken >= i64::from(max) {
            reject("capacity");
            tracing::debug!(taken, max, "Capacity reached");
            return Err(StoreError::CapacityReached { event_id });
        }

        sqlx::query(
            "INSERT INTO registrations (id, event_id, user_id, registered_at, notes) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*registration.id.as_uuid())
        .bind(*event_id.as_uuid())
        .bind(*user_id.as_uuid())
        .bind(registration.registered_at)
        .bind(registration.notes.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                reject("duplicate");
                StoreError::DuplicateRegistration { event_id, user_id }
            } else if is_foreign_key_violation(&e) {
                StoreError::not_found(entity::USER, user_id)
            } else {
                database("insert registration")(e)
            }
        })?;

        tx.commit().await.map_err(database("commit registration"))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, registration), fields(registration_id = %registration.id))]
    async fn delete_registration(&self, registration: &Registration) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(*registration.id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(database("delete registration"))?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn query_events(
        &self,
        filter: &EventFilter,
        sort: SortKey,
        window: PageWindow,
    ) -> StoreResult<EventSlice> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events e");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(database("count events"))?;

        let mut page = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS}, COUNT(r.id) AS registration_count \
             FROM events e LEFT JOIN registrations r ON r.event_id = e.id"
        ));
        push_filter(&mut page, filter);
        page.push(" GROUP BY e.id ORDER BY ")
            .push(order_column(sort.field()))
            .push(if sort.is_descending() { " DESC" } else { " ASC" })
            .push(", e.id ASC LIMIT ")
            .push_bind(i64::from(window.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));

        let rows = page
            .build_query_as::<ListedEventRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(database("list events"))?;

        Ok(EventSlice {
            items: rows.into_iter().map(Into::into).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    #[tracing::instrument(skip(self, event), fields(event_id = %event.id))]
    async fn create_event(&self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO events (id, cause_id, title, description, event_date, location, \
             max_participants, image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(*event.id.as_uuid())
        .bind(event.cause_id.map(|c| *c.as_uuid()))
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(&event.location)
        .bind(i32::try_from(event.max_participants).unwrap_or(i32::MAX))
        .bind(event.image_url.as_deref())
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_cause(event.cause_id)
            } else {
                database("insert event")(e)
            }
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn update_event(
        &self,
        id: EventId,
        draft: &EventDraft,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Event> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(database("begin transaction"))?;

        let locked: Option<i32> =
            sqlx::query_scalar("SELECT max_participants FROM events WHERE id = $1 FOR UPDATE")
                .bind(*id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(database("lock event"))?;
        if locked.is_none() {
            return Err(StoreError::not_found(entity::EVENT, id));
        }

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(*id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(database("count registrations"))?;
        if taken > i64::from(draft.max_participants) {
            return Err(StoreError::Conflict(format!(
                "event {id} already has {taken} registrations"
            )));
        }

        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events AS e SET cause_id = $2, title = $3, description = $4, \
             event_date = $5, location = $6, max_participants = $7, image_url = $8, \
             updated_at = $9 WHERE e.id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(draft.cause_id.map(|c| *c.as_uuid()))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.event_date)
        .bind(&draft.location)
        .bind(participant_limit(draft))
        .bind(draft.image_url.as_deref())
        .bind(updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_cause(draft.cause_id)
            } else {
                database("update event")(e)
            }
        })?;

        tx.commit().await.map_err(database("commit event"))?;
        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(database("delete event"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS}, u.email, u.first_name, u.last_name \
             FROM registrations r JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = $1 ORDER BY r.registered_at, r.id"
        ))
        .bind(*event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(database("list participants"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
