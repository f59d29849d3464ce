//! Organizations, causes and feedback.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;
use volunteer_core::store::{
    CauseRepository, FeedbackRepository, OrganizationRepository, StoreError, StoreResult, entity,
};
use volunteer_core::types::{
    Cause, CauseDetails, CauseId, CauseSummary, Event, Feedback, Organization,
    OrganizationDetails, OrganizationId,
};
use volunteer_core::validation::{CauseDraft, OrganizationDraft};

use crate::rows::{
    CAUSE_COLUMNS, CauseRow, EVENT_COLUMNS, EventRow, FEEDBACK_COLUMNS, FeedbackRow,
    ORGANIZATION_COLUMNS, OrganizationRow,
};
use crate::{PostgresStore, database, is_foreign_key_violation};

impl PostgresStore {
    async fn organization_row(&self, id: OrganizationId) -> StoreResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o WHERE o.id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(database("load organization"))?;

        Ok(row.map(Organization::from))
    }
}

#[async_trait]
impl OrganizationRepository for PostgresStore {
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o ORDER BY o.name, o.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database("list organizations"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> StoreResult<Option<OrganizationDetails>> {
        let Some(organization) = self.organization_row(id).await? else {
            return Ok(None);
        };

        let causes = sqlx::query_as::<_, CauseRow>(&format!(
            "SELECT {CAUSE_COLUMNS} FROM causes c WHERE c.organization_id = $1 \
             ORDER BY c.start_date, c.id"
        ))
        .bind(*id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(database("list causes of organization"))?;

        Ok(Some(OrganizationDetails {
            organization,
            causes: causes.into_iter().map(Into::into).collect(),
        }))
    }

    #[tracing::instrument(skip(self, organization), fields(organization_id = %organization.id))]
    async fn create_organization(&self, organization: &Organization) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, name, address, email, phone, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*organization.id.as_uuid())
        .bind(&organization.name)
        .bind(&organization.address)
        .bind(&organization.email)
        .bind(&organization.phone)
        .bind(organization.created_at)
        .execute(&self.pool)
        .await
        .map_err(database("insert organization"))?;

        Ok(())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn update_organization(
        &self,
        id: OrganizationId,
        draft: &OrganizationDraft,
    ) -> StoreResult<Organization> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "UPDATE organizations AS o SET name = $2, address = $3, email = $4, phone = $5 \
             WHERE o.id = $1 RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(&draft.name)
        .bind(&draft.address)
        .bind(&draft.email)
        .bind(&draft.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(database("update organization"))?;

        row.map(Organization::from)
            .ok_or_else(|| StoreError::not_found(entity::ORGANIZATION, id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_organization(&self, id: OrganizationId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(database("delete organization"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CauseRepository for PostgresStore {
    async fn list_causes(&self) -> StoreResult<Vec<CauseSummary>> {
        let causes: Vec<Cause> = sqlx::query_as::<_, CauseRow>(&format!(
            "SELECT {CAUSE_COLUMNS} FROM causes c ORDER BY c.name, c.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database("list causes"))?
        .into_iter()
        .map(Into::into)
        .collect();

        let organization_ids: Vec<Uuid> = causes
            .iter()
            .map(|c| *c.organization_id.as_uuid())
            .collect();

        let organizations: HashMap<OrganizationId, Organization> =
            sqlx::query_as::<_, OrganizationRow>(&format!(
                "SELECT {ORGANIZATION_COLUMNS} FROM organizations o WHERE o.id = ANY($1)"
            ))
            .bind(organization_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(database("load organizations of causes"))?
            .into_iter()
            .map(|row| {
                let organization = Organization::from(row);
                (organization.id, organization)
            })
            .collect();

        Ok(causes
            .into_iter()
            .filter_map(|cause| {
                let organization = organizations.get(&cause.organization_id)?.clone();
                Some(CauseSummary {
                    cause,
                    organization,
                })
            })
            .collect())
    }

    async fn find_cause(&self, id: CauseId) -> StoreResult<Option<CauseDetails>> {
        let row = sqlx::query_as::<_, CauseRow>(&format!(
            "SELECT {CAUSE_COLUMNS} FROM causes c WHERE c.id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(database("load cause"))?;
        let Some(cause) = row.map(Cause::from) else {
            return Ok(None);
        };

        let organization = self
            .organization_row(cause.organization_id)
            .await?
            .ok_or_else(|| StoreError::not_found(entity::ORGANIZATION, cause.organization_id))?;

        let events = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.cause_id = $1 \
             ORDER BY e.event_date, e.id"
        ))
        .bind(*id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(database("list events of cause"))?;

        let feedback = self.feedback_for_cause(id).await?;

        Ok(Some(CauseDetails {
            summary: CauseSummary {
                cause,
                organization,
            },
            events: events.into_iter().map(Event::from).collect(),
            feedback,
        }))
    }

    #[tracing::instrument(skip(self, cause), fields(cause_id = %cause.id))]
    async fn create_cause(&self, cause: &Cause) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO causes (id, organization_id, name, description, start_date, end_date, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*cause.id.as_uuid())
        .bind(*cause.organization_id.as_uuid())
        .bind(&cause.name)
        .bind(&cause.description)
        .bind(cause.start_date)
        .bind(cause.end_date)
        .bind(cause.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found(entity::ORGANIZATION, cause.organization_id)
            } else {
                database("insert cause")(e)
            }
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn update_cause(&self, id: CauseId, draft: &CauseDraft) -> StoreResult<Cause> {
        let row = sqlx::query_as::<_, CauseRow>(&format!(
            "UPDATE causes AS c SET organization_id = $2, name = $3, description = $4, \
             start_date = $5, end_date = $6 WHERE c.id = $1 RETURNING {CAUSE_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(*draft.organization_id.as_uuid())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found(entity::ORGANIZATION, draft.organization_id)
            } else {
                database("update cause")(e)
            }
        })?;

        row.map(Cause::from)
            .ok_or_else(|| StoreError::not_found(entity::CAUSE, id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_cause(&self, id: CauseId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM causes WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(database("delete cause"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FeedbackRepository for PostgresStore {
    #[tracing::instrument(skip(self, feedback), fields(cause_id = %feedback.cause_id))]
    async fn add_feedback(&self, feedback: &Feedback) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO feedback (id, cause_id, user_id, comment, rating, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*feedback.id.as_uuid())
        .bind(*feedback.cause_id.as_uuid())
        .bind(*feedback.user_id.as_uuid())
        .bind(&feedback.comment)
        .bind(i16::from(feedback.rating))
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found(entity::CAUSE, feedback.cause_id)
            } else {
                database("insert feedback")(e)
            }
        })?;

        Ok(())
    }

    async fn feedback_for_cause(&self, cause_id: CauseId) -> StoreResult<Vec<Feedback>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback f WHERE f.cause_id = $1 \
             ORDER BY f.created_at DESC, f.id"
        ))
        .bind(*cause_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(database("list feedback"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
