//! Users and roles.

use async_trait::async_trait;
use std::collections::BTreeSet;
use uuid::Uuid;
use volunteer_core::role::Role;
use volunteer_core::store::{StoreError, StoreResult, UserDirectory, entity};
use volunteer_core::types::{User, UserId};
use volunteer_core::validation::UserDraft;

use crate::rows::{USER_COLUMNS, UserRow};
use crate::{PostgresStore, database, is_foreign_key_violation, is_unique_violation};

fn email_taken(email: &str) -> StoreError {
    StoreError::Conflict(format!("email {email} is already in use"))
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u ORDER BY u.email"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database("list users"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(database("load user"))?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(database("load user by email"))?;

        Ok(row.map(User::from))
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, first_name, last_name, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(user.first_name.as_deref())
        .bind(user.last_name.as_deref())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_taken(&user.email)
            } else {
                database("insert user")(e)
            }
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn update_user(&self, id: UserId, draft: &UserDraft) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users AS u SET email = $2, first_name = $3, last_name = $4 \
             WHERE u.id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(&draft.email)
        .bind(draft.first_name.as_deref())
        .bind(draft.last_name.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_taken(&draft.email)
            } else {
                database("update user")(e)
            }
        })?;

        row.map(User::from)
            .ok_or_else(|| StoreError::not_found(entity::USER, id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(database("delete user"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn roles_of(&self, id: UserId) -> StoreResult<BTreeSet<Role>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(*id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(database("load roles"))?;

        names
            .iter()
            .map(|name| {
                name.parse::<Role>()
                    .map_err(|e| StoreError::Database(e.to_string()))
            })
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn grant_role(&self, id: UserId, role: Role) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(*id.as_uuid())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::not_found(entity::USER, id)
            } else {
                database("grant role")(e)
            }
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_roles(&self, id: UserId, roles: &BTreeSet<Role>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(database("begin transaction"))?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(*id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(database("check user"))?;
        if !exists {
            return Err(StoreError::not_found(entity::USER, id));
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(database("clear roles"))?;

        for role in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(*id.as_uuid())
                .bind(role.as_str())
                .execute(&mut *tx)
                .await
                .map_err(database("insert role"))?;
        }

        tx.commit().await.map_err(database("commit roles"))?;
        Ok(())
    }

    async fn users_without_roles(&self) -> StoreResult<Vec<UserId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT u.id FROM users u \
             WHERE NOT EXISTS (SELECT 1 FROM user_roles ur WHERE ur.user_id = u.id) \
             ORDER BY u.email",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database("list users without roles"))?;

        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }
}
