//! Startup seeding.
//!
//! Runs once after migrations: makes sure the configured administrator
//! exists and holds `Admin`, then gives `User` to every user without a role.
//! Both steps are idempotent.

use volunteer_core::Clock;
use volunteer_core::role::Role;
use volunteer_core::store::{StoreResult, UserDirectory};
use volunteer_core::types::{User, UserId};

/// What seeding did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// The administrator, when an admin email was configured
    pub admin: Option<UserId>,
    /// Whether the administrator had to be created
    pub admin_created: bool,
    /// Number of users that were given the default role
    pub backfilled: usize,
}

/// Seed the administrator and backfill default roles.
///
/// # Errors
///
/// Propagates [`volunteer_core::StoreError`] from the directory.
#[tracing::instrument(skip(directory, clock))]
pub async fn seed<D>(
    directory: &D,
    clock: &dyn Clock,
    admin_email: Option<&str>,
) -> StoreResult<SeedReport>
where
    D: UserDirectory + ?Sized,
{
    let mut report = SeedReport::default();

    if let Some(email) = admin_email {
        let admin = if let Some(existing) = directory.find_user_by_email(email).await? {
            existing
        } else {
            let user = User {
                id: UserId::new(),
                email: email.to_string(),
                first_name: None,
                last_name: None,
                created_at: clock.now(),
            };
            directory.create_user(&user).await?;
            report.admin_created = true;
            user
        };
        directory.grant_role(admin.id, Role::Admin).await?;
        tracing::info!(user_id = %admin.id, created = report.admin_created, "Administrator seeded");
        report.admin = Some(admin.id);
    }

    for user_id in directory.users_without_roles().await? {
        directory.grant_role(user_id, Role::User).await?;
        report.backfilled += 1;
    }
    if report.backfilled > 0 {
        tracing::info!(count = report.backfilled, "Default role backfilled");
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use volunteer_testing::{InMemoryStore, fixtures, test_clock};

    #[tokio::test]
    async fn creates_missing_admin_and_backfills() {
        let store = InMemoryStore::new();
        let ana = fixtures::user("ana@example.org");
        store.create_user(&ana).await.unwrap();

        let report = seed(&store, &test_clock(), Some("admin@example.org"))
            .await
            .unwrap();

        assert!(report.admin_created);
        assert_eq!(report.backfilled, 1);
        let admin = store
            .find_user_by_email("admin@example.org")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.admin, Some(admin.id));
        assert_eq!(
            store.roles_of(admin.id).await.unwrap(),
            BTreeSet::from([Role::Admin])
        );
        assert_eq!(
            store.roles_of(ana.id).await.unwrap(),
            BTreeSet::from([Role::User])
        );
    }

    #[tokio::test]
    async fn existing_admin_is_promoted_and_rerun_is_a_no_op() {
        let store = InMemoryStore::new();
        let boss = fixtures::user("boss@example.org");
        store.create_user(&boss).await.unwrap();
        store.grant_role(boss.id, Role::User).await.unwrap();

        let first = seed(&store, &test_clock(), Some("boss@example.org"))
            .await
            .unwrap();
        let second = seed(&store, &test_clock(), Some("boss@example.org"))
            .await
            .unwrap();

        assert!(!first.admin_created);
        assert_eq!(first.admin, Some(boss.id));
        assert_eq!(second.backfilled, 0);
        assert_eq!(
            store.roles_of(boss.id).await.unwrap(),
            BTreeSet::from([Role::User, Role::Admin])
        );
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn without_admin_email_only_backfills() {
        let store = InMemoryStore::new();
        store
            .create_user(&fixtures::user("ana@example.org"))
            .await
            .unwrap();

        let report = seed(&store, &test_clock(), None).await.unwrap();

        assert_eq!(report.admin, None);
        assert_eq!(report.backfilled, 1);
    }
}
