//! Roles, actors and capability checks.
//!
//! Authentication happens outside this crate. Callers arrive as an
//! [`Actor`] whose identity and roles are already resolved; workflows that
//! need a privilege take a proof value ([`Member`] or [`Admin`]) that can
//! only be obtained from [`Actor::require_member`] or
//! [`Actor::require_admin`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::store::{StoreError, UserDirectory};
use crate::types::UserId;

/// Platform role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Unauthenticated visitor
    Guest,
    /// Registered volunteer
    User,
    /// Platform administrator
    Admin,
}

impl Role {
    /// Every role, in privilege order.
    pub const ALL: [Self; 3] = [Self::Guest, Self::User, Self::Admin];

    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::User => "User",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Access was denied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The caller is not authenticated.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is authenticated but lacks the required role.
    #[error("requires role {required}")]
    Forbidden {
        /// Lowest role that would have been accepted
        required: Role,
    },
}

/// The caller of an operation, with identity and roles already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actor {
    /// Unauthenticated caller.
    Guest,
    /// Authenticated caller.
    Authenticated {
        /// User identity
        user_id: UserId,
        /// Roles held by the user
        roles: BTreeSet<Role>,
    },
}

impl Actor {
    /// An authenticated actor holding the given roles.
    #[must_use]
    pub fn authenticated(user_id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self::Authenticated {
            user_id,
            roles: roles.into_iter().collect(),
        }
    }

    /// User id of an authenticated actor.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    /// Whether the actor holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        match self {
            Self::Guest => role == Role::Guest,
            Self::Authenticated { roles, .. } => roles.contains(&role),
        }
    }

    /// Require the `User` or `Admin` role.
    ///
    /// # Errors
    ///
    /// [`AccessError::Unauthenticated`] for guests,
    /// [`AccessError::Forbidden`] when neither role is held.
    pub fn require_member(&self) -> Result<Member, AccessError> {
        let user_id = self.user_id().ok_or(AccessError::Unauthenticated)?;
        if self.has_role(Role::User) || self.has_role(Role::Admin) {
            Ok(Member { user_id })
        } else {
            Err(AccessError::Forbidden { required: Role::User })
        }
    }

    /// Require the `Admin` role.
    ///
    /// # Errors
    ///
    /// [`AccessError::Unauthenticated`] for guests,
    /// [`AccessError::Forbidden`] when the role is not held.
    pub fn require_admin(&self) -> Result<Admin, AccessError> {
        let user_id = self.user_id().ok_or(AccessError::Unauthenticated)?;
        if self.has_role(Role::Admin) {
            Ok(Admin { user_id })
        } else {
            Err(AccessError::Forbidden { required: Role::Admin })
        }
    }
}

/// Proof that the caller holds `User` or `Admin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    user_id: UserId,
}

impl Member {
    /// The member's user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Proof that the caller holds `Admin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admin {
    user_id: UserId,
}

impl Admin {
    /// The administrator's user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Grant `User` to a user that holds no role yet.
///
/// Runs after authentication; calling it repeatedly is harmless. Returns the
/// user's roles after the hook ran.
///
/// # Errors
///
/// Propagates [`StoreError`] from the directory.
#[tracing::instrument(skip(directory))]
pub async fn ensure_default_role<D>(
    directory: &D,
    user_id: UserId,
) -> Result<BTreeSet<Role>, StoreError>
where
    D: UserDirectory + ?Sized,
{
    let roles = directory.roles_of(user_id).await?;
    if !roles.is_empty() {
        return Ok(roles);
    }

    tracing::info!(%user_id, "Assigning default role");
    directory.grant_role(user_id, Role::User).await?;
    Ok(BTreeSet::from([Role::User]))
}
