//! Roles, their permission sets, and the user registry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::avl::AvlMap;
use crate::error::{require_name, GateError, GateResult};

/// The permissions granted by one role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    perms: AvlMap<String, ()>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a permission; returns `false` if it was already present.
    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.perms.insert(permission.into(), ()).is_none()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.perms.contains_key(permission)
    }

    pub fn len(&self) -> usize {
        self.perms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }

    /// Permissions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.perms.keys().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    pub fn validate(&self) -> GateResult<()> {
        self.perms.validate()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

/// A user's role and the permissions that role currently grants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserGrant {
    pub user: String,
    pub role: String,
    /// Sorted.
    pub permissions: Vec<String>,
}

impl fmt::Display for UserGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: role {}, permissions [{}]",
            self.user,
            self.role,
            self.permissions.join(", ")
        )
    }
}

/// Users keyed by identity, each holding a role name.
///
/// Permission sets belong to roles, not users: every user with a given role
/// resolves to the same [`PermissionSet`], so granting a role more
/// permissions is seen by all its holders. Registering a role that already
/// exists merges the new permissions into the existing set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RolesRecord", into = "RolesRecord")]
pub struct PermissionRegistry {
    roles: BTreeMap<String, PermissionSet>,
    users: AvlMap<String, String>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Register `role`, merging `permissions` into it if it already exists.
    pub fn add_role<I, S>(&mut self, role: &str, permissions: I) -> GateResult<&PermissionSet>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        require_name("role", role)?;
        let set = self.roles.entry(role.to_string()).or_default();
        for p in permissions {
            let p: String = p.into();
            let p = p.trim();
            if !p.is_empty() {
                set.insert(p);
            }
        }
        Ok(set)
    }

    pub fn role_permissions(&self, role: &str) -> Option<&PermissionSet> {
        self.roles.get(role)
    }

    /// Role names in ascending order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Give `user` the role `role`, registering the role with `permissions`.
    ///
    /// Re-inserting an existing user replaces their role. Returns the
    /// previous role, if any.
    pub fn insert<I, S>(&mut self, user: &str, role: &str, permissions: I) -> GateResult<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        require_name("user", user)?;
        self.add_role(role, permissions)?;
        let previous = self.users.insert(user.to_string(), role.to_string());
        tracing::debug!(user, role, replaced = previous.is_some(), "granted role");
        Ok(previous)
    }

    /// Move an existing user to `new_role`, registering it with `permissions`.
    pub fn update<I, S>(&mut self, user: &str, new_role: &str, permissions: I) -> GateResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.users.contains_key(user) {
            return Err(GateError::UserNotFound(user.to_string()));
        }
        self.add_role(new_role, permissions)?;
        let previous = self
            .users
            .get_mut(user)
            .map(|role| std::mem::replace(role, new_role.to_string()))
            .ok_or_else(|| GateError::UserNotFound(user.to_string()))?;
        Ok(previous)
    }

    /// Remove `user`, returning the role they held. Roles are kept.
    pub fn remove(&mut self, user: &str) -> GateResult<String> {
        self.users
            .remove(user)
            .ok_or_else(|| GateError::UserNotFound(user.to_string()))
    }

    /// Returns `true` if `user` exists and their role grants `action`.
    pub fn check_permission(&self, user: &str, action: &str) -> bool {
        self.users
            .get(user)
            .and_then(|role| self.roles.get(role))
            .is_some_and(|set| set.contains(action))
    }

    pub fn show(&self, user: &str) -> GateResult<UserGrant> {
        let role = self
            .users
            .get(user)
            .ok_or_else(|| GateError::UserNotFound(user.to_string()))?;
        Ok(self.grant(user, role))
    }

    /// All users in ascending order.
    pub fn list_users(&self) -> Vec<UserGrant> {
        self.users
            .iter()
            .map(|(user, role)| self.grant(user, role))
            .collect()
    }

    fn grant(&self, user: &str, role: &str) -> UserGrant {
        UserGrant {
            user: user.to_string(),
            role: role.to_string(),
            permissions: self
                .roles
                .get(role)
                .map(PermissionSet::to_vec)
                .unwrap_or_default(),
        }
    }

    /// Check both balanced trees and that every user's role is registered.
    pub fn validate(&self) -> GateResult<()> {
        self.users.validate()?;
        for set in self.roles.values() {
            set.validate()?;
        }
        if let Some((user, role)) = self.users.iter().find(|(_, r)| !self.roles.contains_key(*r)) {
            return Err(GateError::InvariantViolation(format!(
                "user {user} holds unregistered role {role}"
            )));
        }
        Ok(())
    }
}

/// Stored form of a [`PermissionRegistry`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesRecord {
    pub roles: BTreeMap<String, Vec<String>>,
    pub users: Vec<UserRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: String,
    pub role: String,
}

impl From<PermissionRegistry> for RolesRecord {
    fn from(registry: PermissionRegistry) -> Self {
        Self {
            roles: registry
                .roles
                .iter()
                .map(|(name, set)| (name.clone(), set.to_vec()))
                .collect(),
            users: registry
                .users
                .iter()
                .map(|(user, role)| UserRecord {
                    user: user.clone(),
                    role: role.clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<RolesRecord> for PermissionRegistry {
    type Error = GateError;

    fn try_from(record: RolesRecord) -> GateResult<Self> {
        let mut registry = Self::new();
        for (role, perms) in record.roles {
            registry.add_role(&role, perms)?;
        }
        for UserRecord { user, role } in record.users {
            if !registry.roles.contains_key(&role) {
                return Err(GateError::InvalidRecord(format!(
                    "user {user} references unknown role {role}"
                )));
            }
            require_name("user", &user)?;
            if registry.users.insert(user.clone(), role).is_some() {
                return Err(GateError::InvalidRecord(format!("user {user} listed twice")));
            }
        }
        Ok(registry)
    }
}
