use std::fmt;

use crate::errors::AppError;
use crate::utils::actor::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Companies,
    Employees,
}

/// A named capability such as `read-companies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub action: Action,
    pub resource: Resource,
}

impl Permission {
    pub fn new(action: Action, resource: Resource) -> Self {
        Self { action, resource }
    }

    /// Every permission the role store is seeded with.
    pub fn all() -> Vec<Permission> {
        [Resource::Companies, Resource::Employees]
            .into_iter()
            .flat_map(|resource| {
                [Action::Read, Action::Create, Action::Update, Action::Delete]
                    .into_iter()
                    .map(move |action| Permission::new(action, resource))
            })
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        let resource = match self.resource {
            Resource::Companies => "companies",
            Resource::Employees => "employees",
        };
        write!(f, "{}-{}", action, resource)
    }
}

/// Rejects the request unless `actor` holds the permission for `action` on `resource`.
pub fn authorize(actor: &Actor, action: Action, resource: Resource) -> Result<(), AppError> {
    let permission = Permission::new(action, resource);
    if actor.can(&permission.to_string()) {
        Ok(())
    } else {
        log::warn!("User {} lacks {}", actor.id, permission);
        Err(AppError::Forbidden)
    }
}
