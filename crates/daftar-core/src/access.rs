//! # Access Control
//!
//! Who may see and change what. Every repository query that lists or
//! changes user-owned records takes an [`Actor`].
//!
//! | Role  | can_view_all | can_edit          | can_delete |
//! |-------|--------------|-------------------|------------|
//! | admin | yes          | yes               | yes        |
//! | user  | own only     | own records only  | no         |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

/// What an actor's role permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Capabilities {
    pub can_view_all: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Capabilities {
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Capabilities {
                can_view_all: true,
                can_edit: true,
                can_delete: true,
            },
            Role::User => Capabilities {
                can_view_all: false,
                can_edit: true,
                can_delete: false,
            },
        }
    }
}

impl Actor {
    pub const fn new(user_id: i64, role: Role) -> Self {
        Actor { user_id, role }
    }

    pub const fn admin(user_id: i64) -> Self {
        Actor::new(user_id, Role::Admin)
    }

    pub const fn user(user_id: i64) -> Self {
        Actor::new(user_id, Role::User)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Creator filter a listing query must apply: `None` means unrestricted.
    pub fn owner_scope(&self) -> Option<i64> {
        if self.capabilities().can_view_all {
            None
        } else {
            Some(self.user_id)
        }
    }

    /// Whether the actor may read a record created by `owner`.
    pub fn can_view(&self, owner: Option<i64>) -> bool {
        self.capabilities().can_view_all || owner == Some(self.user_id)
    }

    pub fn ensure_view(&self, owner: Option<i64>, action: &str) -> CoreResult<()> {
        if self.can_view(owner) {
            Ok(())
        } else {
            Err(CoreError::denied(action))
        }
    }

    /// Editing needs `can_edit` plus ownership unless the actor sees everything.
    pub fn ensure_edit(&self, owner: Option<i64>, action: &str) -> CoreResult<()> {
        let caps = self.capabilities();
        if caps.can_edit && (caps.can_view_all || owner == Some(self.user_id)) {
            Ok(())
        } else {
            Err(CoreError::denied(action))
        }
    }

    pub fn ensure_delete(&self, action: &str) -> CoreResult<()> {
        if self.capabilities().can_delete {
            Ok(())
        } else {
            Err(CoreError::denied(action))
        }
    }

    /// Role/status changes, catalog edits, salary payment flag.
    pub fn ensure_admin(&self, action: &str) -> CoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::denied(action))
        }
    }

    /// Admin, or the employee acting on their own record.
    pub fn ensure_self_or_admin(&self, user_id: i64, action: &str) -> CoreResult<()> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(CoreError::denied(action))
        }
    }
}
