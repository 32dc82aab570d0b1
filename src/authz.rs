//! Authorization (C6): role→permission lookup, resource-ownership check,
//! step-up gate. Closed permission set, fixed role table — no dynamic
//! role/permission registration, per the single-admin Non-goal.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[serde(rename = "read:repo")]
    ReadRepo,
    #[serde(rename = "write:repo")]
    WriteRepo,
    #[serde(rename = "delete:repo")]
    DeleteRepo,
    #[serde(rename = "create:repo")]
    CreateRepo,
    #[serde(rename = "admin:repo")]
    AdminRepo,
    #[serde(rename = "read:profile")]
    ReadProfile,
    #[serde(rename = "write:profile")]
    WriteProfile,
    #[serde(rename = "manage:keys")]
    ManageKeys,
    #[serde(rename = "export:keys")]
    ExportKeys,
    #[serde(rename = "admin:*")]
    AdminAll,
    #[serde(rename = "create:snapshot")]
    CreateSnapshot,
    #[serde(rename = "read:snapshot")]
    ReadSnapshot,
    #[serde(rename = "restore:snapshot")]
    RestoreSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => &[
                AdminAll,
                ReadRepo,
                WriteRepo,
                DeleteRepo,
                CreateRepo,
                AdminRepo,
                ReadProfile,
                WriteProfile,
                ManageKeys,
                ExportKeys,
                CreateSnapshot,
                ReadSnapshot,
                RestoreSnapshot,
            ],
            Role::User => &[
                ReadRepo,
                WriteRepo,
                CreateRepo,
                ReadProfile,
                WriteProfile,
                ManageKeys,
                CreateSnapshot,
                ReadSnapshot,
            ],
            Role::Guest => &[ReadRepo, ReadProfile],
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        let perms = self.permissions();
        perms.contains(&Permission::AdminAll) || perms.contains(&permission)
    }
}

/// Single-admin mode: admin owns every resource, nobody else owns anything.
/// Placeholder for a multi-tenant future, per the design notes.
pub fn owns_resource(role: Role) -> bool {
    role == Role::Admin
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn admin_wildcard_satisfies_everything() {
        assert!(Role::Admin.has_permission(Permission::RestoreSnapshot));
        assert!(Role::Admin.has_permission(Permission::DeleteRepo));
    }

    #[test]
    fn guest_cannot_write() {
        assert!(!Role::Guest.has_permission(Permission::WriteRepo));
        assert!(Role::Guest.has_permission(Permission::ReadRepo));
    }

    #[test]
    fn only_admin_owns_resources() {
        assert!(owns_resource(Role::Admin));
        assert!(!owns_resource(Role::User));
        assert!(!owns_resource(Role::Guest));
    }
}
