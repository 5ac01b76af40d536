//! Permission Definitions
//!
//! Flat permission strings checked per module. `super_admin` holds every
//! permission regardless of its stored list.

use std::collections::BTreeSet;

use shared::models::Admin;

pub const ORDERS_VIEW: &str = "orders:view";
pub const ORDERS_MANAGE: &str = "orders:manage";
pub const CATALOG_MANAGE: &str = "catalog:manage";
pub const PROVIDERS_MANAGE: &str = "providers:manage";
pub const GROUPS_MANAGE: &str = "groups:manage";
pub const CUSTOMERS_MANAGE: &str = "customers:manage";
pub const FINANCE_VIEW: &str = "finance:view";
pub const FINANCE_APPROVE: &str = "finance:approve";
pub const CITIES_MANAGE: &str = "cities:manage";
pub const COMPLAINTS_MANAGE: &str = "complaints:manage";
pub const SETTINGS_MANAGE: &str = "settings:manage";

/// Assignable permissions
pub const ALL_PERMISSIONS: &[&str] = &[
    ORDERS_VIEW,
    ORDERS_MANAGE,
    CATALOG_MANAGE,
    PROVIDERS_MANAGE,
    GROUPS_MANAGE,
    CUSTOMERS_MANAGE,
    FINANCE_VIEW,
    FINANCE_APPROVE,
    CITIES_MANAGE,
    COMPLAINTS_MANAGE,
    SETTINGS_MANAGE,
];

/// Reserved for `super_admin`, never stored in a list
pub const ADMINS_MANAGE: &str = "admins:manage";

pub fn is_known_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
}

/// Permissions an admin actually holds
pub fn effective_permissions(admin: &Admin) -> BTreeSet<String> {
    if admin.role.is_super() {
        ALL_PERMISSIONS
            .iter()
            .chain(std::iter::once(&ADMINS_MANAGE))
            .map(|p| p.to_string())
            .collect()
    } else {
        admin
            .permissions
            .iter()
            .filter(|p| is_known_permission(p))
            .cloned()
            .collect()
    }
}

pub fn has_permission(admin: &Admin, permission: &str) -> bool {
    admin.is_active && (admin.role.is_super() || admin.permissions.contains(permission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::AdminRole;

    fn admin(role: AdminRole, perms: &[&str]) -> Admin {
        Admin {
            id: "a1".into(),
            name: "n".into(),
            email: "a@x.com".into(),
            role,
            permissions: perms.iter().map(|p| p.to_string()).collect(),
            city_id: None,
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn test_super_admin_ignores_list() {
        let a = admin(AdminRole::SuperAdmin, &[]);
        assert!(has_permission(&a, FINANCE_APPROVE));
        assert!(has_permission(&a, ADMINS_MANAGE));
        assert_eq!(effective_permissions(&a).len(), ALL_PERMISSIONS.len() + 1);
    }

    #[test]
    fn test_admin_uses_list() {
        let mut a = admin(AdminRole::Admin, &[ORDERS_VIEW, "bogus"]);
        assert!(has_permission(&a, ORDERS_VIEW));
        assert!(!has_permission(&a, FINANCE_APPROVE));
        assert_eq!(effective_permissions(&a).len(), 1);

        a.is_active = false;
        assert!(!has_permission(&a, ORDERS_VIEW));
    }
}
