use serde::{Deserialize, Serialize};
use crate::permission::Permission;

/// The roles and permissions granted to a single user.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct UserAssignment {
    pub user_id: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    #[serde(default)]
    pub custom_permissions: Vec<Permission>,
}

impl UserAssignment {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            .. Default::default()
        }
    }

    /// Returns false if the role was already assigned.
    pub fn add_role(&mut self, role_id: &str) -> bool {
        push_unique(&mut self.roles, role_id)
    }

    /// Returns false if the role was not assigned.
    pub fn remove_role(&mut self, role_id: &str) -> bool {
        remove_item(&mut self.roles, role_id)
    }

    pub fn add_permission(&mut self, permission_id: &str) -> bool {
        push_unique(&mut self.permissions, permission_id)
    }

    pub fn remove_permission(&mut self, permission_id: &str) -> bool {
        remove_item(&mut self.permissions, permission_id)
    }

    /// Attaches an ad hoc permission; one with the same id is replaced
    /// in place, in which case false is returned.
    pub fn add_custom_permission(&mut self, permission: Permission) -> bool {
        match self.custom_permissions.iter_mut()
            .find(|p| p.id == permission.id)
        {
            Some(existing) => {
                *existing = permission;
                false
            }
            None => {
                self.custom_permissions.push(permission);
                true
            }
        }
    }

    /// The role the `{{user.role}}` token resolves to, i.e. the first
    /// assigned role.
    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }
}

fn push_unique(items: &mut Vec<String>, item: &str) -> bool {
    if items.iter().any(|i| i == item) {
        false
    } else {
        items.push(item.to_string());
        true
    }
}

fn remove_item(items: &mut Vec<String>, item: &str) -> bool {
    let len = items.len();
    items.retain(|i| i != item);
    items.len() != len
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roles() {
        let mut assignment = UserAssignment::new("alice");
        assert_eq!(assignment.primary_role(), None);
        assert!(assignment.add_role("franchisee"));
        assert!(!assignment.add_role("franchisee"));
        assert!(assignment.add_role("user"));
        assert_eq!(assignment.roles, ["franchisee", "user"]);
        assert_eq!(assignment.primary_role(), Some("franchisee"));
        assert!(assignment.remove_role("franchisee"));
        assert!(!assignment.remove_role("franchisee"));
        assert_eq!(assignment.primary_role(), Some("user"));
    }

    #[test]
    fn custom_permission_replaced() {
        let mut assignment = UserAssignment::new("alice");
        assert!(assignment.add_custom_permission(
            Permission::new("reports", "view")
        ));
        assert!(!assignment.add_custom_permission(
            Permission::new("reports", "view").name("Reports")
        ));
        assert_eq!(assignment.custom_permissions.len(), 1);
        assert_eq!(assignment.custom_permissions[0].name, "Reports");
    }
}
