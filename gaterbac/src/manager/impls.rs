use gatecore::{
    Context,
    audit::CheckFilter,
    snapshot::AccessState,
};
use std::{
    collections::HashSet,
    time::Duration,
};

use crate::{
    condition::Subject,
    error::Error,
    seed,
};
use super::*;

impl PermissionManager {
    pub fn new(evaluator: Evaluator, role_inheritance: bool) -> Self {
        Self {
            enabled: true,
            role_inheritance,
            permissions: IndexMap::new(),
            roles: IndexMap::new(),
            assignments: BTreeMap::new(),
            checks: Vec::new(),
            evaluator,
        }
    }

    /// Seeds the built-in catalogs; entries already present are kept.
    pub fn initialize(&mut self) {
        let permissions = seed::default_permissions();
        let roles = seed::default_roles(&permissions);
        for permission in permissions.into_iter() {
            self.permissions.entry(permission.id.clone())
                .or_insert(permission);
        }
        for role in roles.into_iter() {
            self.roles.entry(role.id.clone())
                .or_insert(role);
        }
        log::debug!("permission catalogs seeded");
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }
}

// Enforcement

impl PermissionManager {
    /// Whether the user may perform the action on the resource.
    ///
    /// Never fails: an unknown user, an unknown permission or a failing
    /// rule all deny.  Each call made while enabled appends exactly one
    /// record to the audit log; while disabled everything is permitted
    /// and nothing is recorded.
    pub fn can(
        &mut self,
        user_id: &str,
        resource: &str,
        action: &str,
        context: Option<&Context>,
    ) -> bool {
        if !self.enabled {
            log::trace!("permission manager disabled; permitting {user_id} {resource}.{action}");
            return true;
        }
        let context = context.cloned().unwrap_or_default();
        let decision = self.decide(user_id, resource, action, &context);
        let check = PermissionCheck::new(
            user_id,
            resource,
            action,
            context,
            self.evaluator.now(),
        );
        let check = match decision {
            Some(reason) => check.granted(reason),
            None => check.denied(PERMISSION_NOT_FOUND),
        };
        let result = check.result;
        log::debug!(
            "{user_id} {} {resource}.{action}: {}",
            if result { "permitted" } else { "denied" },
            check.reason.as_deref().unwrap_or_default(),
        );
        self.checks.push(check);
        result
    }

    fn decide(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
        context: &Context,
    ) -> Option<String> {
        let assignment = self.assignments.get(user_id)?;
        let subject = Subject::new(user_id)
            .role(assignment.primary_role());
        let granted = |permission: &&Permission| {
            permission.matches(resource, action) &&
            self.evaluator.evaluate(&permission.conditions, context, &subject)
        };

        if let Some(permission) = assignment.permissions.iter()
            .filter_map(|id| self.permissions.get(id))
            .find(&granted)
        {
            return Some(format!("Direct permission: {}", permission.id));
        }
        for role_id in assignment.roles.iter() {
            if let Some(permission) = self.role_permissions(role_id)
                .into_iter()
                .find(&granted)
            {
                return Some(format!("Role permission: {role_id} ({})", permission.id));
            }
        }
        assignment.custom_permissions.iter()
            .find(&granted)
            .map(|permission| format!("Custom permission: {}", permission.id))
    }

    // Permissions of the role, followed by those of its ancestors when
    // role inheritance is enabled.  Ids missing from the catalog are
    // skipped.
    fn role_permissions(&self, role_id: &str) -> Vec<&Permission> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        self.collect_role_permissions(role_id, &mut visited, &mut result);
        result
    }

    fn collect_role_permissions<'a>(
        &'a self,
        role_id: &str,
        visited: &mut HashSet<String>,
        result: &mut Vec<&'a Permission>,
    ) {
        if !visited.insert(role_id.to_string()) {
            return;
        }
        let Some(role) = self.roles.get(role_id) else {
            log::trace!("skipping unknown role {role_id}");
            return;
        };
        result.extend(role.permissions.iter()
            .filter_map(|id| self.permissions.get(id)));
        if self.role_inheritance {
            for parent in role.inherits_from.iter() {
                self.collect_role_permissions(parent, visited, result);
            }
        }
    }

    pub fn enable(&mut self) {
        log::info!("permission checks enabled");
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        log::warn!("permission checks disabled; every check will be permitted");
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// Assignment management

impl PermissionManager {
    /// Returns false if the role was already assigned to the user.
    pub fn assign_role(
        &mut self,
        user_id: &str,
        role_id: &str,
    ) -> Result<bool, Error> {
        if !self.roles.contains_key(role_id) {
            return Err(Error::UnknownRole(role_id.to_string()));
        }
        Ok(self.assignment_mut(user_id).add_role(role_id))
    }

    /// Returns false if the user did not have the role.
    pub fn remove_role(&mut self, user_id: &str, role_id: &str) -> bool {
        self.assignments.get_mut(user_id)
            .map(|assignment| assignment.remove_role(role_id))
            .unwrap_or(false)
    }

    pub fn assign_permission(
        &mut self,
        user_id: &str,
        permission_id: &str,
    ) -> Result<bool, Error> {
        if !self.permissions.contains_key(permission_id) {
            return Err(Error::UnknownPermission(permission_id.to_string()));
        }
        Ok(self.assignment_mut(user_id).add_permission(permission_id))
    }

    pub fn remove_permission(&mut self, user_id: &str, permission_id: &str) -> bool {
        self.assignments.get_mut(user_id)
            .map(|assignment| assignment.remove_permission(permission_id))
            .unwrap_or(false)
    }

    /// Attach an ad hoc permission to the user; it need not be in the
    /// catalog.  Returns false if one with the same id was replaced.
    pub fn add_custom_permission(
        &mut self,
        user_id: &str,
        permission: Permission,
    ) -> bool {
        self.assignment_mut(user_id).add_custom_permission(permission)
    }

    fn assignment_mut(&mut self, user_id: &str) -> &mut UserAssignment {
        self.assignments.entry(user_id.to_string())
            .or_insert_with(|| {
                log::trace!("new assignment for {user_id}");
                UserAssignment::new(user_id)
            })
    }

    pub fn get_assignment(&self, user_id: &str) -> Option<&UserAssignment> {
        self.assignments.get(user_id)
    }

    pub fn get_user_roles(&self, user_id: &str) -> Vec<String> {
        self.assignments.get(user_id)
            .map(|assignment| assignment.roles.clone())
            .unwrap_or_default()
    }

    /// Direct, role derived and custom permissions of the user, in the
    /// order a check would consider them, without duplicated ids.
    pub fn get_effective_permissions(&self, user_id: &str) -> Vec<Permission> {
        let Some(assignment) = self.assignments.get(user_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        assignment.permissions.iter()
            .filter_map(|id| self.permissions.get(id))
            .chain(assignment.roles.iter()
                .flat_map(|role_id| self.role_permissions(role_id)))
            .chain(assignment.custom_permissions.iter())
            .filter(|permission| seen.insert(permission.id.clone()))
            .cloned()
            .collect()
    }
}

// Catalog management

impl PermissionManager {
    pub fn create_permission(&mut self, permission: Permission) -> Result<(), Error> {
        if self.permissions.contains_key(&permission.id) {
            return Err(Error::DuplicatePermission(permission.id));
        }
        log::debug!("creating permission {}", permission.id);
        self.permissions.insert(permission.id.clone(), permission);
        Ok(())
    }

    /// The permissions and parents the role refers to must already be
    /// in the catalogs.
    pub fn create_role(&mut self, role: Role) -> Result<(), Error> {
        if self.roles.contains_key(&role.id) {
            return Err(Error::DuplicateRole(role.id));
        }
        if let Some(id) = role.permissions.iter()
            .find(|id| !self.permissions.contains_key(id.as_str()))
        {
            return Err(Error::UnknownPermission(id.clone()));
        }
        if let Some(id) = role.inherits_from.iter()
            .find(|id| !self.roles.contains_key(id.as_str()) && **id != role.id)
        {
            return Err(Error::UnknownRole(id.clone()));
        }
        log::debug!("creating role {}", role.id);
        self.roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn get_permission(&self, id: &str) -> Option<&Permission> {
        self.permissions.get(id)
    }

    pub fn get_role(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn get_all_permissions(&self) -> Vec<&Permission> {
        self.permissions.values().collect()
    }

    pub fn get_all_roles(&self) -> Vec<&Role> {
        self.roles.values().collect()
    }
}

// Audit log

impl PermissionManager {
    /// Matching audit records, newest first.
    pub fn get_permission_check_history(
        &self,
        filter: &CheckFilter,
    ) -> Vec<&PermissionCheck> {
        self.checks.iter()
            .rev()
            .filter(|check| filter.matches(check))
            .collect()
    }

    /// Drop audit records older than `max_age`, returning how many were
    /// removed.
    pub fn cleanup(&mut self, max_age: Duration) -> usize {
        let cutoff = self.evaluator.now()
            .saturating_sub(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
        let len = self.checks.len();
        self.checks.retain(|check| check.timestamp >= cutoff);
        let removed = len - self.checks.len();
        log::debug!("removed {removed} audit record(s) older than {cutoff}");
        removed
    }

    pub fn export_state(&self) -> AccessState {
        AccessState {
            assignments: self.assignments.values().cloned().collect(),
            checks: self.checks.clone(),
        }
    }

    /// Replaces the assignments and the audit log.
    pub fn import_state(&mut self, state: AccessState) {
        self.assignments = state.assignments.into_iter()
            .map(|assignment| (assignment.user_id.clone(), assignment))
            .collect();
        self.checks = state.checks;
        log::debug!(
            "imported {} assignment(s) and {} audit record(s)",
            self.assignments.len(),
            self.checks.len(),
        );
    }
}
