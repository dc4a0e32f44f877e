use gatecore::{
    assignment::UserAssignment,
    traits::AssigneeResolver,
    workflow::{
        AssigneeKind,
        Step,
        WorkflowInstance,
    },
};
use std::collections::BTreeMap;

/// Resolves assignees from a static directory of role and group
/// members.
///
/// A `user` assignee is taken literally, while a `role` or `group`
/// assignee resolves to the first member registered under that name.
/// `auto` assignees and names without members resolve to nothing.
#[derive(Clone, Debug, Default)]
pub struct DirectoryResolver {
    roles: BTreeMap<String, Vec<String>>,
    groups: BTreeMap<String, Vec<String>>,
}

impl DirectoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role_member(
        mut self,
        role: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.roles.entry(role.into())
            .or_default()
            .push(user_id.into());
        self
    }

    pub fn group_member(
        mut self,
        group: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.groups.entry(group.into())
            .or_default()
            .push(user_id.into());
        self
    }

    /// A directory with the users as members of their assigned roles,
    /// in the order given.
    pub fn from_assignments<'a>(
        assignments: impl IntoIterator<Item = &'a UserAssignment>,
    ) -> Self {
        assignments.into_iter()
            .fold(Self::new(), |directory, assignment| {
                assignment.roles.iter()
                    .fold(directory, |directory, role| {
                        directory.role_member(role, &assignment.user_id)
                    })
            })
    }
}

impl AssigneeResolver for DirectoryResolver {
    fn resolve(
        &self,
        step: &Step,
        _instance: &WorkflowInstance,
    ) -> Option<String> {
        let name = step.assignee.as_deref()?;
        let members = match step.assignee_type {
            AssigneeKind::User => return Some(name.to_string()),
            AssigneeKind::Role => self.roles.get(name),
            AssigneeKind::Group => self.groups.get(name),
            _ => None,
        };
        members.and_then(|members| members.first()).cloned()
    }
}

#[cfg(test)]
mod test {
    use gatecore::{
        Context,
        workflow::StepKind,
    };
    use super::*;

    #[test]
    fn resolve() {
        let resolver = DirectoryResolver::new()
            .role_member("manager", "m1")
            .role_member("manager", "m2")
            .group_member("finance", "f1");
        let instance = WorkflowInstance::new("wfi-1", "wf", Context::new(), "u1", 0);
        let step = |kind, name: &str| Step::new("s", StepKind::Approval)
            .assignee(kind, name);

        assert_eq!(resolver.resolve(&step(AssigneeKind::User, "admin"), &instance),
            Some("admin".to_string()));
        assert_eq!(resolver.resolve(&step(AssigneeKind::Role, "manager"), &instance),
            Some("m1".to_string()));
        assert_eq!(resolver.resolve(&step(AssigneeKind::Group, "finance"), &instance),
            Some("f1".to_string()));
        assert_eq!(resolver.resolve(&step(AssigneeKind::Role, "advisor"), &instance), None);
        assert_eq!(resolver.resolve(&step(AssigneeKind::Auto, "admin"), &instance), None);
        assert_eq!(resolver.resolve(&Step::new("s", StepKind::Approval), &instance), None);
    }

    #[test]
    fn assignments() {
        let mut m1 = UserAssignment::new("m1");
        m1.add_role("manager");
        let mut m2 = UserAssignment::new("m2");
        m2.add_role("advisor");
        m2.add_role("manager");
        let resolver = DirectoryResolver::from_assignments(&[m1, m2]);
        let instance = WorkflowInstance::new("wfi-1", "wf", Context::new(), "u1", 0);
        let step = |name: &str| Step::new("s", StepKind::Approval)
            .assignee(AssigneeKind::Role, name);
        assert_eq!(resolver.resolve(&step("manager"), &instance), Some("m1".to_string()));
        assert_eq!(resolver.resolve(&step("advisor"), &instance), Some("m2".to_string()));
        assert_eq!(resolver.resolve(&step("admin"), &instance), None);
    }
}
