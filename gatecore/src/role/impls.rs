use super::Role;

impl Role {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            .. Default::default()
        }
    }

    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.name = val.into();
        self
    }

    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.description = val.into();
        self
    }

    pub fn permission(mut self, val: impl Into<String>) -> Self {
        self.permissions.push(val.into());
        self
    }

    pub fn permissions<I, S>(mut self, val: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(val.into_iter().map(Into::into));
        self
    }

    pub fn inherits_from(mut self, val: impl Into<String>) -> Self {
        self.inherits_from.push(val.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::Role;

    #[test]
    fn build() {
        let role = Role::new("manager")
            .name("Manager")
            .permissions(["budgets.view", "budgets.approve"])
            .inherits_from("user");
        assert_eq!(role.id, "manager");
        assert_eq!(role.name, "Manager");
        assert_eq!(role.permissions, ["budgets.view", "budgets.approve"]);
        assert_eq!(role.inherits_from, ["user"]);
    }
}
