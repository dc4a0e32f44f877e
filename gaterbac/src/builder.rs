use gatecore::{
    Context,
    TsSource,
    error::RuleError,
    permission::Permission,
    role::Role,
};
use std::sync::Arc;

use crate::{
    condition::{
        Evaluator,
        RuleRegistry,
    },
    error::Error,
    manager::PermissionManager,
};

/// Builds a `PermissionManager`.
///
/// Methods can be chained in order to set the configuration values.
/// The manager is constructed by calling [`build`].
///
/// New instances of the builder can be obtained via `Builder::default`
/// or `Builder::new`.  The former provides empty catalogs while the
/// latter seeds the built-in permissions and roles.
#[derive(Clone, Default)]
pub struct Builder {
    seed: bool,
    disabled: bool,
    role_inheritance: bool,
    rules: RuleRegistry,
    ts_source: Option<TsSource>,
    permissions: Vec<Permission>,
    roles: Vec<Role>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            seed: true,
            .. Default::default()
        }
    }

    pub fn seed(mut self, val: bool) -> Self {
        self.seed = val;
        self
    }

    pub fn enabled(mut self, val: bool) -> Self {
        self.disabled = !val;
        self
    }

    /// Expand `Role::inherits_from` when collecting role permissions.
    pub fn role_inheritance(mut self, val: bool) -> Self {
        self.role_inheritance = val;
        self
    }

    pub fn rule(
        mut self,
        name: impl Into<String>,
        rule: impl Fn(&Context, &str) -> Result<bool, RuleError> + Send + Sync + 'static,
    ) -> Self {
        self.rules.register(name, rule);
        self
    }

    pub fn rules(mut self, val: RuleRegistry) -> Self {
        self.rules = val;
        self
    }

    pub fn ts_source(mut self, val: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.ts_source = Some(Arc::new(val));
        self
    }

    pub fn clock(mut self, val: Option<TsSource>) -> Self {
        self.ts_source = val;
        self
    }

    /// Additional permission to be created after seeding.
    pub fn permission(mut self, val: Permission) -> Self {
        self.permissions.push(val);
        self
    }

    /// Additional role to be created after seeding and after the
    /// additional permissions.
    pub fn role(mut self, val: Role) -> Self {
        self.roles.push(val);
        self
    }

    pub fn build(self) -> Result<PermissionManager, Error> {
        let evaluator = Evaluator::new(self.rules)
            .clock(self.ts_source);
        let mut manager = PermissionManager::new(evaluator, self.role_inheritance);
        if self.seed {
            manager.initialize();
        }
        for permission in self.permissions.into_iter() {
            manager.create_permission(permission)?;
        }
        for role in self.roles.into_iter() {
            manager.create_role(role)?;
        }
        if self.disabled {
            manager.disable();
        }
        log::debug!(
            "permission manager built with {} permissions and {} roles",
            manager.get_all_permissions().len(),
            manager.get_all_roles().len(),
        );
        Ok(manager)
    }
}
