use gatecore::TsSource;
use gateflow::{
    Builder as FlowBuilder,
    WorkflowManager,
};
use gaterbac::{
    Builder as RbacBuilder,
    PermissionManager,
};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::Error;

/// The permission required of users making workflow decisions.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowGate {
    pub resource: String,
    pub action: String,
}

#[derive(Clone, Default)]
pub struct Builder {
    rbac_builder: RbacBuilder,
    flow_builder: FlowBuilder,
    ts_source: Option<TsSource>,
    workflow_gate: Option<WorkflowGate>,
}

/// The permission manager and the workflow manager, driven by the same
/// clock.
#[derive(Debug)]
pub struct Platform {
    permissions: PermissionManager,
    workflows: WorkflowManager,
    workflow_gate: Option<WorkflowGate>,
}

/// A platform shared between callers, each mutating call serialized
/// through the lock.
pub type SharedPlatform = Arc<Mutex<Platform>>;

impl Builder {
    pub fn new() -> Self {
        Self {
            rbac_builder: RbacBuilder::new(),
            flow_builder: FlowBuilder::new(),
            .. Default::default()
        }
    }

    pub fn rbac_builder(mut self, val: RbacBuilder) -> Self {
        self.rbac_builder = val;
        self
    }

    pub fn flow_builder(mut self, val: FlowBuilder) -> Self {
        self.flow_builder = val;
        self
    }

    /// Clock for both managers, replacing any set on their builders.
    pub fn ts_source(mut self, val: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.ts_source = Some(Arc::new(val));
        self
    }

    /// Require the permission for approving, rejecting or completing
    /// workflow steps, checked against the instance data.
    pub fn workflow_gate(
        mut self,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.workflow_gate = Some(WorkflowGate {
            resource: resource.into(),
            action: action.into(),
        });
        self
    }

    pub fn build(self) -> Result<Platform, Error> {
        let (rbac_builder, flow_builder) = match self.ts_source {
            Some(ts_source) => (
                self.rbac_builder.clock(Some(ts_source.clone())),
                self.flow_builder.clock(Some(ts_source)),
            ),
            None => (self.rbac_builder, self.flow_builder),
        };
        Ok(Platform {
            permissions: rbac_builder.build()?,
            workflows: flow_builder.build()?,
            workflow_gate: self.workflow_gate,
        })
    }
}

mod impls;
