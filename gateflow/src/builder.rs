use gatecore::{
    Context,
    TsSource,
    error::RuleError,
    traits::{
        AssigneeResolver,
        Dispatcher,
    },
    workflow::WorkflowDefinition,
};
use gaterbac::{
    Evaluator,
    RuleRegistry,
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    action::{
        ActionExecutor,
        ActionRegistry,
        LogDispatcher,
    },
    error::Error,
    manager::WorkflowManager,
    resolver::DirectoryResolver,
};

/// Builds a `WorkflowManager`.
///
/// `Builder::new` seeds the built-in workflows while `Builder::default`
/// starts with an empty catalog.  Both drive instances automatically,
/// log notifications through the `LogDispatcher` and resolve assignees
/// with an empty `DirectoryResolver` unless configured otherwise.
#[derive(Clone, Default)]
pub struct Builder {
    seed: bool,
    manual_drive: bool,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    resolver: Option<Arc<dyn AssigneeResolver>>,
    actions: ActionRegistry,
    rules: RuleRegistry,
    ts_source: Option<TsSource>,
    workflows: Vec<WorkflowDefinition>,
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

    /// Whether operations drain the transition queue before returning.
    pub fn auto_drive(mut self, val: bool) -> Self {
        self.manual_drive = !val;
        self
    }

    pub fn dispatcher(mut self, val: impl Dispatcher + 'static) -> Self {
        self.dispatcher = Some(Arc::new(val));
        self
    }

    pub fn resolver(mut self, val: impl AssigneeResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(val));
        self
    }

    pub fn action(
        mut self,
        name: impl Into<String>,
        action: impl Fn(&mut Context, &str, &Value) -> Result<(), RuleError>
            + Send + Sync + 'static,
    ) -> Self {
        self.actions.register(name, action);
        self
    }

    pub fn actions(mut self, val: ActionRegistry) -> Self {
        self.actions = val;
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

    /// Additional workflow to be created after seeding.
    pub fn workflow(mut self, val: WorkflowDefinition) -> Self {
        self.workflows.push(val);
        self
    }

    pub fn build(self) -> Result<WorkflowManager, Error> {
        let evaluator = Evaluator::new(self.rules)
            .clock(self.ts_source);
        let dispatcher: Arc<dyn Dispatcher> = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => Arc::new(LogDispatcher),
        };
        let resolver: Arc<dyn AssigneeResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(DirectoryResolver::default()),
        };
        let executor = ActionExecutor::new(self.actions, dispatcher);
        let mut manager = WorkflowManager::new(
            evaluator,
            executor,
            resolver,
            !self.manual_drive,
        );
        if self.seed {
            manager.initialize();
        }
        for workflow in self.workflows.into_iter() {
            manager.create_workflow(workflow)?;
        }
        log::debug!(
            "workflow manager built with {} workflows",
            manager.get_all_workflows().len(),
        );
        Ok(manager)
    }
}
