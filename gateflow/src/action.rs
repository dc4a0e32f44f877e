//! Execution of the side effects declared by workflow steps.

use gatecore::{
    Context,
    error::RuleError,
    traits::Dispatcher,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::Arc,
};

/// A named custom action, given the instance data along with the
/// target and the value of the action that referenced it.
pub type ActionFn = Arc<
    dyn Fn(&mut Context, &str, &Value) -> Result<(), RuleError> + Send + Sync
>;

#[derive(Clone, Default)]
pub struct ActionRegistry(HashMap<String, ActionFn>);

/// The dispatcher used when none is configured; it only logs, and
/// rejects an empty target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDispatcher;

/// Runs step actions against an instance.  Failures of individual
/// actions are logged and skipped, they never abort the step.
#[derive(Clone)]
pub struct ActionExecutor {
    actions: ActionRegistry,
    dispatcher: Arc<dyn Dispatcher>,
}

mod impls;
