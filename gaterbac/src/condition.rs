//! Condition evaluation shared by permission checks and workflow steps.

use gatecore::{
    Context,
    TsSource,
    error::RuleError,
};
use std::{
    collections::HashMap,
    sync::Arc,
};

/// A named custom rule, evaluated against the context and the id of the
/// acting user.
pub type RuleFn = Arc<
    dyn Fn(&Context, &str) -> Result<bool, RuleError> + Send + Sync
>;

/// Name-keyed registry of custom rules referenced by `custom`
/// conditions through their `custom_function`.
#[derive(Clone, Default)]
pub struct RuleRegistry(HashMap<String, RuleFn>);

/// The acting user as seen by the `{{user.id}}` and `{{user.role}}`
/// tokens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Subject<'a> {
    pub id: &'a str,
    pub role: Option<&'a str>,
}

/// Evaluates lists of conditions with AND semantics.  Evaluation never
/// fails; anything that cannot be evaluated is false.
#[derive(Clone)]
pub struct Evaluator {
    rules: RuleRegistry,
    ts_source: Option<TsSource>,
}

mod impls;
