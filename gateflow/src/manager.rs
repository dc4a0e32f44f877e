use gatecore::{
    idgen::SeqIdGen,
    traits::AssigneeResolver,
    workflow::{
        Transition,
        WorkflowDefinition,
        WorkflowInstance,
    },
};
use gaterbac::Evaluator;
use indexmap::IndexMap;
use std::{
    collections::{
        BTreeMap,
        VecDeque,
    },
    sync::Arc,
};

use crate::action::ActionExecutor;

/// Prefix of the generated instance ids.
pub const INSTANCE_ID_PREFIX: &str = "wfi-";

/// The workflow catalog along with the instances executing it.
///
/// Instances advance through an explicit queue of transitions, each
/// transition executing a single step.  With automatic driving enabled
/// (the default) every operation drains the queue before returning, so
/// an instance is always either blocked on a step awaiting a decision
/// or finished.  Otherwise the caller advances the queue through
/// [`tick`](Self::tick) or [`run_until_idle`](Self::run_until_idle).
pub struct WorkflowManager {
    auto_drive: bool,
    workflows: IndexMap<String, WorkflowDefinition>,
    instances: BTreeMap<String, WorkflowInstance>,
    queue: VecDeque<Transition>,
    idgen: SeqIdGen,
    evaluator: Evaluator,
    executor: ActionExecutor,
    resolver: Arc<dyn AssigneeResolver>,
}

mod impls;
