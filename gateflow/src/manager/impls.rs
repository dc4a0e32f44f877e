use gatecore::{
    Context,
    snapshot::WorkflowState,
    workflow::{
        HistoryAction,
        HistoryItem,
        InstanceStatus,
        StepKind,
        TriggerEvent,
    },
};
use gaterbac::Subject;
use std::{
    fmt,
    time::Duration,
};

use crate::{
    error::Error,
    seed,
};
use super::*;

impl fmt::Debug for WorkflowManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WorkflowManager")
            .field("auto_drive", &self.auto_drive)
            .field("workflows", &self.workflows.keys().collect::<Vec<_>>())
            .field("instances", &self.instances.len())
            .field("queue", &self.queue)
            .field("evaluator", &self.evaluator)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl WorkflowManager {
    pub fn new(
        evaluator: Evaluator,
        executor: ActionExecutor,
        resolver: Arc<dyn AssigneeResolver>,
        auto_drive: bool,
    ) -> Self {
        Self {
            auto_drive,
            workflows: IndexMap::new(),
            instances: BTreeMap::new(),
            queue: VecDeque::new(),
            idgen: SeqIdGen::new(INSTANCE_ID_PREFIX),
            evaluator,
            executor,
            resolver,
        }
    }

    /// Seeds the built-in workflows; definitions already present are
    /// kept.
    pub fn initialize(&mut self) {
        for workflow in seed::default_workflows().into_iter() {
            self.workflows.entry(workflow.id.clone())
                .or_insert(workflow);
        }
        log::debug!("workflow catalog seeded");
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn is_auto_drive(&self) -> bool {
        self.auto_drive
    }
}

// Catalog management

impl WorkflowManager {
    pub fn create_workflow(&mut self, workflow: WorkflowDefinition) -> Result<(), Error> {
        if self.workflows.contains_key(&workflow.id) {
            return Err(Error::DuplicateWorkflow(workflow.id));
        }
        log::debug!("creating workflow {}", workflow.id);
        self.workflows.insert(workflow.id.clone(), workflow);
        Ok(())
    }

    pub fn get_workflow(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(id)
    }

    pub fn get_all_workflows(&self) -> Vec<&WorkflowDefinition> {
        self.workflows.values().collect()
    }

    /// Disabling a workflow only prevents new instances; running ones
    /// carry on.
    pub fn set_workflow_enabled(&mut self, id: &str, enabled: bool) -> Result<(), Error> {
        let workflow = self.workflows.get_mut(id)
            .ok_or_else(|| Error::WorkflowNotFound(id.to_string()))?;
        log::info!(
            "workflow {id} {}",
            if enabled { "enabled" } else { "disabled" },
        );
        workflow.enabled = enabled;
        Ok(())
    }
}

// Stepping

impl WorkflowManager {
    fn enqueue(&mut self, transition: Transition) {
        log::trace!(
            "queued step {} of {}",
            transition.step_index, transition.instance_id,
        );
        self.queue.push_back(transition);
        if self.auto_drive {
            self.run_until_idle();
        }
    }

    /// Execute the next queued transition, returning false if there was
    /// nothing to execute.
    pub fn tick(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(transition) => {
                self.execute_step(transition);
                true
            }
            None => false,
        }
    }

    /// Execute queued transitions until none remain, returning how many
    /// were executed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut n = 0;
        while self.tick() {
            n += 1;
        }
        n
    }

    /// The number of queued transitions.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn execute_step(&mut self, transition: Transition) {
        let now = self.evaluator.now();
        let Some(instance) = self.instances.get_mut(&transition.instance_id) else {
            log::warn!("dropping transition for unknown instance {}", transition.instance_id);
            return;
        };
        if !instance.is_running() {
            log::debug!("dropping transition for {} instance {}", instance.status, instance.id);
            return;
        }
        let Some(workflow) = self.workflows.get(&instance.workflow_id) else {
            log::warn!(
                "instance {} refers to unknown workflow {}",
                instance.id, instance.workflow_id,
            );
            return;
        };

        let index = transition.step_index;
        instance.current_step = index;
        let Some(step) = workflow.steps.get(index) else {
            instance.status = InstanceStatus::Completed;
            instance.completed_at = Some(now);
            log::info!("instance {} of {} completed", instance.id, workflow.id);
            return;
        };

        instance.push_history(HistoryItem::new(&step.id, HistoryAction::Started, now));
        let holds = self.evaluator.evaluate(
            &step.conditions,
            &instance.data,
            &Subject::new(&instance.created_by),
        );
        if !holds {
            instance.push_history(HistoryItem::new(&step.id, HistoryAction::Skipped, now));
            self.queue.push_back(Transition::new(&instance.id, index + 1));
            return;
        }

        self.executor.execute(&step.actions, instance);

        if step.is_blocking() {
            match self.resolver.resolve(step, instance) {
                Some(assignee) => {
                    log::info!(
                        "instance {}: {} step {} awaiting {assignee}",
                        instance.id, step.kind, step.id,
                    );
                    instance.assignees.insert(step.id.clone(), assignee);
                }
                None => log::warn!(
                    "instance {}: no {} assignee resolved for step {}; stalled",
                    instance.id, step.assignee_type, step.id,
                ),
            }
        } else {
            instance.push_history(HistoryItem::new(&step.id, HistoryAction::Completed, now));
            self.queue.push_back(Transition::new(&instance.id, index + 1));
        }
    }

    // Drop any queued transitions of the instance and mark it failed.
    fn fail(&mut self, instance_id: &str, item: HistoryItem) {
        self.queue.retain(|transition| transition.instance_id != instance_id);
        if let Some(instance) = self.instances.get_mut(instance_id) {
            instance.completed_at = Some(item.timestamp);
            instance.status = InstanceStatus::Failed;
            instance.push_history(item);
            log::info!("instance {instance_id} failed");
        }
    }
}

// Execution

impl WorkflowManager {
    /// Create a running instance of the workflow and drive it until it
    /// blocks or completes, returning the id of the new instance.
    pub fn start_workflow(
        &mut self,
        workflow_id: &str,
        data: Context,
        created_by: &str,
    ) -> Result<String, Error> {
        let workflow = self.workflows.get(workflow_id)
            .ok_or_else(|| Error::WorkflowNotFound(workflow_id.to_string()))?;
        if !workflow.enabled {
            return Err(Error::WorkflowDisabled(workflow_id.to_string()));
        }
        let id = self.idgen.next();
        let instance = WorkflowInstance::new(
            &id,
            workflow_id,
            data,
            created_by,
            self.evaluator.now(),
        );
        log::info!("workflow {workflow_id} started as {id} by {created_by}");
        self.instances.insert(id.clone(), instance);
        self.enqueue(Transition::new(&id, 0));
        Ok(id)
    }

    // The instance must be running and the user the recorded assignee
    // of the step; returns the index and the kind of the step.
    fn validate_decision(
        &self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
    ) -> Result<(usize, StepKind), Error> {
        let instance = self.instances.get(instance_id)
            .ok_or_else(|| Error::InstanceNotFound(instance_id.to_string()))?;
        if !instance.is_running() {
            return Err(Error::NotRunning(instance_id.to_string()));
        }
        let workflow = self.workflows.get(&instance.workflow_id)
            .ok_or_else(|| Error::WorkflowNotFound(instance.workflow_id.clone()))?;
        let index = workflow.step_index(step_id)
            .ok_or_else(|| Error::StepNotFound(step_id.to_string()))?;
        if instance.assignee(step_id) != Some(user_id) {
            return Err(Error::NotAssignee {
                step_id: step_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        if instance.is_step_decided(step_id) {
            return Err(Error::StepDecided(step_id.to_string()));
        }
        Ok((index, workflow.steps[index].kind))
    }

    fn advance(
        &mut self,
        instance_id: &str,
        index: usize,
        item: HistoryItem,
    ) {
        if let Some(instance) = self.instances.get_mut(instance_id) {
            instance.push_history(item);
        }
        self.enqueue(Transition::new(instance_id, index + 1));
    }

    /// Approve the step as its assignee, then continue with the step
    /// following it.
    pub fn approve_step(
        &mut self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
        comment: Option<&str>,
    ) -> Result<(), Error> {
        let (index, _) = self.validate_decision(instance_id, step_id, user_id)?;
        log::info!("instance {instance_id}: step {step_id} approved by {user_id}");
        let item = HistoryItem::new(step_id, HistoryAction::Approved, self.evaluator.now())
            .user_id(user_id)
            .comment(comment);
        self.advance(instance_id, index, item);
        Ok(())
    }

    /// Complete a manual task as its assignee, then continue with the
    /// step following it.
    pub fn complete_task(
        &mut self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
        comment: Option<&str>,
    ) -> Result<(), Error> {
        let (index, kind) = self.validate_decision(instance_id, step_id, user_id)?;
        if kind != StepKind::Task {
            return Err(Error::StepNotBlocking(step_id.to_string()));
        }
        log::info!("instance {instance_id}: task {step_id} completed by {user_id}");
        let item = HistoryItem::new(step_id, HistoryAction::Completed, self.evaluator.now())
            .user_id(user_id)
            .comment(comment);
        self.advance(instance_id, index, item);
        Ok(())
    }

    /// Reject the step as its assignee; the instance fails and no
    /// further step is executed.
    pub fn reject_step(
        &mut self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
        comment: Option<&str>,
    ) -> Result<(), Error> {
        self.validate_decision(instance_id, step_id, user_id)?;
        log::info!("instance {instance_id}: step {step_id} rejected by {user_id}");
        let item = HistoryItem::new(step_id, HistoryAction::Rejected, self.evaluator.now())
            .user_id(user_id)
            .comment(comment);
        self.fail(instance_id, item);
        Ok(())
    }

    /// Fail a running instance regardless of who is assigned to it.
    /// Authorizing the caller is left to the embedding application.
    pub fn cancel_instance(
        &mut self,
        instance_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), Error> {
        let instance = self.instances.get(instance_id)
            .ok_or_else(|| Error::InstanceNotFound(instance_id.to_string()))?;
        if !instance.is_running() {
            return Err(Error::NotRunning(instance_id.to_string()));
        }
        let step_id = self.workflows.get(&instance.workflow_id)
            .and_then(|workflow| workflow.steps.get(instance.current_step))
            .map(|step| step.id.clone())
            .unwrap_or_default();
        log::info!("instance {instance_id} cancelled by {user_id}");
        let item = HistoryItem::new(step_id, HistoryAction::Rejected, self.evaluator.now())
            .user_id(user_id)
            .comment(reason);
        self.fail(instance_id, item);
        Ok(())
    }

    /// Fail every running instance blocked on a step whose timeout has
    /// elapsed by `now`, returning the ids of the failed instances.
    pub fn expire_overdue(&mut self, now: i64) -> Vec<String> {
        let expired = self.instances.values()
            .filter(|instance| instance.is_running())
            .filter(|instance| !self.queue.iter()
                .any(|transition| transition.instance_id == instance.id))
            .filter_map(|instance| {
                let step = self.workflows.get(&instance.workflow_id)?
                    .steps
                    .get(instance.current_step)?;
                let timeout = i64::try_from(step.timeout?).ok()?;
                let started = instance.step_started_at(&step.id)?;
                (step.is_blocking() && now.saturating_sub(started) >= timeout)
                    .then(|| (instance.id.clone(), step.id.clone()))
            })
            .collect::<Vec<_>>();
        expired.into_iter()
            .map(|(instance_id, step_id)| {
                log::warn!("instance {instance_id}: step {step_id} timed out");
                let item = HistoryItem::new(step_id, HistoryAction::Rejected, now)
                    .comment(Some("timed out"));
                self.fail(&instance_id, item);
                instance_id
            })
            .collect()
    }

    /// Start every enabled workflow with a trigger matching the event
    /// on the resource, where the trigger conditions hold against the
    /// data.  Returns the ids of the started instances.
    pub fn fire_event(
        &mut self,
        event: TriggerEvent,
        resource: &str,
        data: &Context,
        created_by: &str,
    ) -> Vec<String> {
        let subject = Subject::new(created_by);
        let matched = self.workflows.values()
            .filter(|workflow| workflow.enabled)
            .filter(|workflow| workflow.triggers.iter().any(|trigger| {
                trigger.event == event &&
                trigger.resource == resource &&
                self.evaluator.evaluate(&trigger.conditions, data, &subject)
            }))
            .map(|workflow| workflow.id.clone())
            .collect::<Vec<_>>();
        log::debug!("{event} on {resource} matched {} workflow(s)", matched.len());
        matched.into_iter()
            .filter_map(|workflow_id| {
                self.start_workflow(&workflow_id, data.clone(), created_by)
                    .map_err(|e| log::warn!("failed to start {workflow_id}: {e}"))
                    .ok()
            })
            .collect()
    }
}

// Queries and state

impl WorkflowManager {
    pub fn get_instance(&self, instance_id: &str) -> Option<&WorkflowInstance> {
        self.instances.get(instance_id)
    }

    /// Running instances whose current step is assigned to the user.
    pub fn get_instances_by_user(&self, user_id: &str) -> Vec<&WorkflowInstance> {
        self.instances.values()
            .filter(|instance| instance.is_running())
            .filter(|instance| self.workflows.get(&instance.workflow_id)
                .and_then(|workflow| workflow.steps.get(instance.current_step))
                .is_some_and(|step| instance.assignee(&step.id) == Some(user_id))
            )
            .collect()
    }

    /// Every instance, in the order they were started.
    pub fn get_all_instances(&self) -> Vec<&WorkflowInstance> {
        self.instances.values().collect()
    }

    /// Drop completed instances that finished more than `max_age` ago,
    /// returning how many were removed.  Running and failed instances
    /// are kept.
    pub fn cleanup(&mut self, max_age: Duration) -> usize {
        let cutoff = self.evaluator.now()
            .saturating_sub(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
        let len = self.instances.len();
        self.instances.retain(|_, instance| {
            instance.status != InstanceStatus::Completed ||
                instance.completed_at.map_or(true, |ts| ts >= cutoff)
        });
        let removed = len - self.instances.len();
        log::debug!("removed {removed} completed instance(s) older than {cutoff}");
        removed
    }

    pub fn export_state(&self) -> WorkflowState {
        WorkflowState {
            instances: self.instances.values().cloned().collect(),
            last_instance_seq: self.idgen.last(),
            pending: self.queue.iter().cloned().collect(),
        }
    }

    /// Replaces the instances and the queued transitions, then drives
    /// the queue if automatic driving is enabled.
    pub fn import_state(&mut self, state: WorkflowState) {
        self.instances = state.instances.into_iter()
            .map(|instance| (instance.id.clone(), instance))
            .collect();
        self.idgen.resume(state.last_instance_seq);
        self.queue = state.pending.into();
        log::debug!(
            "imported {} instance(s) with {} pending transition(s)",
            self.instances.len(),
            self.queue.len(),
        );
        if self.auto_drive {
            self.run_until_idle();
        }
    }
}
