use serde_json::Value;
use std::{
    fmt,
    str::FromStr,
};
use crate::{
    error::ValueError,
    permission::Condition,
};
use super::*;

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            enabled: true,
            steps: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.description = val.into();
        self
    }

    pub fn enabled(mut self, val: bool) -> Self {
        self.enabled = val;
        self
    }

    pub fn step(mut self, val: Step) -> Self {
        self.steps.push(val);
        self
    }

    pub fn trigger(mut self, val: Trigger) -> Self {
        self.triggers.push(val);
        self
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == step_id)
    }
}

impl Trigger {
    pub fn new(event: TriggerEvent, resource: impl Into<String>) -> Self {
        Self {
            event,
            resource: resource.into(),
            conditions: Vec::new(),
        }
    }

    pub fn condition(mut self, val: Condition) -> Self {
        self.conditions.push(val);
        self
    }
}

impl Step {
    pub fn new(id: impl Into<String>, kind: StepKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            .. Default::default()
        }
    }

    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.name = val.into();
        self
    }

    pub fn assignee(mut self, kind: AssigneeKind, val: impl Into<String>) -> Self {
        self.assignee_type = kind;
        self.assignee = Some(val.into());
        self
    }

    pub fn condition(mut self, val: Condition) -> Self {
        self.conditions.push(val);
        self
    }

    pub fn action(mut self, val: Action) -> Self {
        self.actions.push(val);
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Whether the step halts the instance until an external decision.
    pub fn is_blocking(&self) -> bool {
        match self.kind {
            StepKind::Approval => true,
            StepKind::Task => self.assignee_type != AssigneeKind::Auto,
            _ => false,
        }
    }
}

impl Action {
    pub fn new(kind: ActionKind, target: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind,
            target: target.into(),
            value: value.into(),
            custom_function: None,
        }
    }

    pub fn update_field(target: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ActionKind::UpdateField, target, value)
    }

    pub fn send_notification(target: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ActionKind::SendNotification, target, value)
    }

    pub fn call_api(target: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ActionKind::CallApi, target, value)
    }

    pub fn create_record(target: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ActionKind::CreateRecord, target, value)
    }

    pub fn custom(
        name: impl Into<String>,
        target: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            custom_function: Some(name.into()),
            .. Self::new(ActionKind::Custom, target, value)
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            StepKind::Task => "task",
            StepKind::Approval => "approval",
            StepKind::Notification => "notification",
            StepKind::Condition => "condition",
            StepKind::Action => "action",
        })
    }
}

impl fmt::Display for AssigneeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            AssigneeKind::User => "user",
            AssigneeKind::Role => "role",
            AssigneeKind::Group => "group",
            AssigneeKind::Auto => "auto",
        })
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ActionKind::UpdateField => "update_field",
            ActionKind::SendNotification => "send_notification",
            ActionKind::CallApi => "call_api",
            ActionKind::CreateRecord => "create_record",
            ActionKind::Custom => "custom",
        })
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            HistoryAction::Started => "started",
            HistoryAction::Skipped => "skipped",
            HistoryAction::Completed => "completed",
            HistoryAction::Approved => "approved",
            HistoryAction::Rejected => "rejected",
        })
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(<&'static str>::from(*self))
    }
}

impl From<InstanceStatus> for &'static str {
    fn from(status: InstanceStatus) -> &'static str {
        match status {
            InstanceStatus::Running => "running",
            InstanceStatus::Completed => "completed",
            InstanceStatus::Failed => "failed",
        }
    }
}

impl FromStr for InstanceStatus {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "running" => Ok(InstanceStatus::Running),
            "completed" => Ok(InstanceStatus::Completed),
            "failed" => Ok(InstanceStatus::Failed),
            s => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(<&'static str>::from(*self))
    }
}

impl From<TriggerEvent> for &'static str {
    fn from(event: TriggerEvent) -> &'static str {
        match event {
            TriggerEvent::OnCreate => "on_create",
            TriggerEvent::OnUpdate => "on_update",
            TriggerEvent::OnDelete => "on_delete",
            TriggerEvent::Manual => "manual",
        }
    }
}

impl FromStr for TriggerEvent {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_create" => Ok(TriggerEvent::OnCreate),
            "on_update" => Ok(TriggerEvent::OnUpdate),
            "on_delete" => Ok(TriggerEvent::OnDelete),
            "manual" => Ok(TriggerEvent::Manual),
            s => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}
