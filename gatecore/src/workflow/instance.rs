use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use crate::Context;

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    #[default]
    Running,
    Completed,
    Failed,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Started,
    Skipped,
    Completed,
    Approved,
    Rejected,
}

/// One execution of a workflow against a business record.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub workflow_id: String,
    pub status: InstanceStatus,
    /// Index of the step being executed; equals the number of steps
    /// once the instance has run to completion.
    pub current_step: usize,
    pub data: Context,
    /// Step id to the actor responsible for resolving that step.
    pub assignees: BTreeMap<String, String>,
    pub history: Vec<HistoryItem>,
    pub created_by: String,
    pub started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

/// A queued request to execute the step at `step_index` of an instance.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transition {
    pub instance_id: String,
    pub step_index: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HistoryItem {
    pub step_id: String,
    pub action: HistoryAction,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl WorkflowInstance {
    pub fn new(
        id: impl Into<String>,
        workflow_id: impl Into<String>,
        data: Context,
        created_by: impl Into<String>,
        started_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            status: InstanceStatus::Running,
            current_step: 0,
            data,
            assignees: BTreeMap::new(),
            history: Vec::new(),
            created_by: created_by.into(),
            started_at,
            completed_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == InstanceStatus::Running
    }

    pub fn assignee(&self, step_id: &str) -> Option<&str> {
        self.assignees.get(step_id).map(String::as_str)
    }

    /// Whether the most recent entry for the step records a decision,
    /// i.e. the step was approved or completed since it last started.
    pub fn is_step_decided(&self, step_id: &str) -> bool {
        self.history.iter()
            .rev()
            .find(|item| item.step_id == step_id)
            .is_some_and(|item| matches!(
                item.action,
                HistoryAction::Approved | HistoryAction::Completed,
            ))
    }

    /// Timestamp of the most recent `started` entry for the step.
    pub fn step_started_at(&self, step_id: &str) -> Option<i64> {
        self.history.iter()
            .rev()
            .find(|item| item.step_id == step_id && item.action == HistoryAction::Started)
            .map(|item| item.timestamp)
    }

    pub fn push_history(&mut self, item: HistoryItem) {
        log::trace!(
            "instance {} step {} {}",
            self.id, item.step_id, item.action,
        );
        self.history.push(item);
    }
}

impl Transition {
    pub fn new(instance_id: impl Into<String>, step_index: usize) -> Self {
        Self {
            instance_id: instance_id.into(),
            step_index,
        }
    }
}

impl HistoryItem {
    pub fn new(
        step_id: impl Into<String>,
        action: HistoryAction,
        timestamp: i64,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            action,
            timestamp,
            user_id: None,
            comment: None,
            data: None,
        }
    }

    pub fn user_id(mut self, val: impl Into<String>) -> Self {
        self.user_id = Some(val.into());
        self
    }

    pub fn comment(mut self, val: Option<impl Into<String>>) -> Self {
        self.comment = val.map(Into::into);
        self
    }

    pub fn data(mut self, val: Value) -> Self {
        self.data = Some(val);
        self
    }
}
