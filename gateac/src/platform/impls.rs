use gatecore::{
    Context,
    snapshot::Snapshot,
    traits::StateBackend,
    workflow::WorkflowInstance,
};
use std::time::Duration;

use super::*;

impl Platform {
    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut PermissionManager {
        &mut self.permissions
    }

    pub fn workflows(&self) -> &WorkflowManager {
        &self.workflows
    }

    pub fn workflows_mut(&mut self) -> &mut WorkflowManager {
        &mut self.workflows
    }

    pub fn workflow_gate(&self) -> Option<&WorkflowGate> {
        self.workflow_gate.as_ref()
    }

    pub fn into_shared(self) -> SharedPlatform {
        Arc::new(Mutex::new(self))
    }
}

// Enforcement

impl Platform {
    pub fn can(
        &mut self,
        user_id: &str,
        resource: &str,
        action: &str,
        context: Option<&Context>,
    ) -> bool {
        self.permissions.can(user_id, resource, action, context)
    }

    // Unknown instances pass through so the workflow manager reports
    // them.
    fn authorize(&mut self, instance_id: &str, user_id: &str) -> Result<(), Error> {
        let Some(gate) = &self.workflow_gate else {
            return Ok(());
        };
        let Some(instance) = self.workflows.get_instance(instance_id) else {
            return Ok(());
        };
        if self.permissions.can(user_id, &gate.resource, &gate.action, Some(&instance.data)) {
            Ok(())
        } else {
            Err(Error::Forbidden {
                user_id: user_id.to_string(),
                resource: gate.resource.clone(),
                action: gate.action.clone(),
            })
        }
    }
}

// Workflow decisions

impl Platform {
    pub fn start_workflow(
        &mut self,
        workflow_id: &str,
        data: Context,
        created_by: &str,
    ) -> Result<String, Error> {
        Ok(self.workflows.start_workflow(workflow_id, data, created_by)?)
    }

    pub fn approve_step(
        &mut self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
        comment: Option<&str>,
    ) -> Result<(), Error> {
        self.authorize(instance_id, user_id)?;
        Ok(self.workflows.approve_step(instance_id, step_id, user_id, comment)?)
    }

    pub fn reject_step(
        &mut self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
        comment: Option<&str>,
    ) -> Result<(), Error> {
        self.authorize(instance_id, user_id)?;
        Ok(self.workflows.reject_step(instance_id, step_id, user_id, comment)?)
    }

    pub fn complete_task(
        &mut self,
        instance_id: &str,
        step_id: &str,
        user_id: &str,
        comment: Option<&str>,
    ) -> Result<(), Error> {
        self.authorize(instance_id, user_id)?;
        Ok(self.workflows.complete_task(instance_id, step_id, user_id, comment)?)
    }

    pub fn cancel_instance(
        &mut self,
        instance_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), Error> {
        Ok(self.workflows.cancel_instance(instance_id, user_id, reason)?)
    }

    pub fn get_instance(&self, instance_id: &str) -> Option<&WorkflowInstance> {
        self.workflows.get_instance(instance_id)
    }

    pub fn expire_overdue(&mut self, now: i64) -> Vec<String> {
        self.workflows.expire_overdue(now)
    }

    /// Drop audit records and completed instances older than `max_age`,
    /// returning the respective numbers removed.
    pub fn cleanup(&mut self, max_age: Duration) -> (usize, usize) {
        (
            self.permissions.cleanup(max_age),
            self.workflows.cleanup(max_age),
        )
    }
}

// State

impl Platform {
    pub fn export_state(&self) -> Snapshot {
        Snapshot {
            access: self.permissions.export_state(),
            workflow: self.workflows.export_state(),
        }
    }

    pub fn import_state(&mut self, snapshot: Snapshot) {
        self.permissions.import_state(snapshot.access);
        self.workflows.import_state(snapshot.workflow);
    }

    /// Import the state saved in the backend, returning false if there
    /// was none.
    pub async fn load(&mut self, backend: &impl StateBackend) -> Result<bool, Error> {
        match backend.load().await? {
            Some(snapshot) => {
                self.import_state(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn save(&self, backend: &impl StateBackend) -> Result<(), Error> {
        Ok(backend.save(&self.export_state()).await?)
    }
}
