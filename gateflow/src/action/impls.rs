use gatecore::{
    error::DispatchError,
    workflow::{
        Action,
        ActionKind,
        WorkflowInstance,
    },
};
use gaterbac::Subject;
use std::fmt;

use super::*;

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        action: impl Fn(&mut Context, &str, &Value) -> Result<(), RuleError>
            + Send + Sync + 'static,
    ) {
        self.0.insert(name.into(), Arc::new(action));
    }

    pub fn call(
        &self,
        name: &str,
        data: &mut Context,
        target: &str,
        value: &Value,
    ) -> Result<(), RuleError> {
        let action = self.0.get(name)
            .ok_or_else(|| RuleError::Unregistered(name.to_string()))?;
        action(data, target, value)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = self.0.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_tuple("ActionRegistry").field(&names).finish()
    }
}

impl Dispatcher for LogDispatcher {
    fn send_notification(
        &self,
        instance: &WorkflowInstance,
        target: &str,
        value: &Value,
    ) -> Result<(), DispatchError> {
        require_target(target)?;
        log::info!("instance {}: notify {target}: {value}", instance.id);
        Ok(())
    }

    fn call_api(
        &self,
        instance: &WorkflowInstance,
        target: &str,
        value: &Value,
    ) -> Result<(), DispatchError> {
        require_target(target)?;
        log::info!("instance {}: call {target}: {value}", instance.id);
        Ok(())
    }

    fn create_record(
        &self,
        instance: &WorkflowInstance,
        target: &str,
        value: &Value,
    ) -> Result<(), DispatchError> {
        require_target(target)?;
        log::info!("instance {}: create {target}: {value}", instance.id);
        Ok(())
    }
}

fn require_target(target: &str) -> Result<(), DispatchError> {
    match target.trim() {
        "" => Err(DispatchError::Rejected("empty target".to_string())),
        _ => Ok(()),
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(ActionRegistry::default(), Arc::new(LogDispatcher))
    }
}

impl fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl ActionExecutor {
    pub fn new(actions: ActionRegistry, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { actions, dispatcher }
    }

    /// Run the actions in order.  The `{{user.id}}` token within the
    /// targets and values refers to the creator of the instance.
    pub fn execute(&self, actions: &[Action], instance: &mut WorkflowInstance) {
        for action in actions.iter() {
            let created_by = instance.created_by.clone();
            let subject = Subject::new(&created_by);
            let target = substitute_target(&subject, &action.target);
            let value = subject.substitute(&action.value);
            let result = match action.kind {
                ActionKind::UpdateField => {
                    set_field(&mut instance.data, &target, value);
                    Ok(())
                }
                ActionKind::SendNotification => self.dispatcher
                    .send_notification(instance, &target, &value)
                    .map_err(|e| e.to_string()),
                ActionKind::CallApi => self.dispatcher
                    .call_api(instance, &target, &value)
                    .map_err(|e| e.to_string()),
                ActionKind::CreateRecord => self.dispatcher
                    .create_record(instance, &target, &value)
                    .map_err(|e| e.to_string()),
                ActionKind::Custom => match action.custom_function.as_deref() {
                    Some(name) => self.actions
                        .call(name, &mut instance.data, &target, &value)
                        .map_err(|e| e.to_string()),
                    None => Err("custom action without a function name".to_string()),
                },
                _ => Err("unsupported action".to_string()),
            };
            if let Err(e) = result {
                log::warn!(
                    "instance {}: {} action on {:?} skipped: {e}",
                    instance.id, action.kind, target,
                );
            }
        }
    }
}

fn substitute_target(subject: &Subject, target: &str) -> String {
    match subject.substitute(&Value::from(target)) {
        Value::String(s) => s,
        _ => target.to_string(),
    }
}

/// Assign the value at the dotted path, creating intermediate objects
/// as required.  Paths running through a non-object are left alone.
pub fn set_field(data: &mut Context, path: &str, value: Value) {
    let mut segments = path.split('.').collect::<Vec<_>>();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut current = data;
    for segment in segments.into_iter() {
        let entry = current.entry(segment.to_string())
            .or_insert_with(|| Value::Object(Context::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => {
                log::warn!("cannot assign {path:?} through a non-object at {segment:?}");
                return;
            }
        };
    }
    current.insert(last.to_string(), value);
}

#[cfg(test)]
mod test {
    use gatecore::workflow::Action;
    use serde_json::json;
    use test_gate::{
        context,
        dispatch::MockDispatcher,
    };
    use super::*;

    fn instance() -> WorkflowInstance {
        WorkflowInstance::new("wfi-1", "wf", context(json!({"amount": 10})), "u1", 0)
    }

    #[test]
    fn nested_fields() {
        let mut data = context(json!({"status": "new", "flat": 1}));
        set_field(&mut data, "status", json!("done"));
        set_field(&mut data, "meta.reviewer.id", json!("u1"));
        set_field(&mut data, "flat.inner", json!(2));
        assert_eq!(Value::Object(data), json!({
            "status": "done",
            "flat": 1,
            "meta": {"reviewer": {"id": "u1"}},
        }));
    }

    #[test]
    fn execute_in_order() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send_notification()
            .withf(|instance, target, value| {
                instance.data.get("status") == Some(&json!("notified")) &&
                target == "owner" &&
                value == &json!("hello u1")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        dispatcher.expect_call_api()
            .times(1)
            .returning(|_, _, _| Err(DispatchError::Unavailable));
        dispatcher.expect_create_record()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut actions = ActionRegistry::new();
        actions.register("double", |data, target, _| {
            let amount = data.get(target)
                .and_then(Value::as_i64)
                .ok_or_else(|| RuleError::Missing(target.to_string()))?;
            data.insert(target.to_string(), json!(amount * 2));
            Ok(())
        });
        let executor = ActionExecutor::new(actions, Arc::new(dispatcher));

        let mut instance = instance();
        executor.execute(&[
            Action::update_field("status", "notified"),
            Action::send_notification("owner", "hello {{user.id}}"),
            Action::call_api("/api/ping", json!({})),
            Action::custom("double", "amount", Value::Null),
            Action::custom("double", "missing", Value::Null),
            Action::custom("unregistered", "amount", Value::Null),
            Action::create_record("audit", json!({"by": "{{user.id}}"})),
        ], &mut instance);
        assert_eq!(instance.data.get("amount"), Some(&json!(20)));
        assert!(instance.data.get("missing").is_none());
    }

    #[test]
    fn log_dispatcher_targets() {
        let instance = instance();
        assert_eq!(
            LogDispatcher.send_notification(&instance, "u1", &json!("hi")),
            Ok(()),
        );
        assert_eq!(
            LogDispatcher.call_api(&instance, " ", &Value::Null),
            Err(DispatchError::Rejected("empty target".to_string())),
        );
        assert_eq!(
            LogDispatcher.create_record(&instance, "", &Value::Null),
            Err(DispatchError::Rejected("empty target".to_string())),
        );
    }

    #[test]
    fn creator_targets() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send_notification()
            .withf(|_, target, value| target == "u1" && value == &json!("processed"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        dispatcher.expect_create_record()
            .withf(|_, target, _| target == "inbox/u1")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let executor = ActionExecutor::new(ActionRegistry::new(), Arc::new(dispatcher));

        let mut instance = instance();
        executor.execute(&[
            Action::send_notification("{{user.id}}", "processed"),
            Action::create_record("inbox/{{user.id}}", json!({})),
            Action::update_field("by_{{user.id}}", true),
        ], &mut instance);
        assert_eq!(instance.data.get("by_u1"), Some(&json!(true)));
    }
}
