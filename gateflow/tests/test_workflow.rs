use gatecore::{
    Context,
    error::RuleError,
    permission::{
        Condition,
        Operator,
    },
    workflow::{
        Action,
        AssigneeKind,
        HistoryAction,
        InstanceStatus,
        Step,
        StepKind,
        Trigger,
        TriggerEvent,
        WorkflowDefinition,
    },
};
use gateflow::{
    Builder,
    DirectoryResolver,
    WorkflowManager,
    error::Error,
};
use serde_json::{
    Value,
    json,
};
use std::time::Duration;
use test_gate::{
    chrono::ManualClock,
    context,
    dispatch::MockDispatcher,
    is_send_sync,
};

fn seeded(clock: &ManualClock) -> anyhow::Result<WorkflowManager> {
    Ok(Builder::new()
        .ts_source(clock.source())
        .build()?)
}

fn actions(manager: &WorkflowManager, id: &str) -> Vec<(String, HistoryAction)> {
    manager.get_instance(id)
        .map(|instance| instance.history.iter()
            .map(|item| (item.step_id.clone(), item.action))
            .collect())
        .unwrap_or_default()
}

#[test]
fn send_sync() -> anyhow::Result<()> {
    let manager = seeded(&ManualClock::new(0))?;
    assert!(is_send_sync(&manager));
    Ok(())
}

#[test]
fn budget_below_threshold() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let id = manager.start_workflow("budget_approval", context(json!({"amount": 50000})), "u1")?;

    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(instance.completed_at, Some(1000));
    assert_eq!(instance.current_step, 4);
    assert!(instance.assignees.is_empty());
    assert_eq!(instance.data.get("status"), Some(&json!("approved")));
    assert_eq!(actions(&manager, &id), [
        ("validate".to_string(), HistoryAction::Started),
        ("validate".to_string(), HistoryAction::Completed),
        ("admin_approval".to_string(), HistoryAction::Started),
        ("admin_approval".to_string(), HistoryAction::Skipped),
        ("notify".to_string(), HistoryAction::Started),
        ("notify".to_string(), HistoryAction::Completed),
        ("finalize".to_string(), HistoryAction::Started),
        ("finalize".to_string(), HistoryAction::Completed),
    ]);
    assert!(manager.get_instances_by_user("admin").is_empty());
    Ok(())
}

#[test]
fn budget_above_threshold() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let id = manager.start_workflow("budget_approval", context(json!({"amount": 150000})), "u1")?;

    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Running);
    assert_eq!(instance.current_step, 1);
    assert_eq!(instance.assignee("admin_approval"), Some("admin"));
    assert_eq!(instance.data.get("status"), Some(&json!("pending_approval")));
    assert_eq!(manager.get_instances_by_user("admin").len(), 1);
    assert!(manager.get_instances_by_user("u1").is_empty());

    clock.advance(60);
    manager.approve_step(&id, "admin_approval", "admin", Some("looks fine"))?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(instance.completed_at, Some(1060));
    let approval = instance.history.iter()
        .find(|item| item.action == HistoryAction::Approved)
        .expect("approval recorded");
    assert_eq!(approval.user_id.as_deref(), Some("admin"));
    assert_eq!(approval.comment.as_deref(), Some("looks fine"));
    assert!(manager.get_instances_by_user("admin").is_empty());

    assert_eq!(
        manager.approve_step(&id, "admin_approval", "admin", None),
        Err(Error::NotRunning(id.clone())),
    );
    Ok(())
}

#[test]
fn non_assignee_approval() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let id = manager.start_workflow("budget_approval", context(json!({"amount": 150000})), "u1")?;
    let before = manager.get_instance(&id).cloned().expect("instance exists");

    assert_eq!(
        manager.approve_step(&id, "admin_approval", "u1", None),
        Err(Error::NotAssignee {
            step_id: "admin_approval".to_string(),
            user_id: "u1".to_string(),
        }),
    );
    assert_eq!(
        manager.reject_step(&id, "admin_approval", "u1", None),
        Err(Error::NotAssignee {
            step_id: "admin_approval".to_string(),
            user_id: "u1".to_string(),
        }),
    );
    assert_eq!(
        manager.approve_step(&id, "nope", "admin", None),
        Err(Error::StepNotFound("nope".to_string())),
    );
    assert_eq!(
        manager.approve_step("wfi-missing", "admin_approval", "admin", None),
        Err(Error::InstanceNotFound("wfi-missing".to_string())),
    );
    assert_eq!(manager.get_instance(&id), Some(&before));
    Ok(())
}

#[test]
fn rejection_is_terminal() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let id = manager.start_workflow("franchisee_onboarding", Context::new(), "u1")?;
    assert_eq!(
        manager.get_instance(&id).map(|instance| instance.current_step),
        Some(1),
    );

    manager.reject_step(&id, "document_review", "admin", Some("documents missing"))?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Failed);
    assert_eq!(instance.current_step, 1);
    assert_eq!(instance.data.get("status"), Some(&json!("account_created")));
    let last = instance.history.last().expect("history recorded");
    assert_eq!(last.action, HistoryAction::Rejected);
    assert_eq!(last.comment.as_deref(), Some("documents missing"));

    let history_len = instance.history.len();
    assert_eq!(
        manager.approve_step(&id, "document_review", "admin", None),
        Err(Error::NotRunning(id.clone())),
    );
    assert_eq!(manager.pending(), 0);
    assert_eq!(actions(&manager, &id).len(), history_len);
    Ok(())
}

#[test]
fn manual_tasks() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = Builder::default()
        .ts_source(clock.source())
        .workflow(WorkflowDefinition::new("fitout", "Restaurant fit-out")
            .step(Step::new("inspect", StepKind::Task)
                .assignee(AssigneeKind::User, "inspector"))
            .step(Step::new("sign_off", StepKind::Approval)
                .assignee(AssigneeKind::User, "admin")))
        .build()?;
    let id = manager.start_workflow("fitout", Context::new(), "u1")?;
    assert_eq!(manager.get_instance(&id).map(|i| i.current_step), Some(0));

    assert_eq!(
        manager.complete_task(&id, "inspect", "admin", None),
        Err(Error::NotAssignee {
            step_id: "inspect".to_string(),
            user_id: "admin".to_string(),
        }),
    );
    manager.complete_task(&id, "inspect", "inspector", Some("all good"))?;
    assert_eq!(manager.get_instance(&id).map(|i| i.current_step), Some(1));
    assert_eq!(
        manager.complete_task(&id, "sign_off", "admin", None),
        Err(Error::StepNotBlocking("sign_off".to_string())),
    );
    manager.approve_step(&id, "sign_off", "admin", None)?;
    assert_eq!(
        manager.get_instance(&id).map(|i| i.status),
        Some(InstanceStatus::Completed),
    );
    Ok(())
}

#[test]
fn decided_steps() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = Builder::default()
        .ts_source(clock.source())
        .workflow(WorkflowDefinition::new("lease", "Lease renewal")
            .step(Step::new("review", StepKind::Approval)
                .assignee(AssigneeKind::User, "manager"))
            .step(Step::new("sign", StepKind::Approval)
                .assignee(AssigneeKind::User, "admin")
                .action(Action::update_field("signatures", 1))))
        .build()?;
    let id = manager.start_workflow("lease", Context::new(), "u1")?;
    assert_eq!(manager.get_instances_by_user("manager").len(), 1);
    assert!(manager.get_instances_by_user("admin").is_empty());

    manager.approve_step(&id, "review", "manager", None)?;
    assert!(manager.get_instances_by_user("manager").is_empty());
    assert_eq!(manager.get_instances_by_user("admin").len(), 1);

    assert_eq!(
        manager.approve_step(&id, "review", "manager", None),
        Err(Error::StepDecided("review".to_string())),
    );
    assert_eq!(
        manager.reject_step(&id, "review", "manager", None),
        Err(Error::StepDecided("review".to_string())),
    );
    assert_eq!(actions(&manager, &id), [
        ("review".to_string(), HistoryAction::Started),
        ("review".to_string(), HistoryAction::Approved),
        ("sign".to_string(), HistoryAction::Started),
    ]);

    manager.approve_step(&id, "sign", "admin", None)?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(instance.data.get("signatures"), Some(&json!(1)));
    assert!(manager.get_instances_by_user("admin").is_empty());
    Ok(())
}

#[test]
fn cancel_instance() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let id = manager.start_workflow("budget_approval", context(json!({"amount": 150000})), "u1")?;
    manager.cancel_instance(&id, "super", Some("duplicate submission"))?;

    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Failed);
    let last = instance.history.last().expect("history recorded");
    assert_eq!(last.step_id, "admin_approval");
    assert_eq!(last.action, HistoryAction::Rejected);
    assert_eq!(last.user_id.as_deref(), Some("super"));
    assert_eq!(
        manager.cancel_instance(&id, "super", None),
        Err(Error::NotRunning(id.clone())),
    );
    Ok(())
}

#[test]
fn role_assignees() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = Builder::new()
        .ts_source(clock.source())
        .resolver(DirectoryResolver::new().role_member("manager", "m1"))
        .build()?;
    let id = manager.start_workflow("valuation_review", Context::new(), "u1")?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.assignee("manager_review"), Some("m1"));
    assert_eq!(manager.get_instances_by_user("m1").len(), 1);

    // without a member the step stalls with nobody assigned
    let mut manager = seeded(&clock)?;
    let id = manager.start_workflow("valuation_review", Context::new(), "u1")?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Running);
    assert_eq!(instance.current_step, 1);
    assert!(instance.assignees.is_empty());
    Ok(())
}

#[test]
fn timeouts() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let late = manager.start_workflow("budget_approval", context(json!({"amount": 150000})), "u1")?;
    clock.advance(86_400);
    let recent = manager.start_workflow("budget_approval", context(json!({"amount": 150000})), "u2")?;
    let done = manager.start_workflow("budget_approval", context(json!({"amount": 1})), "u3")?;

    let deadline = 1000 + 3 * 86_400;
    assert!(manager.expire_overdue(deadline - 1).is_empty());
    assert_eq!(manager.expire_overdue(deadline), [late.clone()]);
    assert!(manager.expire_overdue(deadline).is_empty());

    let instance = manager.get_instance(&late).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Failed);
    let last = instance.history.last().expect("history recorded");
    assert_eq!(last.action, HistoryAction::Rejected);
    assert_eq!(last.comment.as_deref(), Some("timed out"));
    assert_eq!(last.timestamp, deadline);

    assert_eq!(manager.get_instance(&recent).map(|i| i.status), Some(InstanceStatus::Running));
    assert_eq!(manager.get_instance(&done).map(|i| i.status), Some(InstanceStatus::Completed));
    Ok(())
}

#[test]
fn triggers() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;

    let started = manager.fire_event(
        TriggerEvent::OnCreate,
        "budgets",
        &context(json!({"amount": 10})),
        "u1",
    );
    assert_eq!(started.len(), 1);
    assert_eq!(
        manager.get_instance(&started[0]).map(|i| i.workflow_id.as_str()),
        Some("budget_approval"),
    );

    let draft = context(json!({"status": "draft"}));
    let submitted = context(json!({"status": "submitted"}));
    assert!(manager.fire_event(TriggerEvent::OnUpdate, "valuations", &draft, "u1").is_empty());
    assert_eq!(manager.fire_event(TriggerEvent::OnUpdate, "valuations", &submitted, "u1").len(), 1);
    assert!(manager.fire_event(TriggerEvent::OnDelete, "budgets", &draft, "u1").is_empty());

    manager.set_workflow_enabled("budget_approval", false)?;
    assert!(manager.fire_event(
        TriggerEvent::OnCreate,
        "budgets",
        &context(json!({"amount": 10})),
        "u1",
    ).is_empty());
    assert_eq!(manager.get_all_instances().len(), 2);
    Ok(())
}

#[test]
fn cleanup_completed() -> anyhow::Result<()> {
    let clock = ManualClock::new(1000);
    let mut manager = seeded(&clock)?;
    let old = manager.start_workflow("budget_approval", context(json!({"amount": 1})), "u1")?;
    let running = manager.start_workflow("budget_approval", context(json!({"amount": 150000})), "u1")?;
    let failed = manager.start_workflow("franchisee_onboarding", Context::new(), "u1")?;
    manager.reject_step(&failed, "document_review", "admin", None)?;
    clock.set_timestamp(5000);
    let recent = manager.start_workflow("budget_approval", context(json!({"amount": 1})), "u1")?;
    let kept = manager.get_instance(&recent).cloned();

    clock.set_timestamp(6000);
    assert_eq!(manager.cleanup(Duration::from_secs(3600)), 1);
    assert!(manager.get_instance(&old).is_none());
    assert!(manager.get_instance(&running).is_some());
    assert!(manager.get_instance(&failed).is_some());
    assert_eq!(manager.get_instance(&recent).cloned(), kept);
    assert_eq!(
        manager.get_all_instances().iter()
            .map(|instance| instance.id.as_str())
            .collect::<Vec<_>>(),
        [running.as_str(), failed.as_str(), recent.as_str()],
    );
    Ok(())
}

#[test]
fn dispatched_actions() -> anyhow::Result<()> {
    let mut dispatcher = MockDispatcher::new();
    dispatcher.expect_send_notification()
        .withf(|instance, target, value| {
            instance.workflow_id == "budget_approval" &&
            target == "u1" &&
            value == &json!("Your budget has been processed")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    let mut manager = Builder::new()
        .dispatcher(dispatcher)
        .build()?;
    let id = manager.start_workflow("budget_approval", context(json!({"amount": 1})), "u1")?;
    assert_eq!(
        manager.get_instance(&id).map(|i| i.status),
        Some(InstanceStatus::Completed),
    );
    Ok(())
}

#[test]
fn custom_rules_and_actions() -> anyhow::Result<()> {
    let mut manager = Builder::default()
        .rule("weekday", |context, _| Ok(context.get("day")
            .and_then(Value::as_str)
            .map(|day| !matches!(day, "sat" | "sun"))
            .unwrap_or(false)))
        .action("stamp", |data, target, value| {
            if data.contains_key(target) {
                return Err(RuleError::Failed(format!("{target} already set")));
            }
            data.insert(target.to_string(), value.clone());
            Ok(())
        })
        .workflow(WorkflowDefinition::new("shift", "Shift")
            .step(Step::new("weekday", StepKind::Action)
                .condition(Condition::custom("weekday"))
                .action(Action::custom("stamp", "stamped", "{{user.id}}")))
            .step(Step::new("always", StepKind::Action)
                .action(Action::custom("stamp", "stamped", "again"))
                .action(Action::update_field("done", true)))
            .step(Step::new("large", StepKind::Condition)
                .condition(Condition::field("count", Operator::GreaterThan, 3))))
        .build()?;

    let id = manager.start_workflow("shift", context(json!({"day": "mon"})), "u1")?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(Value::Object(instance.data.clone()), json!({
        "day": "mon",
        "stamped": "u1",
        "done": true,
    }));

    let id = manager.start_workflow("shift", context(json!({"day": "sun"})), "u2")?;
    let instance = manager.get_instance(&id).expect("instance exists");
    assert_eq!(instance.data.get("stamped"), Some(&json!("again")));
    assert_eq!(actions(&manager, &id)[1], ("weekday".to_string(), HistoryAction::Skipped));
    Ok(())
}

#[test]
fn trigger_serde() -> anyhow::Result<()> {
    let trigger: Trigger = serde_json::from_value(json!({
        "event": "on_update",
        "resource": "valuations",
        "conditions": [{
            "type": "field",
            "field": "status",
            "operator": "equals",
            "value": "submitted",
        }],
    }))?;
    assert_eq!(trigger, Trigger::new(TriggerEvent::OnUpdate, "valuations")
        .condition(Condition::field("status", Operator::Equals, "submitted")));
    Ok(())
}
