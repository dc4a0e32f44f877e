//! The built-in workflow definitions.

use gatecore::{
    permission::{
        Condition,
        Operator,
    },
    workflow::{
        Action,
        AssigneeKind,
        Step,
        StepKind,
        Trigger,
        TriggerEvent,
        WorkflowDefinition,
    },
};

/// Budgets above this amount require an administrator's approval.
pub const BUDGET_APPROVAL_THRESHOLD: i64 = 100_000;

const DAY: u64 = 86_400;

pub fn budget_approval() -> WorkflowDefinition {
    WorkflowDefinition::new("budget_approval", "Budget Approval")
        .description("Validation and approval of submitted budgets")
        .step(Step::new("validate", StepKind::Action)
            .name("Validate budget")
            .action(Action::update_field("status", "validating")))
        .step(Step::new("admin_approval", StepKind::Approval)
            .name("Administrator approval")
            .assignee(AssigneeKind::User, "admin")
            .condition(Condition::field(
                "amount",
                Operator::GreaterThan,
                BUDGET_APPROVAL_THRESHOLD,
            ))
            .action(Action::update_field("status", "pending_approval"))
            .timeout(3 * DAY))
        .step(Step::new("notify", StepKind::Notification)
            .name("Notify submitter")
            .action(Action::send_notification(
                "{{user.id}}",
                "Your budget has been processed",
            )))
        .step(Step::new("finalize", StepKind::Action)
            .name("Finalize budget")
            .action(Action::update_field("status", "approved")))
        .trigger(Trigger::new(TriggerEvent::OnCreate, "budgets"))
}

pub fn franchisee_onboarding() -> WorkflowDefinition {
    WorkflowDefinition::new("franchisee_onboarding", "Franchisee Onboarding")
        .description("Account set up and document review for new franchisees")
        .step(Step::new("create_account", StepKind::Action)
            .name("Create account")
            .action(Action::create_record("users", serde_json::json!({
                "role": "franchisee",
                "invited_by": "{{user.id}}",
            })))
            .action(Action::update_field("status", "account_created")))
        .step(Step::new("document_review", StepKind::Approval)
            .name("Document review")
            .assignee(AssigneeKind::User, "admin")
            .timeout(7 * DAY))
        .step(Step::new("welcome", StepKind::Notification)
            .name("Welcome notification")
            .action(Action::send_notification("franchisee", "Welcome aboard")))
        .step(Step::new("activate", StepKind::Action)
            .name("Activate account")
            .action(Action::update_field("status", "active")))
        .trigger(Trigger::new(TriggerEvent::OnCreate, "franchisees"))
}

pub fn valuation_review() -> WorkflowDefinition {
    WorkflowDefinition::new("valuation_review", "Valuation Review")
        .description("Manager review of restaurant valuations before publication")
        .step(Step::new("request", StepKind::Task)
            .name("Request review")
            .action(Action::update_field("status", "in_review")))
        .step(Step::new("manager_review", StepKind::Approval)
            .name("Manager review")
            .assignee(AssigneeKind::Role, "manager")
            .timeout(5 * DAY))
        .step(Step::new("publish", StepKind::Action)
            .name("Publish valuation")
            .action(Action::update_field("status", "published"))
            .action(Action::send_notification("{{user.id}}", "Valuation published")))
        .trigger(Trigger::new(TriggerEvent::OnUpdate, "valuations")
            .condition(Condition::field("status", Operator::Equals, "submitted")))
}

pub fn default_workflows() -> Vec<WorkflowDefinition> {
    vec![
        budget_approval(),
        franchisee_onboarding(),
        valuation_review(),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn workflows() {
        let workflows = default_workflows();
        assert_eq!(
            workflows.iter()
                .map(|workflow| workflow.id.as_str())
                .collect::<Vec<_>>(),
            ["budget_approval", "franchisee_onboarding", "valuation_review"],
        );
        assert!(workflows.iter().all(|workflow| workflow.enabled));
        let budget = &workflows[0];
        assert_eq!(budget.step_index("admin_approval"), Some(1));
        assert!(budget.steps[1].is_blocking());
        assert!(!budget.steps[0].is_blocking());
        assert_eq!(workflows[2].steps[1].assignee_type, AssigneeKind::Role);
    }
}
