use clap::{
    Parser,
    Subcommand,
};
use gatecore::{
    Context,
    audit::CheckFilter,
    traits::StateBackend,
    workflow::WorkflowInstance,
};
use gateac::{
    JsonFileBackend,
    Platform,
    platform::Builder as PlatformBuilder,
};
use gateflow::{
    Builder as FlowBuilder,
    DirectoryResolver,
};
use std::{
    path::PathBuf,
    time::Duration,
};

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// JSON file holding the assignments, audit log and instances
    #[clap(long, value_name = "GATEAC_STATE", env = "GATEAC_STATE", default_value = "gateac.json")]
    state: PathBuf,
    /// Permission required for workflow decisions, as resource.action
    #[clap(long, value_name = "GATEAC_WORKFLOW_GATE", env = "GATEAC_WORKFLOW_GATE")]
    workflow_gate: Option<String>,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check whether the user may perform the action on the resource
    #[command(arg_required_else_help = true)]
    Check {
        user: String,
        resource: String,
        action: String,
        /// JSON object to evaluate the conditions against
        #[arg(long)]
        context: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Role {
        #[command(subcommand)]
        cmd: GrantCmd,
    },
    #[command(arg_required_else_help = true)]
    Permission {
        #[command(subcommand)]
        cmd: GrantCmd,
    },
    /// List the effective permissions of the user
    #[command(arg_required_else_help = true)]
    Effective {
        user: String,
    },
    #[command(arg_required_else_help = true)]
    Workflow {
        #[command(subcommand)]
        cmd: WorkflowCmd,
    },
    /// List the permission checks, newest first
    History {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        resource: Option<String>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        since: Option<i64>,
        #[arg(long)]
        until: Option<i64>,
    },
    /// Fail the instances blocked beyond their step timeout
    Sweep {
        /// Unix timestamp to sweep at; defaults to now
        #[arg(long)]
        now: Option<i64>,
    },
    /// Drop audit records and completed instances older than the given
    /// number of days
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
}

#[derive(Debug, Subcommand)]
enum GrantCmd {
    #[command(arg_required_else_help = true)]
    Grant {
        user: String,
        id: String,
    },
    #[command(arg_required_else_help = true)]
    Revoke {
        user: String,
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum WorkflowCmd {
    #[command(arg_required_else_help = true)]
    Start {
        workflow: String,
        user: String,
        /// JSON object of the business data
        #[arg(long)]
        data: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Approve {
        instance: String,
        step: String,
        user: String,
        #[arg(long)]
        comment: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Reject {
        instance: String,
        step: String,
        user: String,
        #[arg(long)]
        comment: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Complete {
        instance: String,
        step: String,
        user: String,
        #[arg(long)]
        comment: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Cancel {
        instance: String,
        user: String,
        #[arg(long)]
        reason: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Show {
        instance: String,
    },
    /// List instances; with a user only the running ones assigned to
    /// them
    List {
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .module("gateac")
        .module("gateflow")
        .module("gaterbac")
        .verbosity((args.verbose as usize) + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let backend = JsonFileBackend::new(args.state);
    let snapshot = backend.load().await?
        .unwrap_or_default();
    let mut builder = PlatformBuilder::new()
        .flow_builder(FlowBuilder::new()
            .resolver(DirectoryResolver::from_assignments(&snapshot.access.assignments)));
    if let Some(gate) = args.workflow_gate {
        let (resource, action) = gate.split_once('.')
            .ok_or_else(|| anyhow::anyhow!("workflow gate must be given as resource.action"))?;
        builder = builder.workflow_gate(resource, action);
    }
    let mut platform = builder.build()?;
    platform.import_state(snapshot);

    match args.command {
        Commands::Check { user, resource, action, context } => {
            let context = context.as_deref()
                .map(parse_object)
                .transpose()?;
            let result = platform.can(&user, &resource, &action, context.as_ref());
            println!("{}", if result { "permitted" } else { "denied" });
        }
        Commands::Role { cmd } => {
            parse_role(&mut platform, cmd)?;
        }
        Commands::Permission { cmd } => {
            parse_permission(&mut platform, cmd)?;
        }
        Commands::Effective { user } => {
            for permission in platform.permissions().get_effective_permissions(&user) {
                println!("{}\t{}", permission.id, permission.name);
            }
        }
        Commands::Workflow { cmd } => {
            parse_workflow(&mut platform, cmd)?;
        }
        Commands::History { user, resource, action, since, until } => {
            let mut filter = CheckFilter::new();
            if let Some(user) = user {
                filter = filter.user_id(user);
            }
            if let Some(resource) = resource {
                filter = filter.resource(resource);
            }
            if let Some(action) = action {
                filter = filter.action(action);
            }
            if since.is_some() || until.is_some() {
                filter = filter.date_range(since.unwrap_or(i64::MIN), until.unwrap_or(i64::MAX));
            }
            for check in platform.permissions().get_permission_check_history(&filter) {
                println!(
                    "{}\t{}\t{}.{}\t{}\t{}",
                    check.timestamp,
                    check.user_id,
                    check.resource,
                    check.action,
                    if check.result { "permitted" } else { "denied" },
                    check.reason.as_deref().unwrap_or_default(),
                );
            }
        }
        Commands::Sweep { now } => {
            let now = now.unwrap_or_else(gatecore::now);
            for id in platform.expire_overdue(now) {
                println!("instance {id} timed out");
            }
        }
        Commands::Cleanup { days } => {
            let (checks, instances) = platform.cleanup(Duration::from_secs(days * 86_400));
            println!("removed {checks} audit record(s) and {instances} completed instance(s)");
        }
    }

    platform.save(&backend).await?;
    Ok(())
}

fn parse_object(s: &str) -> anyhow::Result<Context> {
    match serde_json::from_str(s)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(anyhow::anyhow!("expected a JSON object")),
    }
}

fn parse_role(
    platform: &mut Platform,
    arg: GrantCmd,
) -> anyhow::Result<()> {
    match arg {
        GrantCmd::Grant { user, id } => {
            if platform.permissions_mut().assign_role(&user, &id)? {
                println!("role {id} granted to {user}");
            } else {
                println!("role {id} was already granted to {user}");
            }
        }
        GrantCmd::Revoke { user, id } => {
            if platform.permissions_mut().remove_role(&user, &id) {
                println!("role {id} revoked from {user}");
            } else {
                println!("{user} has no role {id} to be revoked");
            }
        }
    }
    Ok(())
}

fn parse_permission(
    platform: &mut Platform,
    arg: GrantCmd,
) -> anyhow::Result<()> {
    match arg {
        GrantCmd::Grant { user, id } => {
            if platform.permissions_mut().assign_permission(&user, &id)? {
                println!("permission {id} granted to {user}");
            } else {
                println!("permission {id} was already granted to {user}");
            }
        }
        GrantCmd::Revoke { user, id } => {
            if platform.permissions_mut().remove_permission(&user, &id) {
                println!("permission {id} revoked from {user}");
            } else {
                println!("{user} has no permission {id} to be revoked");
            }
        }
    }
    Ok(())
}

fn parse_workflow(
    platform: &mut Platform,
    arg: WorkflowCmd,
) -> anyhow::Result<()> {
    match arg {
        WorkflowCmd::Start { workflow, user, data } => {
            let data = data.as_deref()
                .map(parse_object)
                .transpose()?
                .unwrap_or_default();
            let id = platform.start_workflow(&workflow, data, &user)?;
            print_instance(platform.get_instance(&id));
        }
        WorkflowCmd::Approve { instance, step, user, comment } => {
            platform.approve_step(&instance, &step, &user, comment.as_deref())?;
            print_instance(platform.get_instance(&instance));
        }
        WorkflowCmd::Reject { instance, step, user, comment } => {
            platform.reject_step(&instance, &step, &user, comment.as_deref())?;
            print_instance(platform.get_instance(&instance));
        }
        WorkflowCmd::Complete { instance, step, user, comment } => {
            platform.complete_task(&instance, &step, &user, comment.as_deref())?;
            print_instance(platform.get_instance(&instance));
        }
        WorkflowCmd::Cancel { instance, user, reason } => {
            platform.cancel_instance(&instance, &user, reason.as_deref())?;
            print_instance(platform.get_instance(&instance));
        }
        WorkflowCmd::Show { instance } => {
            let instance = platform.get_instance(&instance)
                .ok_or_else(|| anyhow::anyhow!("no such instance: {instance}"))?;
            println!("{}", serde_json::to_string_pretty(instance)?);
        }
        WorkflowCmd::List { user } => {
            let instances = match user {
                Some(user) => platform.workflows().get_instances_by_user(&user),
                None => platform.workflows().get_all_instances(),
            };
            for instance in instances {
                print_instance(Some(instance));
            }
        }
    }
    Ok(())
}

fn print_instance(instance: Option<&WorkflowInstance>) {
    if let Some(instance) = instance {
        let step = instance.history.last()
            .map(|item| item.step_id.as_str())
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{step}\t{}",
            instance.id,
            instance.workflow_id,
            instance.status,
            instance.assignees.get(step).map(String::as_str).unwrap_or("-"),
        );
    }
}
