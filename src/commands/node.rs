use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm as Prompt;
use topology::{Role, store};

use crate::Context;
use crate::app::App;
use crate::cli::{NodeArgs, NodeCommand};
use crate::ui;
use crate::workflow::{ChangeKind, ChangePlan, Confirm, NodeWorkflow, Outcome};

pub fn run(ctx: &Context, cmd: NodeCommand) -> Result<()> {
    match cmd {
        NodeCommand::Add(args) => change(ctx, ChangeKind::Add, &args),
        NodeCommand::Remove(args) => change(ctx, ChangeKind::Remove, &args),
    }
}

fn change(ctx: &Context, kind: ChangeKind, args: &NodeArgs) -> Result<()> {
    let app = App::new(ctx)?;
    let proposed = args.proposed();

    let confirm = TerminalConfirm;
    let mut workflow = NodeWorkflow::new(&app.store, app.ssh.as_ref(), &app.trigger, &confirm)
        .auto_accept(args.auto_accept);

    let outcome = match kind {
        ChangeKind::Add => workflow.add(&proposed),
        ChangeKind::Remove => workflow.remove(&proposed),
    };

    match outcome {
        Ok(Outcome::Deployed) => {
            ui::success(&format!(
                "Topology updated; deployment started (log: {})",
                app.trigger.log_path().display()
            ));
            Ok(())
        }
        Ok(Outcome::Declined) => {
            ui::info("No changes made");
            Ok(())
        }
        Err(e) => {
            if let Some(topology::Error::Validation { errors, .. }) =
                e.downcast_ref::<topology::Error>()
            {
                for message in errors {
                    ui::error(message);
                }
            }
            if let Some(err) = e.downcast_ref::<topology::Error>() {
                ui::dim(err.category().advice());
            }
            Err(e)
        }
    }
}

/// Prompts on the terminal after showing the pending change
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, plan: &ChangePlan<'_>) -> Result<bool> {
        ui::header(match plan.kind {
            ChangeKind::Add => "Nodes to add",
            ChangeKind::Remove => "Nodes to remove",
        });
        for role in Role::ALL {
            let requested = plan.proposed.get(role);
            if requested.is_empty() {
                continue;
            }
            ui::section(role.display_name());
            ui::kv("existing", &ui::address_list(&plan.current.group(role).addresses));
            ui::kv(plan.kind.verb(), &ui::address_list(requested));
        }

        ui::section("Topology changes");
        show_diff(&store::render(plan.current)?, &store::render(plan.next)?);
        println!();

        let confirmed = Prompt::new()
            .with_prompt(format!("{} these nodes and deploy?", capitalize(plan.kind.verb())))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().collect::<String>() + chars.as_str())
        .unwrap_or_default()
}

/// Print changed lines between two renderings
fn show_diff(before: &str, after: &str) {
    let diff = similar::TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => print!("    {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => print!("    {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}
