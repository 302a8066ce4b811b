use crate::utils::StackContext;
use colored::Colorize;
use sitestack_core::{ActionType, Plan, ProvisioningEngine};

pub async fn handle(context: &StackContext) -> anyhow::Result<()> {
    println!("{}", "差分を計算中...".blue());
    context.print_header();

    let graph = context.declare()?;
    let plan = context.engine().plan(&graph).await?;

    println!();
    print_plan(&plan);
    Ok(())
}

/// プランの内容を表示
pub fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "変更はありません".green());
        return;
    }

    for action in &plan.actions {
        let line = format!(
            "{} ({})",
            action.resource_id, action.resource_type
        );
        match action.action_type {
            ActionType::Create => println!("  {} {}", "+".green().bold(), line.green()),
            ActionType::Update => println!("  {} {}", "~".yellow().bold(), line.yellow()),
            ActionType::Delete => {
                let retained = action.detail::<bool>("retain_on_delete").unwrap_or(false);
                if retained {
                    println!("  {} {} (retain)", "-".red().bold(), line.red());
                } else {
                    println!("  {} {}", "-".red().bold(), line.red());
                }
            }
            ActionType::NoOp => println!("  {} {}", "=".dimmed(), line.dimmed()),
        }
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}
