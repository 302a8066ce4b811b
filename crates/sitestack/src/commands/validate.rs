use crate::utils::{APP_SCOPE, StackContext};
use colored::Colorize;
use sitestack_core::website_stack;

pub fn handle(context: &StackContext) -> anyhow::Result<()> {
    println!("{}", "スタック宣言を検証中...".blue());
    context.print_header();

    match website_stack(APP_SCOPE, &context.stack_name, &context.environment) {
        Ok(graph) => {
            println!("{}", "✓ スタック宣言は正常です！".green().bold());
            println!();
            println!("リソース: {}個（作成順）", graph.len());
            for resource in graph.resources() {
                let deps = graph.dependencies_of(resource);
                let deps = if deps.is_empty() {
                    String::new()
                } else {
                    format!(" ← {}", deps.join(", "))
                };
                println!(
                    "    - {} ({}){}",
                    resource.logical_id().cyan(),
                    resource.kind(),
                    deps
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 宣言エラー".red().bold());
            eprintln!("  リソース: {}", e.resource());
            eprintln!("  {}", e);
            Err(e.into())
        }
    }
}
