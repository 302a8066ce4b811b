use crate::utils::StackContext;
use colored::Colorize;
use sitestack_core::ProvisioningEngine;

pub async fn handle(context: &StackContext) -> anyhow::Result<()> {
    println!("{}", "スタックを合成中...".blue());
    context.print_header();

    let graph = context.declare()?;
    let engine = context.engine();
    let assembly = engine.synthesize(&graph).await?;

    println!();
    println!("{}", "✓ 合成が完了しました".green().bold());
    println!(
        "  テンプレート: {}",
        engine
            .out_dir()
            .join(assembly.template_file_name())
            .display()
            .to_string()
            .cyan()
    );
    println!("  アセット: {}個", assembly.assets.len());
    for asset in &assembly.assets {
        println!("    - {} ({})", asset.destination.cyan(), &asset.hash[..12]);
    }

    Ok(())
}
