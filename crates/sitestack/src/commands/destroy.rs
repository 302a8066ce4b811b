use crate::utils::StackContext;
use colored::Colorize;
use sitestack_core::ProvisioningEngine;

pub async fn handle(context: &StackContext, yes: bool) -> anyhow::Result<()> {
    println!("{}", "スタックを削除します...".yellow().bold());
    context.print_header();

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!(
            "{}",
            "警告: removal policy が destroy のリソースはデータごと削除されます。".yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    let result = context.engine().destroy(&context.stack_name).await?;

    println!();
    for success in &result.succeeded {
        println!("  ✓ {}", success.message);
    }
    if !result.retained.is_empty() {
        println!();
        println!(
            "{}",
            "以下のリソースは removal policy により保持されます:".yellow()
        );
        for retained in &result.retained {
            println!("  • {}", retained.cyan());
        }
    }

    println!();
    println!(
        "{}",
        format!("✓ スタック {} を削除しました", context.stack_name)
            .green()
            .bold()
    );
    Ok(())
}
