use crate::commands::diff::print_plan;
use crate::utils::StackContext;
use colored::Colorize;
use sitestack_core::ProvisioningEngine;

pub async fn handle(context: &StackContext, yes: bool) -> anyhow::Result<()> {
    println!("{}", "デプロイを開始します...".blue().bold());
    context.print_header();

    let graph = context.declare()?;
    let engine = context.engine();
    let plan = engine.plan(&graph).await?;

    println!();
    print_plan(&plan);
    if !plan.has_changes {
        return Ok(());
    }

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!("{}", "警告: 上記の変更をスタックに適用します。".yellow());
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    println!();
    println!("{}", format!("{} エンジンで適用中...", engine.name()).blue());
    let result = engine.apply(&graph, &plan).await?;

    for success in &result.succeeded {
        println!("  ✓ {}", success.message);
    }
    for failure in &result.failed {
        println!(
            "  ✗ {}: {}",
            failure.action_id.red(),
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    for retained in &result.retained {
        println!("  ⚠ {} はスタックから外れましたが保持されます", retained.yellow());
    }

    if !result.is_success() {
        anyhow::bail!(
            "{}個のアクションが失敗しました（{}ms）",
            result.failed.len(),
            result.duration_ms
        );
    }

    println!();
    println!(
        "{}",
        format!("✓ デプロイが完了しました（{}ms）", result.duration_ms)
            .green()
            .bold()
    );
    println!(
        "  アセンブリ: {}",
        engine.out_dir().display().to_string().cyan()
    );
    Ok(())
}
