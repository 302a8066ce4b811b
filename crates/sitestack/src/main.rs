mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitestack")]
#[command(about = "静的サイトのインフラを宣言し、合成してデプロイする", long_about = None)]
struct Cli {
    /// デプロイ先アカウント
    #[arg(long, global = true, env = "CDK_DEFAULT_ACCOUNT")]
    account: Option<String>,

    /// デプロイ先リージョン
    #[arg(long, global = true, env = "CDK_DEFAULT_REGION")]
    region: Option<String>,

    /// スタック名（省略時は設定ファイル、なければ AwsCdkServerlessStack）
    #[arg(long, global = true)]
    stack_name: Option<String>,

    /// アセンブリの出力先（デフォルト: cdk.out）
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// テンプレートとアセットを出力先に合成
    Synth,
    /// スタック宣言を検証してリソース一覧を表示
    Validate,
    /// デプロイ済みの状態との差分を表示
    Diff,
    /// スタックをデプロイ
    Deploy {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// スタックを削除（removal policy が retain のリソースは残す）
    Destroy {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderr、結果はstdoutに出力
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("sitestack {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let context = utils::StackContext::resolve(cli.account, cli.region, cli.stack_name, cli.out)?;

    match cli.command {
        Commands::Synth => commands::synth::handle(&context).await?,
        Commands::Validate => commands::validate::handle(&context)?,
        Commands::Diff => commands::diff::handle(&context).await?,
        Commands::Deploy { yes } => commands::deploy::handle(&context, yes).await?,
        Commands::Destroy { yes } => commands::destroy::handle(&context, yes).await?,
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
