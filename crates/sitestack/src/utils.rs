use colored::Colorize;
use sitestack_core::{Environment, LocalEngine, ResourceGraph, StackBuilder, website_stack};
use std::path::PathBuf;

/// スタック宣言に使うスコープ名
pub const APP_SCOPE: &str = "app";

/// コマンド実行に必要な解決済みの設定
#[derive(Debug, Clone)]
pub struct StackContext {
    pub project_root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub stack_name: String,
    pub environment: Environment,
    pub out_dir: PathBuf,
}

impl StackContext {
    /// CLI フラグ（環境変数を含む）> 設定ファイル > デフォルト の順で解決する
    pub fn resolve(
        account: Option<String>,
        region: Option<String>,
        stack_name: Option<String>,
        out: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let project_root = std::env::current_dir()?;
        let (config_file, config) = match sitestack_config::load_project_config()? {
            Some((path, config)) => (Some(path), config),
            None => (None, Default::default()),
        };

        let context = Self {
            stack_name: config.stack_name_or(stack_name),
            environment: sitestack_config::resolve_environment(account, region, &config),
            out_dir: config.out_dir_or(out, &project_root),
            project_root,
            config_file,
        };
        // スタック名は状態ファイルのパスにも使われるため、コマンド実行前に検証する
        StackBuilder::new(
            APP_SCOPE,
            context.stack_name.as_str(),
            context.environment.clone(),
        )?;
        tracing::debug!("Resolved context: {:?}", context);
        Ok(context)
    }

    /// スタックを宣言する
    pub fn declare(&self) -> anyhow::Result<ResourceGraph> {
        let graph = website_stack(APP_SCOPE, &self.stack_name, &self.environment)?;
        Ok(graph)
    }

    pub fn engine(&self) -> LocalEngine {
        LocalEngine::new(&self.out_dir, &self.project_root)
    }

    /// 対象スタックの情報を表示
    pub fn print_header(&self) {
        println!("スタック: {}", self.stack_name.cyan());
        println!("環境: {}", self.environment.to_string().cyan());
        if let Some(path) = &self.config_file {
            println!("📄 設定ファイル: {}", path.display().to_string().cyan());
        }
    }
}
