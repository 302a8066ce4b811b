pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use sitestack_core::{DEFAULT_STACK_NAME, Environment};
use std::path::{Path, PathBuf};

/// 設定ファイルパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "SITESTACK_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["sitestack.local.yaml", "sitestack.yaml"];

/// プロジェクト設定 (sitestack.yaml)
///
/// すべての項目は省略可能。CLI フラグや環境変数が優先される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StackConfig {
    /// スタック名
    pub stack_name: Option<String>,

    /// デプロイ先アカウント
    pub account: Option<String>,

    /// デプロイ先リージョン
    pub region: Option<String>,

    /// アセンブリの出力先（プロジェクトルートからの相対パス）
    pub out_dir: Option<PathBuf>,
}

impl StackConfig {
    /// 指定値 > 設定ファイル > デフォルトの順でスタック名を決定
    pub fn stack_name_or(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.stack_name.clone())
            .unwrap_or_else(|| DEFAULT_STACK_NAME.to_string())
    }

    /// 指定値 > 設定ファイル > `cdk.out` の順で出力先を決定
    pub fn out_dir_or(&self, flag: Option<PathBuf>, project_root: &Path) -> PathBuf {
        let dir = flag
            .or_else(|| self.out_dir.clone())
            .unwrap_or_else(|| PathBuf::from("cdk.out"));
        if dir.is_absolute() {
            dir
        } else {
            project_root.join(dir)
        }
    }
}

/// SiteStackの設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("sitestack");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// プロジェクトの設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 SITESTACK_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: sitestack.local.yaml, sitestack.yaml
/// 3. ./.sitestack/ ディレクトリ内: 同様の順序
/// 4. ~/.config/sitestack/sitestack.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} が存在しません: {}", CONFIG_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.sitestack/ ディレクトリで検索
    let stack_dir = current_dir.join(".sitestack");
    if stack_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = stack_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. グローバル設定ファイル (~/.config/sitestack/sitestack.yaml)
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("sitestack").join("sitestack.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを読み込む
pub fn load_config(path: &Path) -> Result<StackConfig> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(StackConfig::default());
    }
    let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// 設定ファイルを探して読み込む。見つからない場合は `None`
pub fn load_project_config() -> Result<Option<(PathBuf, StackConfig)>> {
    match find_config_file() {
        Ok(path) => {
            let config = load_config(&path)?;
            Ok(Some((path, config)))
        }
        Err(ConfigError::ConfigFileNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

/// デプロイ先環境を決定する
///
/// `account` / `region` には CLI フラグ（または CDK_DEFAULT_ACCOUNT /
/// CDK_DEFAULT_REGION）の値を渡す。未指定の項目は設定ファイルで補完し、
/// どちらにもなければ環境非依存のままにする。
pub fn resolve_environment(
    account: Option<String>,
    region: Option<String>,
    config: &StackConfig,
) -> Environment {
    Environment {
        account: account.or_else(|| config.account.clone()),
        region: region.or_else(|| config.region.clone()),
    }
}
