use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
    config_home: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        Self { root, config_home }
    }

    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) {
        let path = self.root.path().join("sitestack.yaml");
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// プロジェクトディレクトリで実行する `sitestack` コマンド
    ///
    /// 開発者の環境変数やグローバル設定の影響を受けないようにする
    #[allow(deprecated)]
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("sitestack").unwrap();
        cmd.current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env_remove("SITESTACK_CONFIG_PATH")
            .env_remove("CDK_DEFAULT_ACCOUNT")
            .env_remove("CDK_DEFAULT_REGION")
            .env("NO_COLOR", "1");
        cmd
    }
}
