use predicates::prelude::*;
mod common;
use common::TestProject;

#[test]
fn test_stack_lifecycle() {
    let project = TestProject::new();
    let state_file = project
        .path()
        .join(".sitestack")
        .join("AwsCdkServerlessStack.state.json");

    // 1. 差分 (Diff) - すべて作成予定
    project
        .command()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("+ WebsiteBucket"))
        .stdout(predicate::str::contains("5 to create"));

    // 2. 確認なしのデプロイは何も変更しない
    project
        .command()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
    assert!(!state_file.exists());

    // 3. デプロイ (Deploy)
    project
        .command()
        .args(["deploy", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("デプロイが完了しました"));
    assert!(state_file.exists());
    assert!(
        project
            .path()
            .join("cdk.out/AwsCdkServerlessStack.template.json")
            .exists()
    );

    // 4. 再度の差分は変更なし
    project
        .command()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("変更はありません"));

    // 5. 削除 (Destroy)
    project
        .command()
        .args(["destroy", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WebsiteBucket deleted"));

    // 6. 削除済みスタックの再削除はエラー
    project
        .command()
        .args(["destroy", "--yes"])
        .assert()
        .failure();
}

#[test]
fn test_stacks_are_tracked_separately() {
    let project = TestProject::new();

    project
        .command()
        .args(["--stack-name", "Blue", "deploy", "--yes"])
        .assert()
        .success();

    project
        .command()
        .args(["--stack-name", "Green", "diff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 to create"));
}

#[test]
fn test_destroy_rejects_invalid_stack_name() {
    let project = TestProject::new();

    project
        .command()
        .args(["--stack-name", "../outside", "destroy", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stackName"));

    assert!(!project.path().join("outside.lock.json").exists());
    assert!(!project.path().join(".sitestack").exists());
}
