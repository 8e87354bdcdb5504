//! Integration tests for the init command

use crate::common::{assertions, CliTestRunner};

#[test]
fn test_init_command_success() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    // Verify workspace was created
    let fixture = runner.fixture();
    assertions::assert_dir_exists(&fixture.workspace.sheetwatch_dir);
    assertions::assert_dir_exists(&fixture.workspace.snapshots_dir);
    assertions::assert_dir_exists(&fixture.workspace.reports_dir);
    assertions::assert_dir_exists(&fixture.workspace.exports_dir);

    // Verify config file was created
    let config_path = fixture.workspace.config_path();
    assertions::assert_file_exists_and_not_empty(&config_path);
    assertions::assert_json_contains_keys(
        &config_path,
        &["version", "id_column", "tab_change_cap", "stale_lock_ms"],
    )
    .unwrap();

    // Verify .gitignore was created
    let gitignore_path = fixture.workspace.root.join(".gitignore");
    assertions::assert_file_exists_and_not_empty(&gitignore_path);
}

#[test]
fn test_init_command_already_exists() {
    let runner = CliTestRunner::new().unwrap();

    // First init should succeed
    runner.expect_success(&["init"]);

    // Second init without force should still succeed (idempotent)
    runner.expect_success(&["init"]);
}

#[test]
fn test_init_preserves_modified_config() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    // Customize the config
    let config_path = runner.fixture().workspace.config_path();
    std::fs::write(&config_path, r#"{"id_column": "SKU"}"#).unwrap();

    // Init without force keeps the customization
    runner.expect_success(&["init"]);

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("SKU"));
}

#[test]
fn test_init_command_with_force_resets_config() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    // Modify config file
    let config_path = runner.fixture().workspace.config_path();
    std::fs::write(&config_path, r#"{"id_column": "SKU"}"#).unwrap();

    // Init with force should reset the config to defaults
    runner.expect_success(&["init", "--force"]);

    let content = std::fs::read_to_string(&config_path).unwrap();
    let config: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(config["id_column"], "id");
    assert_eq!(config["tab_change_cap"], 200);
}

#[test]
fn test_init_preserves_existing_gitignore() {
    let runner = CliTestRunner::new().unwrap();

    // Create existing .gitignore
    let gitignore_path = runner.fixture().root().join(".gitignore");
    std::fs::write(&gitignore_path, "# Existing content\n*.log\n").unwrap();

    runner.expect_success(&["init"]);

    // Should preserve existing content and add sheetwatch entries
    let content = std::fs::read_to_string(&gitignore_path).unwrap();
    assert!(content.contains("# Existing content"));
    assert!(content.contains("*.log"));
    assert!(content.contains(".sheetwatch/lock.json"));
}

#[test]
fn test_init_with_verbose_flag() {
    let runner = CliTestRunner::new().unwrap();

    // Should succeed with verbose flag
    runner.expect_success(&["--verbose", "init"]);

    assertions::assert_dir_exists(&runner.fixture().workspace.sheetwatch_dir);
}

#[test]
fn test_init_with_custom_workspace() {
    let runner = CliTestRunner::new().unwrap();
    let custom_path = runner.fixture().root().join("custom");
    std::fs::create_dir(&custom_path).unwrap();

    runner.expect_success(&["--workspace", custom_path.to_str().unwrap(), "init"]);

    // Verify workspace was created in custom location
    assertions::assert_dir_exists(&custom_path.join(".sheetwatch"));
}

#[test]
fn test_init_creates_proper_directory_structure() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    let fixture = runner.fixture();
    let sheetwatch_dir = &fixture.workspace.sheetwatch_dir;

    assert!(sheetwatch_dir.exists() && sheetwatch_dir.is_dir());
    assert_eq!(sheetwatch_dir.parent().unwrap(), fixture.root());
    assert_eq!(
        fixture.workspace.snapshots_dir.parent().unwrap(),
        sheetwatch_dir
    );
    assert_eq!(
        fixture.workspace.reports_dir.parent().unwrap(),
        sheetwatch_dir
    );
    assert_eq!(
        fixture.workspace.exports_dir.parent().unwrap(),
        sheetwatch_dir
    );
}

#[test]
fn test_init_config_file_format() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    let config_path = runner.fixture().workspace.config_path();
    let content = std::fs::read_to_string(&config_path).unwrap();
    let config: serde_json::Value = serde_json::from_str(&content).unwrap();

    // Verify config structure
    assert_eq!(config["version"], "1.0.0");
    assert_eq!(config["id_column"], "id");
    assert_eq!(config["tab_change_cap"], 200);
    assert_eq!(config["stale_lock_ms"], 600000);
    assert_eq!(config["export_changed_tabs"], true);
    assert!(config["source"].is_null());
}

#[test]
fn test_init_gitignore_format() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    let gitignore_path = runner.fixture().root().join(".gitignore");
    let content = std::fs::read_to_string(&gitignore_path).unwrap();

    assert!(content.contains("# Ignore transient sheetwatch files"));
    assert!(content.contains(".sheetwatch/lock.json"));
    assert!(content.contains(".sheetwatch/exports/"));
    assert!(content.contains(".sheetwatch/reports/"));
    assert!(content.ends_with('\n'));
}

#[test]
fn test_init_idempotent_behavior() {
    let runner = CliTestRunner::new().unwrap();

    // Run init multiple times
    for _ in 0..3 {
        runner.expect_success(&["init"]);
    }

    // Should still have valid workspace
    let fixture = runner.fixture();
    assertions::assert_dir_exists(&fixture.workspace.sheetwatch_dir);
    assertions::assert_file_exists_and_not_empty(&fixture.workspace.config_path());
}

#[test]
fn test_init_with_existing_files() {
    let runner = CliTestRunner::new().unwrap();

    // Create some existing files in the directory
    std::fs::write(runner.fixture().root().join("data.csv"), "id,name\n1,test").unwrap();
    std::fs::write(runner.fixture().root().join("README.md"), "# Test Project").unwrap();

    runner.expect_success(&["init"]);

    // Should not affect existing files
    assert!(runner.fixture().root().join("data.csv").exists());
    assert!(runner.fixture().root().join("README.md").exists());

    assertions::assert_dir_exists(&runner.fixture().workspace.sheetwatch_dir);
}
