//! Integration tests for the run, status, list, and show commands

use crate::common::{assertions, sample_data, CliTestRunner};
use sheetwatch::config::WatchConfig;
use std::fs;

fn report_count(runner: &CliTestRunner) -> usize {
    let dir = &runner.fixture().workspace.reports_dir;
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir).unwrap().count()
}

fn export_count(runner: &CliTestRunner) -> usize {
    let dir = &runner.fixture().workspace.exports_dir;
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_run_first_time_commits_baseline() {
    let runner = CliTestRunner::new().unwrap();
    let doc = runner
        .fixture()
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();

    runner.expect_success(&["run", doc.to_str().unwrap()]);

    // Baseline commit: state and snapshots exist
    let fixture = runner.fixture();
    assertions::assert_file_exists_and_not_empty(&fixture.workspace.state_path());
    fixture.assert_snapshot_exists("Products");
    fixture.assert_snapshot_exists("Suppliers");

    // No notification is delivered on the first run
    assert_eq!(report_count(&runner), 0);
}

#[test]
fn test_run_second_time_reports_changes() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let doc = fixture
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    let doc_arg = doc.to_str().unwrap();

    runner.expect_success(&["run", doc_arg]);
    fixture
        .create_workbook("doc.json", &sample_data::inventory_reworked())
        .unwrap();
    runner.expect_success(&["run", doc_arg]);

    // The file notifier writes a JSON payload and a text report
    let reports: Vec<_> = fs::read_dir(&fixture.workspace.reports_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert!(reports.iter().any(|p| p.extension().unwrap() == "json"));
    assert!(reports.iter().any(|p| p.extension().unwrap() == "txt"));

    // Changed tabs are exported as CSV artifacts
    assert!(export_count(&runner) > 0);
}

#[test]
fn test_run_without_changes_stays_quiet() {
    let runner = CliTestRunner::new().unwrap();
    let doc = runner
        .fixture()
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    let doc_arg = doc.to_str().unwrap();

    runner.expect_success(&["run", doc_arg]);
    runner.expect_success(&["run", doc_arg]);

    assert_eq!(report_count(&runner), 0);
    assert_eq!(export_count(&runner), 0);
}

#[test]
fn test_run_dry_run_leaves_state_untouched() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let doc = fixture
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    let doc_arg = doc.to_str().unwrap();

    runner.expect_success(&["run", doc_arg]);
    let state_before = fs::read_to_string(fixture.workspace.state_path()).unwrap();

    fixture
        .create_workbook("doc.json", &sample_data::inventory_reworked())
        .unwrap();
    runner.expect_success(&["run", doc_arg, "--dry-run"]);

    let state_after = fs::read_to_string(fixture.workspace.state_path()).unwrap();
    assert_eq!(state_before, state_after);
    assert_eq!(report_count(&runner), 0);
    assert_eq!(export_count(&runner), 0);
}

#[test]
fn test_run_json_output() {
    let runner = CliTestRunner::new().unwrap();
    let doc = runner
        .fixture()
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();

    runner.expect_success(&["run", doc.to_str().unwrap(), "--json"]);
}

#[test]
fn test_run_no_export_flag() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let doc = fixture
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    let doc_arg = doc.to_str().unwrap();

    runner.expect_success(&["run", doc_arg]);
    fixture
        .create_workbook("doc.json", &sample_data::inventory_reworked())
        .unwrap();
    runner.expect_success(&["run", doc_arg, "--no-export"]);

    assert!(report_count(&runner) > 0);
    assert_eq!(export_count(&runner), 0);
}

#[test]
fn test_run_uses_configured_source() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let doc = fixture
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();

    let mut config = WatchConfig::default();
    config.source = Some(doc.to_str().unwrap().to_string());
    config.save(&fixture.workspace.config_path()).unwrap();

    // No input argument: the configured source is used instead
    runner.expect_success(&["run"]);
    fixture.assert_snapshot_exists("Products");
}

#[test]
fn test_run_without_input_or_configured_source() {
    let runner = CliTestRunner::new().unwrap();

    let err = runner.expect_failure(&["run"]);
    assert!(err.to_string().contains("no document given"));
}

#[test]
fn test_run_rejects_unsupported_locator() {
    let runner = CliTestRunner::new().unwrap();
    let path = runner.fixture().create_raw("notes.txt", "hello").unwrap();

    runner.expect_failure(&["run", path.to_str().unwrap()]);
}

#[test]
fn test_run_missing_document_fails() {
    let runner = CliTestRunner::new().unwrap();
    let missing = runner.fixture().root().join("absent.json");

    runner.expect_failure(&["run", missing.to_str().unwrap()]);
}

#[test]
fn test_run_csv_directory_source() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let dir = fixture
        .create_csv_dir(
            "tabs",
            &[
                ("Products", "id,name\n1,Apple\n2,Banana\n"),
                ("Suppliers", "id,company\ns1,Acme\n"),
            ],
        )
        .unwrap();

    runner.expect_success(&["run", dir.to_str().unwrap()]);

    fixture.assert_snapshot_exists("Products");
    fixture.assert_snapshot_exists("Suppliers");
}

#[test]
fn test_run_id_column_override() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let doc = fixture
        .create_workbook(
            "doc.json",
            &crate::common::workbook(&[(
                "Stock",
                &[&["SKU", "qty"], &["A-1", "4"], &["B-2", "9"]],
            )]),
        )
        .unwrap();

    runner.expect_success(&["run", doc.to_str().unwrap(), "--id-column", "SKU"]);
    fixture.assert_snapshot_exists("Stock");
}

#[test]
fn test_status_command() {
    let runner = CliTestRunner::new().unwrap();

    // Status works before any run has committed
    runner.expect_success(&["status"]);

    let doc = runner
        .fixture()
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    runner.expect_success(&["run", doc.to_str().unwrap()]);

    runner.expect_success(&["status"]);
    runner.expect_success(&["status", "--json"]);
}

#[test]
fn test_list_command() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["list"]);

    let doc = runner
        .fixture()
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    runner.expect_success(&["run", doc.to_str().unwrap()]);

    runner.expect_success(&["list"]);
    runner.expect_success(&["list", "--format", "json"]);
    runner.expect_failure(&["list", "--format", "yaml"]);
}

#[test]
fn test_show_command() {
    let runner = CliTestRunner::new().unwrap();
    let doc = runner
        .fixture()
        .create_workbook("doc.json", &sample_data::inventory())
        .unwrap();
    runner.expect_success(&["run", doc.to_str().unwrap()]);

    runner.expect_success(&["show", "Products"]);
    runner.expect_success(&["show", "Products", "--rows", "1"]);
    runner.expect_success(&["show", "Products", "--format", "json"]);

    // Unknown tab
    runner.expect_failure(&["show", "Ghost"]);
}
