use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::{path::PathBuf, process::Command};
use tempfile::TempDir;

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("failed to write fixture");
    path
}

fn standard_sources(dir: &TempDir) -> (PathBuf, PathBuf) {
    let invoices = write_fixture(
        dir,
        "invoices.csv",
        "opname,Law Firm,Case Status,Total Invoice Amount,Open Amount,Invoice Date\n\
         Acme v. Smith,Harper & Lowe,Open,$600.00,$600.00,2024-01-10\n\
         Acme v. Smith,Harper & Lowe,Open,$400.00,$400.00,2024-02-10\n\
         Jones v. Metro,Birch Partners,Open,$250.00,$250.00,2024-01-20\n",
    );
    let collections = write_fixture(
        dir,
        "collections.csv",
        "opname,Amount Collected,Year,Month,Day\n\
         Acme v. Smith,$300.00,2024,March,15\n\
         Acme v. Smith,$100.00,2024,April,2\n",
    );
    (invoices, collections)
}

#[test]
fn import_then_summary_shows_totals() {
    let home = setup_temp_home();
    let db_path = home.path().join("ledger.db");
    let (invoices, collections) = standard_sources(&home);

    let mut import_cmd = Command::new(cargo::cargo_bin!("caseledger"));
    import_cmd
        .env("HOME", home.path())
        .arg("--no-color")
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&invoices)
        .arg(&collections);

    import_cmd
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 cases"))
        .stdout(predicate::str::contains("Load complete: 2 inserted"))
        .stdout(predicate::str::contains("Verification passed"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    let mut summary_cmd = Command::new(cargo::cargo_bin!("caseledger"));
    summary_cmd
        .env("HOME", home.path())
        .arg("--no-color")
        .arg("--db")
        .arg(&db_path)
        .arg("summary")
        .arg("--by")
        .arg("firm");

    summary_cmd
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rows"))
        .stdout(predicate::str::contains("$1,250.00"))
        .stdout(predicate::str::contains("Harper & Lowe"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn import_dry_run_does_not_create_db() {
    let home = setup_temp_home();
    let db_path = home.path().join("ledger.db");
    let (invoices, collections) = standard_sources(&home);
    assert!(!db_path.exists(), "db should start absent");

    let mut cmd = Command::new(cargo::cargo_bin!("caseledger"));
    cmd.env("HOME", home.path())
        .arg("--no-color")
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&invoices)
        .arg(&collections)
        .arg("--dry-run");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Found 2 cases"))
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    assert!(!db_path.exists(), "dry-run should not create db");
}

#[test]
fn import_missing_anchor_exits_nonzero() {
    let home = setup_temp_home();
    let db_path = home.path().join("ledger.db");
    let invoices = write_fixture(&home, "invoices.csv", "unrelated,columns\n1,2\n");
    let collections = write_fixture(
        &home,
        "collections.csv",
        "opname,Amount Collected\nA,$1.00\n",
    );

    let mut cmd = Command::new(cargo::cargo_bin!("caseledger"));
    cmd.env("HOME", home.path())
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&invoices)
        .arg(&collections);

    cmd.assert().failure();
}

#[test]
fn import_json_emits_machine_readable_report() {
    let home = setup_temp_home();
    let db_path = home.path().join("ledger.db");
    let (invoices, collections) = standard_sources(&home);

    let mut cmd = Command::new(cargo::cargo_bin!("caseledger"));
    cmd.env("HOME", home.path())
        .arg("--json")
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&invoices)
        .arg(&collections);

    let output = cmd.assert().success().get_output().stdout.clone();
    let report: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be valid JSON");
    assert_eq!(report["case_count"], 2);
    assert_eq!(report["load"]["inserted"], 2);
}

#[test]
fn verify_after_import_passes_with_expected_totals() {
    let home = setup_temp_home();
    let db_path = home.path().join("ledger.db");
    let (invoices, collections) = standard_sources(&home);

    Command::new(cargo::cargo_bin!("caseledger"))
        .env("HOME", home.path())
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&invoices)
        .arg(&collections)
        .assert()
        .success();

    let mut verify_cmd = Command::new(cargo::cargo_bin!("caseledger"));
    verify_cmd
        .env("HOME", home.path())
        .arg("--no-color")
        .arg("--db")
        .arg(&db_path)
        .arg("verify")
        .arg("--expected-count")
        .arg("2")
        .arg("--expected-invoiced")
        .arg("1250.00")
        .arg("--expected-collected")
        .arg("400.00");

    verify_cmd
        .assert()
        .success()
        .stdout(predicate::str::contains("Verification passed"));
}

#[test]
fn views_refresh_reports_each_table() {
    let home = setup_temp_home();
    let db_path = home.path().join("ledger.db");
    let (invoices, collections) = standard_sources(&home);

    Command::new(cargo::cargo_bin!("caseledger"))
        .env("HOME", home.path())
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&invoices)
        .arg(&collections)
        .assert()
        .success();

    let mut cmd = Command::new(cargo::cargo_bin!("caseledger"));
    cmd.env("HOME", home.path())
        .arg("--no-color")
        .arg("--db")
        .arg(&db_path)
        .arg("views")
        .arg("refresh");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ar_by_month"))
        .stdout(predicate::str::contains("ar_by_law_firm"))
        .stdout(predicate::str::contains("ar_by_risk"));
}

#[test]
fn inspect_shows_detected_header() {
    let home = setup_temp_home();
    let (invoices, _) = standard_sources(&home);

    let mut cmd = Command::new(cargo::cargo_bin!("caseledger"));
    cmd.env("HOME", home.path())
        .arg("--no-color")
        .arg("inspect")
        .arg(&invoices);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Header found on line 1"))
        .stdout(predicate::str::contains("Total Invoice Amount"))
        .stdout(predicate::str::contains("3 data rows"));
}
