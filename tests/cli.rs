use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `warga` command isolated under a temporary HOME.
fn warga(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("warga").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("WARGA_LOG")
        .env_remove("XDG_CONFIG_HOME");
    cmd
}

fn initialized() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    warga(&home)
        .args(["init", "--data-dir"])
        .arg(&data_dir)
        .args(["--community", "Griya Asri"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created administrator 'admin'"))
        .stdout(predicate::str::contains("Acting as: admin"));
    home
}

fn with_demo() -> TempDir {
    let home = initialized();
    warga(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo data loaded!"));
    home
}

#[test]
fn status_without_database_suggests_init() {
    let home = tempfile::tempdir().unwrap();
    warga(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run `warga init`"));
}

#[test]
fn init_creates_layout_and_status_reports_it() {
    let home = initialized();
    let data_dir = home.path().join("data");
    assert!(data_dir.join("warga.db").exists());
    assert!(data_dir.join("uploads").is_dir());
    assert!(data_dir.join("exports").is_dir());
    assert!(data_dir.join("backups").is_dir());

    warga(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("User:       admin"))
        .stdout(predicate::str::contains("Community:  Griya Asri"))
        .stdout(predicate::str::contains("Admins:            1"));
}

#[test]
fn demo_is_loaded_once() {
    let home = with_demo();
    warga(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo data not loaded"));
}

#[test]
fn report_and_matrix_render_for_admin() {
    let home = with_demo();
    warga(&home)
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Financial Report (all time)"))
        .stdout(predicate::str::contains("Kas Perumahan"))
        .stdout(predicate::str::contains("Saldo awal Kas Sosial"));
    warga(&home)
        .args(["report", "--year", "1999"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No mutations in this period."));
    warga(&home)
        .args(["report", "--year", "2147483647"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Year out of range"));
    warga(&home)
        .arg("matrix")
        .assert()
        .success()
        .stdout(predicate::str::contains("Payment Matrix"))
        .stdout(predicate::str::contains("Budi Santoso"));
}

#[test]
fn resident_sees_own_payments_but_not_registry() {
    let home = with_demo();
    warga(&home)
        .args(["--as", "budi", "payments", "mine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Payments for Budi Santoso"));
    warga(&home)
        .args(["--as", "budi", "residents", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Forbidden"));
    warga(&home)
        .args(["--as", "nobody", "report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown user: nobody"));
}

#[test]
fn resident_submission_waits_for_admin() {
    let home = with_demo();
    warga(&home)
        .args(["--as", "budi", "payments", "submit", "2099-02,2099-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2099-01,2099-02"))
        .stdout(predicate::str::contains("Rp 160.000"));
    warga(&home)
        .args(["payments", "submit", "2099-03"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Forbidden"));

    warga(&home)
        .args(["payments", "list", "--status", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2099-01,2099-02"));
}

#[test]
fn admin_cannot_delete_self() {
    let home = initialized();
    warga(&home)
        .args(["admins", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("You cannot delete your own account"));
    warga(&home)
        .args(["admins", "add", "ketua", "--name", "Pak Ketua"])
        .assert()
        .success();
    warga(&home)
        .args(["admins", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pak Ketua"));
}

#[test]
fn missing_principal_is_reported() {
    let home = initialized();
    let data_dir = home.path().join("data");
    let settings = home.path().join(".config").join("warga").join("settings.json");
    std::fs::write(&settings, settings_without_user(&data_dir.to_string_lossy())).unwrap();
    warga(&home)
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active user"));

    warga(&home).args(["login", "admin"]).assert().success();
    warga(&home).arg("report").assert().success();
}

fn settings_without_user(data_dir: &str) -> String {
    format!("{{\"data_dir\": {data_dir:?}}}")
}

#[test]
fn dues_can_be_changed_by_admin() {
    let home = initialized();
    warga(&home)
        .args(["dues", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rp 80.000"));
    warga(&home)
        .args(["dues", "set", "--housing", "60.000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly dues now Rp 90.000 per household."));
    warga(&home)
        .args(["dues", "set", "--rt", "-5"])
        .assert()
        .failure();
    warga(&home)
        .args(["dues", "set", "--rt", "9223372036854775807"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn manual_mutation_is_exported() {
    let home = initialized();
    warga(&home)
        .args([
            "mutations",
            "add",
            "--type",
            "out",
            "--amount",
            "150000",
            "--description",
            "Beli lampu jalan",
            "--fund",
            "housing",
            "--date",
            "2024-03-10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded mutation 1: out Rp 150.000 (Kas Perumahan)"));

    warga(&home)
        .args(["mutations", "list", "--month", "2024-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beli lampu jalan"));

    let out = home.path().join("ledger.csv");
    warga(&home)
        .args(["mutations", "export", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 rows"));
    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("id,date,type,fund,category,description,resident,amount,payment_id"));
    assert!(csv.contains("2024-03-10 00:00:00,out,housing,,Beli lampu jalan,,150000,"));
}
