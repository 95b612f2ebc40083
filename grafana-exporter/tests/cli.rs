mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use zip::ZipArchive;

fn exporter(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("grafana-exporter").expect("Binary exists");
    cmd.current_dir(workdir)
        .env_remove("GRAFANA_EXPORTER_URL")
        .env_remove("GRAFANA_EXPORTER_TOKEN")
        .env("RUST_LOG", "warn");
    cmd
}

fn setup(cloud_enabled: bool) -> (TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let base = common::spawn_backend();
    let config = common::write_config(dir.path(), &base, cloud_enabled);
    (dir, config)
}

fn entry_names(path: &Path) -> Vec<String> {
    let bytes = std::fs::read(path).expect("archive exists");
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[test]
fn formats_for_cloud_exclude_grizzly() {
    let dir = tempdir().unwrap();
    exporter(dir.path())
        .args(["formats", "--target", "cloud"])
        .assert()
        .success()
        .stdout(predicate::str::contains("terraform-hcl"))
        .stdout(predicate::str::contains("crossplane"))
        .stdout(predicate::str::contains("grizzly").not());
}

#[test]
fn kinds_lists_catalog_by_category() {
    let (dir, config) = setup(false);
    exporter(dir.path())
        .arg("kinds")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Alerting (1/1)"))
        .stdout(predicate::str::contains("Grafana (2/2)"))
        .stdout(predicate::str::contains("[x] grafana_dashboard"));
}

#[test]
fn kinds_for_grizzly_are_uncategorised() {
    let (dir, config) = setup(false);
    exporter(dir.path())
        .arg("kinds")
        .arg("--config")
        .arg(&config)
        .args(["--format", "grizzly-json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(uncategorised) (2/2)"))
        .stdout(predicate::str::contains("[x] Dashboard"));
}

#[test]
fn export_writes_archive_into_directory() {
    let (dir, config) = setup(false);
    exporter(dir.path())
        .arg("export")
        .arg("--config")
        .arg(&config)
        .args(["--exclude", "grafana_contact_point"])
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 file(s)"));

    let names = entry_names(&dir.path().join("grafana-terraform-export.zip"));
    assert_eq!(names, ["grafana_dashboard.tf", "grafana_folder.tf"]);
}

#[test]
fn export_only_to_zip_path_with_print_and_warnings() {
    let (dir, config) = setup(false);
    let out = dir.path().join("out/custom.zip");
    exporter(dir.path())
        .arg("export")
        .arg("--config")
        .arg(&config)
        .args(["--category", "Alerting", "--only", "grafana_folder", "--print"])
        .args(["--format", "terraform-json"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("==> grafana_contact_point.json (json) <=="))
        .stdout(predicate::str::contains("# grafana_folder"))
        .stderr(predicate::str::contains(
            "warning: grafana_contact_point: permission denied",
        ));

    let names = entry_names(&out);
    assert_eq!(names, ["grafana_contact_point.json", "grafana_folder.json"]);
}

#[test]
fn export_without_selection_fails_validation() {
    let (dir, config) = setup(false);
    exporter(dir.path())
        .arg("export")
        .arg("--config")
        .arg(&config)
        .args([
            "--exclude",
            "grafana_folder",
            "--exclude",
            "grafana_dashboard",
            "--exclude",
            "grafana_contact_point",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "At least one resource type must be selected",
        ));
    assert!(!dir.path().join("grafana-terraform-export.zip").exists());
}

#[test]
fn export_unknown_kind_fails() {
    let (dir, config) = setup(false);
    exporter(dir.path())
        .arg("export")
        .arg("--config")
        .arg(&config)
        .args(["--only", "grafana_nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource kind: grafana_nope"));
}

#[test]
fn cloud_requires_cloud_enabled() {
    let (dir, config) = setup(false);
    exporter(dir.path())
        .arg("kinds")
        .arg("--config")
        .arg(&config)
        .args(["--target", "cloud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cloud export is not enabled"));

    let (dir, config) = setup(true);
    exporter(dir.path())
        .arg("kinds")
        .arg("--config")
        .arg(&config)
        .args(["--target", "cloud"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grafana_cloud_stack"));
}

#[test]
fn unreachable_backend_exits_non_zero() {
    let dir = tempdir().unwrap();
    let config = common::write_config(dir.path(), &common::dead_backend(), false);
    exporter(dir.path())
        .arg("kinds")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch resource types"));
}
