//! Integration tests for the CLI

use assert_cmd::Command;
use legacy_api_audit::{AuditConfig, LocatorConfig};
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sample_tree() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_tree")
}

/// Write a config whose caches live in `tmp` and whose repository is `repository_url`
fn write_config(tmp: &Path, repository_url: &str) -> PathBuf {
    let mut config = AuditConfig::builder()
        .locator(LocatorConfig {
            project_cache: Some(tmp.join("project-cache")),
            gradle_home_cache: Some(tmp.join("home-cache")),
            maven_repository: Some(tmp.join("m2")),
            download_dir: Some(tmp.join("files")),
        })
        .build();
    config.network.repository_url = repository_url.to_string();

    let path = tmp.join("audit.toml");
    fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
    path
}

fn write_maven_jar(tmp: &Path, manifest: &str) {
    let dir = tmp.join("m2/javax/foo/bar/1.0");
    fs::create_dir_all(&dir).unwrap();

    let mut zip = zip::ZipWriter::new(File::create(dir.join("bar-1.0.jar")).unwrap());
    zip.start_file("META-INF/MANIFEST.MF", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(manifest.as_bytes()).unwrap();
    zip.finish().unwrap();
}

#[test]
fn test_cli_scan_help() {
    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("scan").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Build the dependency inventory"));
}

#[test]
fn test_cli_resolve_help() {
    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("resolve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Check the artifacts listed in an inventory file"));
}

#[test]
fn test_cli_audit_help() {
    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("audit").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Scan a source tree"));
}

#[test]
fn test_cli_scan_sample_tree() {
    let out = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("scan")
        .arg(sample_tree())
        .arg("--output-dir")
        .arg(out.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Inventory Summary"));

    let full = fs::read_to_string(out.path().join("full.csv")).unwrap();
    assert!(full.contains("org.osgi,osgi.core,6.0.0,compileOnly,"));
    assert!(full.contains("junit,junit,4.12,testCompile,"));
    assert!(full.contains("javax.foo,bar,1.0,dependency,"));
    assert!(!full.contains("com.liferay.portal"));
    assert!(!full.contains("org.hidden"));

    let duplicated = fs::read_to_string(out.path().join("duplicated.csv")).unwrap();
    assert_eq!(duplicated.lines().count(), 2);
    assert!(duplicated.lines().all(|line| line.starts_with("org.osgi,osgi.core,")));

    let logs = fs::read_to_string(out.path().join("logs.log")).unwrap();
    assert!(logs.contains("Skipping modules/third-party"));
    assert!(logs.contains("Skipping workspaces"));
    assert!(logs.contains("\t[dependencies.properties] Line does not contain dependency: broken=not-a-coordinate"));
    assert!(logs.contains("\t[Gradle] Line does not contain correct dependency:"));
}

#[test]
fn test_cli_scan_is_repeatable() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    for out in [&first, &second] {
        Command::cargo_bin("legacy-audit")
            .unwrap()
            .arg("scan")
            .arg(sample_tree())
            .arg("--output-dir")
            .arg(out.path())
            .assert()
            .success();
    }

    for file in ["full.csv", "duplicated.csv", "logs.log"] {
        assert_eq!(
            fs::read(first.path().join(file)).unwrap(),
            fs::read(second.path().join(file)).unwrap(),
            "{} differs between runs",
            file
        );
    }
}

#[test]
fn test_cli_resolve_writes_findings() {
    let tmp = TempDir::new().unwrap();
    let server = mockito::Server::new();
    let config = write_config(tmp.path(), &server.url());
    write_maven_jar(
        tmp.path(),
        "Manifest-Version: 1.0\nImport-Package: javax.servlet;version=1,org.slf4j\n",
    );

    let inventory = tmp.path().join("full.csv");
    fs::write(
        &inventory,
        "javax.foo,bar,1.0,compile,a/build.gradle\n\
         javax.foo,bar,1.0,dependency,b/dependencies.properties\n\
         org.unknown,missing,9.9,compile,a/build.gradle\n\
         short,line\n",
    )
    .unwrap();
    let findings = tmp.path().join("legacy.log");

    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("resolve")
        .arg("--config")
        .arg(&config)
        .arg("--inventory")
        .arg(&inventory)
        .arg("--project-root")
        .arg(tmp.path())
        .arg("--output")
        .arg(&findings);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Legacy API Summary"));

    assert_eq!(
        fs::read_to_string(&findings).unwrap(),
        "javax.foo:bar:1.0\n\tjavax.servlet;version=1\n"
    );
}

#[test]
fn test_cli_audit_json_summary() {
    let tmp = TempDir::new().unwrap();
    let server = mockito::Server::new();
    let config = write_config(tmp.path(), &server.url());
    write_maven_jar(
        tmp.path(),
        "Manifest-Version: 1.0\nImport-Package: javax.persistence\n",
    );
    let out = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("audit")
        .arg(sample_tree())
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(&out)
        .arg("--json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"flagged\": 1"))
        .stdout(predicate::str::contains("javax.persistence"));

    assert!(out.join("full.csv").is_file());
    assert_eq!(
        fs::read_to_string(out.join("legacy.log")).unwrap(),
        "javax.foo:bar:1.0\n\tjavax.persistence\n"
    );
}

#[test]
fn test_cli_missing_inventory_fails() {
    let tmp = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("resolve")
        .arg("--inventory")
        .arg(tmp.path().join("absent.csv"))
        .arg("--output")
        .arg(tmp.path().join("legacy.log"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_cli_missing_root_fails() {
    let tmp = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("legacy-audit").unwrap();
    cmd.arg("scan")
        .arg(tmp.path().join("absent"))
        .arg("--output-dir")
        .arg(tmp.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Cannot traverse root path"));
}
