//! CLI integration tests for mpdec-recipe.
//!
//! Nothing here reaches the network or runs a compiler: the tests cover
//! argument handling, planning, metadata and the fetch failure paths.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the mpdec-recipe binary command, isolated from the user's config.
fn mpdec_recipe(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mpdec-recipe").unwrap();
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("MPDEC_RECIPE_FORCE_DOWNLOAD");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

const LINUX_GCC: [&str; 6] = ["--os", "Linux", "--compiler", "gcc", "--arch", "x86_64"];

fn write_project_config(root: &Path, contents: &str) {
    let dir = root.join(".mpdec-recipe");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), contents).unwrap();
}

// ============================================================================
// mpdec-recipe info
// ============================================================================

#[test]
fn test_info_shows_metadata() {
    let tmp = temp_dir();

    mpdec_recipe(tmp.path())
        .arg("info")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("mpdecimal 2.4.2"))
        .stdout(predicate::str::contains("BSD-2-Clause"))
        .stdout(predicate::str::contains("mpdecimal-2.4.2.tar.gz"));
}

#[test]
fn test_info_json() {
    let tmp = temp_dir();

    let output = mpdec_recipe(tmp.path())
        .args(["--message-format", "json", "info"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["reason"], "info");
    assert_eq!(event["recipe"]["name"], "mpdecimal");
    assert_eq!(event["recipe"]["license"], "BSD-2-Clause");
}

// ============================================================================
// mpdec-recipe plan
// ============================================================================

#[test]
fn test_plan_linux_static_uses_autotools() {
    let tmp = temp_dir();

    let output = mpdec_recipe(tmp.path())
        .arg("plan")
        .args(LINUX_GCC)
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["plan"]["kind"], "autotools");
    assert_eq!(doc["settings"]["os"], "Linux");
    assert_eq!(doc["options"]["shared"], false);
    assert!(!doc["patch_rules"].as_array().unwrap().is_empty());

    // Planning never touches the filesystem
    assert!(!tmp.path().join("build").exists());
    assert!(!tmp.path().join("package").exists());
}

#[test]
fn test_plan_msvc_uses_nmake_with_runtime() {
    let tmp = temp_dir();

    let output = mpdec_recipe(tmp.path())
        .args([
            "plan",
            "--os",
            "Windows",
            "--compiler",
            "Visual Studio",
            "--arch",
            "x86",
            "--shared",
            "--runtime",
            "MT",
        ])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["plan"]["kind"], "nmake");
    assert_eq!(doc["settings"]["runtime"], "MT");

    let rules = doc["patch_rules"].as_array().unwrap();
    assert!(rules
        .iter()
        .any(|r| r["kind"] == "token" && r["replacement"] == "${lead}MT"));
    assert!(rules
        .iter()
        .any(|r| r["pattern"] == "2.4.2" && r["replacement"] == "2"));
}

#[test]
fn test_plan_mingw_uses_autotools() {
    let tmp = temp_dir();

    mpdec_recipe(tmp.path())
        .args(["plan", "--os", "Windows", "--compiler", "gcc", "--arch", "x86_64", "--shared"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"autotools\""))
        .stdout(predicate::str::contains("libmpdec-2.dll"));
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_unsupported_arch_fails_before_any_work() {
    let tmp = temp_dir();

    mpdec_recipe(tmp.path())
        .args(["run", "--os", "Linux", "--compiler", "gcc", "--arch", "armv8", "--offline"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported architecture `armv8`"))
        .stderr(predicate::str::contains("help:"));

    assert!(!tmp.path().join("build").exists());
    assert!(!tmp.path().join("package").exists());
}

#[test]
fn test_invalid_runtime_rejected() {
    let tmp = temp_dir();

    mpdec_recipe(tmp.path())
        .args(["plan", "--runtime", "MX"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid runtime"));
}

// ============================================================================
// mpdec-recipe fetch
// ============================================================================

#[test]
fn test_fetch_offline_without_cache_fails() {
    let tmp = temp_dir();
    let cache = tmp.path().join("cache");

    mpdec_recipe(tmp.path())
        .arg("fetch")
        .args(LINUX_GCC)
        .arg("--offline")
        .arg("--cache-dir")
        .arg(&cache)
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline mode"));

    assert!(!tmp.path().join("build").join("source_subfolder").exists());
}

#[test]
fn test_fetch_digest_mismatch_extracts_nothing() {
    let tmp = temp_dir();
    let bogus = tmp.path().join("mpdecimal-2.4.2.tar.gz");
    fs::write(&bogus, b"definitely not the pinned release").unwrap();

    let mirror = url::Url::from_file_path(&bogus).unwrap();
    let cache = tmp.path().join("cache");
    write_project_config(
        tmp.path(),
        &format!(
            "cache_dir = '{}'\n\n[net]\nmirror = '{}'\n",
            cache.display(),
            mirror
        ),
    );

    mpdec_recipe(tmp.path())
        .arg("fetch")
        .args(LINUX_GCC)
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("hash mismatch"))
        .stderr(predicate::str::contains(
            "83c628b90f009470981cf084c5418329c88b19835d8af3691b930afccb7d79c7",
        ));

    assert!(!tmp.path().join("build").join("source_subfolder").exists());
    assert!(!cache.join("mpdecimal-2.4.2.tar.gz").exists());
}

// ============================================================================
// mpdec-recipe patch
// ============================================================================

#[test]
fn test_patch_requires_fetched_sources() {
    let tmp = temp_dir();

    mpdec_recipe(tmp.path())
        .args(["patch", "--check"])
        .args(LINUX_GCC)
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("mpdec-recipe fetch"));
}

// ============================================================================
// mpdec-recipe package-info
// ============================================================================

#[test]
fn test_package_info_for_gcc_static() {
    let tmp = temp_dir();
    let lib = tmp.path().join("package").join("lib");
    fs::create_dir_all(&lib).unwrap();
    fs::write(lib.join("libmpdec.a"), b"!<arch>\n").unwrap();

    let output = mpdec_recipe(tmp.path())
        .arg("package-info")
        .args(LINUX_GCC)
        .arg("--write")
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["libs"], serde_json::json!(["mpdec", "m"]));
    assert_eq!(info["defines"], serde_json::json!([]));
    assert!(tmp.path().join("package").join("cpp_info.json").exists());
}

#[test]
fn test_package_info_for_msvc_shared() {
    let tmp = temp_dir();
    let pkg = tmp.path().join("out");
    fs::create_dir_all(pkg.join("lib")).unwrap();
    fs::write(pkg.join("lib").join("libmpdec-2.lib"), b"lib").unwrap();

    mpdec_recipe(tmp.path())
        .args([
            "package-info",
            "--os",
            "Windows",
            "--compiler",
            "Visual Studio",
            "--arch",
            "x86_64",
            "--shared",
            "--package-dir",
            "out",
        ])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("USE_DLL"))
        .stdout(predicate::str::contains("libmpdec-2"))
        .stdout(predicate::str::contains("\"m\"").not());

    assert!(!pkg.join("cpp_info.json").exists());
}

// ============================================================================
// mpdec-recipe completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    mpdec_recipe(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mpdec-recipe"));
}
