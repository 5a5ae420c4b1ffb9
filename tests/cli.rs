//! Runs the `mdblog` binary to cover flag and environment handling.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.yml"), "base_url: /from-file\n").unwrap();
    fs::create_dir_all(tmp.path().join("content")).unwrap();
    fs::write(
        tmp.path().join("content/a.md"),
        "[home]({{ base_url }})\n",
    )
    .unwrap();
    tmp
}

fn mdblog(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mdblog"));
    cmd.arg("--config")
        .arg(root.join("config.yml"))
        .env_remove("MDBLOG_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn built_page(root: &Path) -> String {
    fs::read_to_string(root.join("site/a.html")).unwrap()
}

#[test]
fn build_uses_config_base_url() {
    let tmp = site();
    let status = mdblog(tmp.path()).arg("build").status().unwrap();
    assert!(status.success());
    assert!(built_page(tmp.path()).contains(r#"<a href="/from-file/">home</a>"#));
}

#[test]
fn env_base_url_overrides_config() {
    let tmp = site();
    let status = mdblog(tmp.path())
        .arg("build")
        .env("MDBLOG_BASE_URL", "https://env.example")
        .status()
        .unwrap();
    assert!(status.success());
    assert!(built_page(tmp.path()).contains(r#"<a href="https://env.example/">home</a>"#));
}

#[test]
fn flag_base_url_overrides_env() {
    let tmp = site();
    let status = mdblog(tmp.path())
        .args(["build", "--base-url", "https://flag.example/"])
        .env("MDBLOG_BASE_URL", "https://env.example")
        .status()
        .unwrap();
    assert!(status.success());
    let html = built_page(tmp.path());
    assert!(html.contains(r#"<a href="https://flag.example/">home</a>"#));
    assert!(!html.contains("env.example"));
}

#[test]
fn missing_config_exits_non_zero() {
    let tmp = TempDir::new().unwrap();
    let output = mdblog(tmp.path()).arg("build").output().unwrap();
    assert!(!output.status.success());
    assert!(!tmp.path().join("site").exists());
}
