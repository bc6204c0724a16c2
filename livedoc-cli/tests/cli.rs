use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn document(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn exits_zero_when_everything_holds() {
    let dir = tempfile::tempdir().unwrap();
    let source = document(dir.path(), "ok.md", "[2](- \"1 + 1 == TEXT\")\n");
    let output = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("livedoc");
    cmd.current_dir(dir.path())
        .arg(&source)
        .arg("--output")
        .arg(&output);
    cmd.assert().code(0);

    let html = fs::read_to_string(output.join("ok.html")).unwrap();
    assert!(html.contains("<span class=\"success\">2</span>"));
}

#[test]
fn exits_one_on_failed_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let source = document(dir.path(), "bad.md", "[3](- \"1 + 1 == TEXT\")\n");

    let mut cmd = cargo_bin_cmd!("livedoc");
    cmd.current_dir(dir.path()).arg(&source).arg("-o").arg("out");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("bad.md - <main>... FAIL"));
}

#[test]
fn exits_two_on_exception_and_writes_junit() {
    let dir = tempfile::tempdir().unwrap();
    let source = document(dir.path(), "boom.html", "<p><a href=\"-\" title=\"5 / 0\">x</a></p>");

    let mut cmd = cargo_bin_cmd!("livedoc");
    cmd.current_dir(dir.path())
        .arg(&source)
        .arg("-o")
        .arg("out")
        .arg("--junit")
        .arg("reports");
    cmd.assert().code(2);

    let xml = fs::read_to_string(dir.path().join("reports").join("boom.xml")).unwrap();
    assert!(xml.contains("errors=\"1\""));
    assert!(xml.contains("raised: division by zero"));
}

#[test]
fn config_file_selects_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    document(dir.path(), "doc.md", "[1](- \"1 == 1\")\n");
    let config = document(dir.path(), "custom.toml", "[output]\ndirectory = \"site\"\n");

    let mut cmd = cargo_bin_cmd!("livedoc");
    cmd.current_dir(dir.path())
        .arg("doc.md")
        .arg("--config")
        .arg(&config)
        .arg("--quiet");
    cmd.assert().code(0);
    assert!(dir.path().join("site").join("doc.html").is_file());
}

#[test]
fn exits_three_when_source_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("livedoc");
    cmd.current_dir(dir.path()).arg("missing.md");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn exits_three_on_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    document(dir.path(), "doc.md", "text\n");
    let mut cmd = cargo_bin_cmd!("livedoc");
    cmd.current_dir(dir.path())
        .arg("doc.md")
        .arg("-c")
        .arg("nope.toml");
    cmd.assert().code(3);
}
