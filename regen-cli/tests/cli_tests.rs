use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const TERA_CONFIG: &str = r#"
renderer:
  engine: tera
groups:
  - name: Core
    source_dir: Sources/Core
    managed_suffix: .swift
    expansions:
      - template: Sources/Core/Nodes.swift.gyb.template
        subdir: syntax_nodes
        flag: EMIT_KIND
        outputs: { Decl: DeclNodes.swift, Expr: ExprNodes.swift }
"#;

fn regen(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("regen"));
    cmd.current_dir(root).env_remove("RUST_LOG");
    cmd
}

fn project(config: &str) -> TempDir {
    let root = TempDir::new().expect("root");
    let src = root.path().join("Sources/Core");
    fs::create_dir_all(&src).expect("mkdir");
    fs::write(src.join("Tokens.swift.gyb"), "let tokens = {{ 2 * 21 }}\n").unwrap();
    fs::write(src.join("Nodes.swift.gyb.template"), "struct {{ EMIT_KIND }}Node {}\n").unwrap();
    fs::write(root.path().join("regen.yaml"), config).unwrap();
    root
}

fn generated(root: &Path) -> PathBuf {
    root.join("Sources/Core/gyb_generated")
}

#[test]
fn generate_writes_outputs_and_reports_summary() {
    let root = project(TERA_CONFIG);

    regen(root.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(contains("Tokens.swift"))
        .stdout(contains("3 output(s): 3 updated, 0 unchanged"));

    assert_eq!(
        fs::read_to_string(generated(root.path()).join("Tokens.swift")).unwrap(),
        "let tokens = 42\n"
    );
    assert!(generated(root.path()).join("syntax_nodes/ExprNodes.swift").exists());
}

#[test]
fn second_generate_is_a_no_op() {
    let root = project(TERA_CONFIG);
    regen(root.path()).arg("generate").assert().success();

    regen(root.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(contains("0 updated, 3 unchanged, 0 pruned"));
}

#[test]
fn generate_prunes_orphans() {
    let root = project(TERA_CONFIG);
    regen(root.path()).arg("generate").assert().success();
    let stale = generated(root.path()).join("Removed.swift");
    fs::write(&stale, "stale").unwrap();

    regen(root.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(contains("Removed.swift"));
    assert!(!stale.exists());
}

#[test]
fn verify_passes_after_generate() {
    let root = project(TERA_CONFIG);
    regen(root.path()).arg("generate").assert().success();

    regen(root.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(contains("match their templates"));
}

#[test]
fn verify_fails_with_diff_and_hint_on_drift() {
    let root = project(TERA_CONFIG);
    regen(root.path()).arg("generate").assert().success();
    let tokens = generated(root.path()).join("Tokens.swift");
    fs::write(&tokens, "let tokens = 41\n").unwrap();

    regen(root.path())
        .arg("verify")
        .assert()
        .failure()
        .stdout(contains("[Core] Sources/Core/gyb_generated/Tokens.swift"))
        .stdout(contains("-let tokens = 41"))
        .stdout(contains("+let tokens = 42"))
        .stderr(contains("run `regen generate`"));

    assert_eq!(fs::read_to_string(&tokens).unwrap(), "let tokens = 41\n");
}

#[test]
fn verify_checks_configured_file_pairs() {
    let config = format!(
        "{TERA_CONFIG}verify_pairs:\n  - expected: Sources/Core/gyb_generated/Tokens.swift\n    actual: Mirror/Tokens.swift\n"
    );
    let root = project(&config);
    regen(root.path()).arg("generate").assert().success();
    fs::create_dir_all(root.path().join("Mirror")).unwrap();
    fs::write(root.path().join("Mirror/Tokens.swift"), "let tokens = 42\n").unwrap();

    regen(root.path()).arg("verify").assert().success();

    fs::write(root.path().join("Mirror/Tokens.swift"), "let tokens = 0\n").unwrap();
    regen(root.path())
        .arg("verify")
        .assert()
        .failure()
        .stdout(contains("[verify_pairs] Mirror/Tokens.swift"))
        .stdout(contains("+let tokens = 0"));
}

#[test]
fn render_failure_prints_fail_and_exits_non_zero() {
    let root = project(TERA_CONFIG);
    fs::write(root.path().join("Sources/Core/Broken.swift.gyb"), "{% if %}").unwrap();

    regen(root.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(contains("FAIL:"))
        .stderr(contains("Broken.swift.gyb"));

    assert!(
        generated(root.path()).join("Tokens.swift").exists(),
        "siblings still generate"
    );
}

#[test]
fn plan_json_lists_units_without_writing() {
    let root = project(TERA_CONFIG);

    let output = regen(root.path())
        .args(["plan", "--json"])
        .output()
        .expect("run plan");
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let units = doc["units"].as_array().expect("units array");
    assert_eq!(units.len(), 3);
    assert_eq!(units[0]["source"]["output_name"], "Tokens.swift");
    assert_eq!(units[1]["source"]["flags"][0]["value"], "Decl");
    assert!(!generated(root.path()).exists());
}

#[test]
fn missing_config_is_reported() {
    let root = TempDir::new().expect("root");
    regen(root.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(contains("config not found"));
}

#[test]
fn missing_renderer_program_names_the_override() {
    let config = r#"
renderer:
  engine: command
  program: tools/gyb
groups:
  - { name: Core, source_dir: Sources/Core }
"#;
    let root = project(config);

    regen(root.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(contains("--renderer-program"));
    assert!(!generated(root.path()).exists());
}

#[cfg(unix)]
#[test]
fn command_renderer_is_echoed_with_verbose() {
    let config = r#"
renderer:
  engine: command
  program: sh
  args: ["-c", "cp \"$1\" \"$3\"", "render"]
  strip_locations_args: []
groups:
  - { name: Core, source_dir: Sources/Core, destination_dir: out }
"#;
    let root = project(config);

    regen(root.path())
        .args(["generate", "-v", "--jobs", "2"])
        .assert()
        .success()
        .stderr(contains("Tokens.swift.gyb").and(contains("-o")));

    assert_eq!(
        fs::read_to_string(root.path().join("out/Tokens.swift")).unwrap(),
        "let tokens = {{ 2 * 21 }}\n"
    );
}

#[test]
fn zero_jobs_is_rejected_by_the_parser() {
    let root = project(TERA_CONFIG);
    regen(root.path())
        .args(["generate", "--jobs", "0"])
        .assert()
        .failure();
}
