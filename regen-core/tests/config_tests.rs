//! Config loading error messages, path resolution, and validation tests.

use std::path::PathBuf;

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use regen_core::{
    config::{self, RendererConfig},
    ConfigError, OutputName,
};
use rstest::rstest;

const FULL: &str = r#"
template_suffix: .gyb
jobs: 4
renderer:
  engine: command
  program: ../swift/utils/gyb
  interpreter: python3
  env:
    SWIFT_BUILD_SCRIPT_ENVIRONMENT: "1"
groups:
  - name: SwiftSyntax
    source_dir: Sources/SwiftSyntax
    managed_suffix: .swift
    keep: [README.md]
    expansions:
      - template: Sources/SwiftSyntax/SyntaxNodes.swift.gyb.template
        subdir: syntax_nodes
        flag: EMIT_KIND
        outputs:
          Decl: SyntaxDeclNodes.swift
          Expr: SyntaxExprNodes.swift
  - name: Builder
    source_dir: Sources/Builder
    destination_dir: Sources/Builder/generated
"#;

fn scaffold(root: &assert_fs::TempDir) {
    root.child("Sources/SwiftSyntax/SyntaxNodes.swift.gyb.template")
        .write_str("% for kind in kinds:\n")
        .expect("template");
    root.child("Sources/Builder").create_dir_all().expect("mkdir");
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_mentions_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(&root.path().join("regen.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("regen.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("regen.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed").expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("regen.yaml"), "must contain file path, got: {err}");
}

#[rstest]
#[case::unknown_engine("renderer:\n  engine: jinja\n")]
#[case::missing_renderer("groups: []\n")]
#[case::list_root("- just a list\n")]
fn structurally_wrong_config_is_a_parse_error(#[case] yaml: &str) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("regen.yaml");
    file.write_str(yaml).expect("write");
    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Resolution
// ---------------------------------------------------------------------------

#[test]
fn full_config_resolves_every_path_against_config_dir() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    scaffold(&root);
    let file = root.child("regen.yaml");
    file.write_str(FULL).expect("write");

    let layout = config::load_at(file.path()).expect("load");
    assert_eq!(layout.root, root.path());
    assert_eq!(layout.jobs, Some(4));
    assert_eq!(layout.groups.len(), 2);

    let syntax = &layout.groups[0];
    assert_eq!(syntax.destination_dir, root.path().join("Sources/SwiftSyntax/gyb_generated"));
    assert_eq!(syntax.managed_suffix.as_deref(), Some(".swift"));
    assert!(syntax.keep.contains("README.md"));

    let exp = &syntax.expansions[0];
    assert_eq!(syntax.expansion_dir(exp), syntax.destination_dir.join("syntax_nodes"));
    assert_eq!(exp.outputs.get("Decl"), Some(&OutputName::from("SyntaxDeclNodes.swift")));
    assert!(exp.allow_list().contains("SyntaxExprNodes.swift"));

    let builder = &layout.groups[1];
    assert_eq!(builder.destination_dir, root.path().join("Sources/Builder/generated"));

    match &layout.renderer {
        RendererConfig::Command(cmd) => {
            assert_eq!(cmd.program, root.path().join("../swift/utils/gyb"));
            assert_eq!(cmd.interpreter, Some(PathBuf::from("python3")));
            assert_eq!(cmd.env.get("SWIFT_BUILD_SCRIPT_ENVIRONMENT").map(String::as_str), Some("1"));
        }
        other => panic!("expected command renderer, got {other:?}"),
    }
}

#[test]
fn cli_overrides_replace_jobs_and_program() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    scaffold(&root);
    let file = root.child("regen.yaml");
    file.write_str(FULL).expect("write");

    let layout = config::load_at(file.path())
        .expect("load")
        .with_jobs(Some(1))
        .with_renderer_program(Some(PathBuf::from("/opt/gyb")));
    assert_eq!(layout.jobs, Some(1));
    match layout.renderer {
        RendererConfig::Command(cmd) => assert_eq!(cmd.program, PathBuf::from("/opt/gyb")),
        other => panic!("expected command renderer, got {other:?}"),
    }
}

#[test]
fn missing_expansion_template_is_rejected() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("Sources/SwiftSyntax").create_dir_all().expect("mkdir");
    root.child("Sources/Builder").create_dir_all().expect("mkdir");
    let file = root.child("regen.yaml");
    file.write_str(FULL).expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TemplateMissing { .. }), "got: {err}");
    assert!(err.to_string().contains("SyntaxNodes.swift.gyb.template"));
}

#[test]
fn tera_engine_defaults_comment_prefix() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("templates").create_dir_all().expect("mkdir");
    let file = root.child("regen.yaml");
    file.write_str("renderer:\n  engine: tera\ngroups:\n  - name: t\n    source_dir: templates\n")
        .expect("write");

    let layout = config::load_at(file.path()).expect("load");
    match layout.renderer {
        RendererConfig::Tera(tera) => assert_eq!(tera.comment_prefix, "//"),
        other => panic!("expected tera renderer, got {other:?}"),
    }
    root.child("templates/gyb_generated").assert(predicate::path::missing());
}

#[test]
fn zero_jobs_is_rejected() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("regen.yaml");
    file.write_str("jobs: 0\nrenderer:\n  engine: tera\n").expect("write");
    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidGroup { .. }), "got: {err}");
}

#[rstest]
#[case::empty("\"\"")]
#[case::slash("Sources/Core")]
#[case::parent("..")]
#[case::current(".")]
#[case::backslash("a\\\\b")]
fn group_names_must_be_usable_as_directory_names(#[case] name: &str) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("templates").create_dir_all().expect("mkdir");
    let file = root.child("regen.yaml");
    file.write_str(&format!(
        "renderer:\n  engine: tera\ngroups:\n  - name: {name}\n    source_dir: templates\n"
    ))
    .expect("write");
    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidGroup { .. }), "got: {err}");
}
