//! Drives the `cast-migrate` binary against temporary source trees.

use std::path::Path;
use std::process::{Command, Output};

fn cast_migrate(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cast-migrate"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "off")
        .output()
        .expect("binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const NESTED: &str = "void chain(mlir::Value v) {\n  auto x = v.cast<A>().cast<B>();\n}\n";

#[test]
fn check_reports_and_exits_cleanly_for_warnings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.cpp"), NESTED).unwrap();

    let out = cast_migrate(&["check", "a.cpp"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("a.cpp:2:12: warning: functional-casts:"));
    assert!(text.contains("2 diagnostics for a.cpp"));

    let out = cast_migrate(&["check", "--deny-warnings", "a.cpp"], dir.path());
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn json_output_carries_replacements() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.cpp"), NESTED).unwrap();

    let out = cast_migrate(&["--format", "json", "a.cpp"], dir.path());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid json");
    let replacements: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["replacement"].as_str().unwrap())
        .collect();
    assert!(replacements.contains(&"llvm::cast<A>(v)"));
    assert!(replacements.contains(&"llvm::cast<B>(v.cast<A>())"));
    assert_eq!(json[0]["lint"], "functional-casts");
}

#[test]
fn error_level_from_config_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cast-migrate.toml"), "[check]\nlevel = \"error\"\n").unwrap();
    std::fs::write(dir.path().join("a.cpp"), NESTED).unwrap();

    let out = cast_migrate(&["--format", "github", "a.cpp"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).starts_with("::error file=a.cpp,line=2,col=12,"));
}

#[test]
fn fix_rewrites_in_place_and_keeps_a_backup() {
    let dir = tempfile::tempdir().unwrap();
    let src_dir = dir.path().join("src");
    std::fs::create_dir(&src_dir).unwrap();
    std::fs::write(src_dir.join("a.cpp"), NESTED).unwrap();
    std::fs::write(src_dir.join("notes.txt"), "x.cast<A>()").unwrap();

    let out = cast_migrate(&["check", "--fix", "src"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("Applied 2 fix(es) to 1 file(s)"));

    let fixed = std::fs::read_to_string(src_dir.join("a.cpp")).unwrap();
    assert_eq!(
        fixed,
        "void chain(mlir::Value v) {\n  auto x = llvm::cast<B>(llvm::cast<A>(v));\n}\n"
    );
    assert_eq!(std::fs::read_to_string(src_dir.join("a.cpp.bak")).unwrap(), NESTED);
    assert_eq!(
        std::fs::read_to_string(src_dir.join("notes.txt")).unwrap(),
        "x.cast<A>()"
    );
}

#[test]
fn dry_run_prints_a_diff_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.cpp"), NESTED).unwrap();

    let out = cast_migrate(&["check", "--fix-dry-run", "a.cpp"], dir.path());
    let text = stdout(&out);
    assert!(text.contains("-  auto x = v.cast<A>().cast<B>();"));
    assert!(text.contains("+  auto x = llvm::cast<B>(llvm::cast<A>(v));"));
    assert_eq!(std::fs::read_to_string(dir.path().join("a.cpp")).unwrap(), NESTED);
    assert!(!dir.path().join("a.cpp.bak").exists());
}

#[test]
fn dry_run_diff_of_a_multi_line_chain_leaves_later_lines_alone() {
    let source = "void f(mlir::Value v) {\n  auto t = v.getType()\n      .cast<FooType>();\n  int a = 1;\n  int b = 2;\n  int c = 3;\n  int d = 4;\n  int e = 5;\n}\n";
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("chain.cpp"), source).unwrap();

    let out = cast_migrate(&["check", "--fix-dry-run", "chain.cpp"], dir.path());
    let text = stdout(&out);
    assert!(text.contains("+  auto t = llvm::cast<FooType>(v.getType());"));
    assert!(text.contains("-      .cast<FooType>();"));
    assert!(!text.contains("-  int e = 5;"));
    assert!(!text.contains("+  int a = 1;"));
    assert_eq!(std::fs::read_to_string(dir.path().join("chain.cpp")).unwrap(), source);
}

#[test]
fn apply_matches_fixes_listed_calls() {
    let dir = tempfile::tempdir().unwrap();
    let source = "auto *a = pu.dyn_cast<A *>();\n";
    std::fs::write(dir.path().join("a.cpp"), source).unwrap();
    std::fs::write(
        dir.path().join("matches.json"),
        r#"[{"file": "a.cpp", "start_byte": 10, "end_byte": 28, "member_name": "dyn_cast",
             "is_arrow_access": false, "family": "::llvm::PointerUnion"}]"#,
    )
    .unwrap();

    let out = cast_migrate(&["apply-matches", "matches.json", "--fix", "--no-backup"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.cpp")).unwrap(),
        "auto *a = llvm::dyn_cast_if_present<A *>(pu);\n"
    );
    assert!(!dir.path().join("a.cpp.bak").exists());
}

#[test]
fn rewrite_subcommand_prints_replacement() {
    let dir = tempfile::tempdir().unwrap();
    let out = cast_migrate(&["rewrite", "Ptr->cast<Bar>()", "--arrow"], dir.path());
    assert_eq!(stdout(&out).trim(), "llvm::cast<Bar>(*Ptr)");
}

#[test]
fn unknown_family_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let out = cast_migrate(&["rewrite", "x.cast<T>()", "--family", "::mlir::Location"], dir.path());
    assert_eq!(out.status.code(), Some(2));
}
