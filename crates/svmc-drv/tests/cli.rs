//! End-to-end tests driving the real `svmc` binary against fixture source
//! files and asserting on the emitted assembly text.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn svmc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_svmc"))
}

#[test]
fn help_output_mentions_usage() {
    svmc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn compiling_fib_writes_an_asm_file_next_to_the_source() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("fib.svm");
    std::fs::copy(fixtures_dir().join("fib.svm"), &input).unwrap();

    svmc().arg(&input).assert().success();

    let asm = std::fs::read_to_string(input.with_extension("asm")).unwrap();
    assert!(asm.starts_with("PUSH 0\nPOP AX\nCALL main\nHLT"));
    assert!(asm.contains("fib:"));
    assert!(asm.contains("CALL fib"));
}

#[test]
fn custom_output_path_is_honored() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.asm");

    svmc()
        .arg(fixtures_dir().join("loop.svm"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn emit_tokens_prints_a_token_dump_to_stdout() {
    svmc()
        .arg(fixtures_dir().join("loop.svm"))
        .arg("--emit")
        .arg("tokens")
        .assert()
        .success()
        .stdout(predicate::str::contains("Keyword"));
}

#[test]
fn emit_ast_prints_a_debug_dump_to_stdout() {
    svmc()
        .arg(fixtures_dir().join("loop.svm"))
        .arg("--emit")
        .arg("ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("FunctionDefinition"));
}

#[test]
fn missing_main_function_is_a_compile_error() {
    svmc()
        .arg(fixtures_dir().join("no_main.svm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("main"));
}

#[test]
fn run_flag_is_rejected_as_unavailable() {
    svmc()
        .arg(fixtures_dir().join("loop.svm"))
        .arg("--run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not available"));
}

#[test]
fn nonexistent_input_file_is_reported() {
    svmc()
        .arg("does-not-exist.svm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
