//! End-to-end checks that the case binaries honor the exit contract the
//! suite runner interprets.
//!
//! Tests cover:
//! - Exit status 0 plus a PASS line naming the es5id
//! - Binaries behaving the same under a harness-prepared environment

use std::process::Command;

use harness_support::env::{ENV_CASE_NAME, ENV_RUN_ID};
use harness_support::{ensure_success, run_command};

#[test]
fn callback_params_binary_reports_pass() {
    let command = Command::new(env!("CARGO_BIN_EXE_foreach_callback_params"));
    let output = run_command(command).expect("run foreach_callback_params");
    ensure_success(&output, "foreach_callback_params").expect("case should pass");
    assert_eq!(output.trimmed_stdout(), "PASS: 15.4.4.18-7-c-ii-12");
}

#[test]
fn visit_parameters_binary_reports_pass() {
    let command = Command::new(env!("CARGO_BIN_EXE_foreach_visit_parameters"));
    let output = run_command(command).expect("run foreach_visit_parameters");
    ensure_success(&output, "foreach_visit_parameters").expect("case should pass");
    assert_eq!(output.trimmed_stdout(), "PASS: 15.4.4.18-7-c-ii-1");
}

#[test]
fn binaries_pass_under_a_prepared_environment() {
    let mut command = Command::new(env!("CARGO_BIN_EXE_foreach_callback_params"));
    command.env(ENV_RUN_ID, "itest-run");
    command.env(ENV_CASE_NAME, "foreach-callback-params");

    let output = run_command(command).expect("run with harness environment");
    ensure_success(&output, "foreach_callback_params under harness env")
        .expect("case should pass");
    assert_eq!(output.trimmed_stdout(), "PASS: 15.4.4.18-7-c-ii-12");
}
