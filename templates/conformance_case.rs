//! Conformance case binary template.
//!
//! Notes:
//! - Copy this file into the suite's `cases/src/bin/` directory and add a
//!   `[[cases]]` entry pointing at the built binary in the suite manifest.
//! - Keep the check a zero-argument function returning `bool`: `true`
//!   passes, `false` fails, and a panic fails with the panic message.
//! - Ported cases keep their upstream `es5id`; harness-grown cases use a local
//!   `smoke-` slug. Declare the support utilities the case relies on in
//!   `includes`.

use harness_support::case_main;
use harness_support::contract::{Case, CaseMetadata};

const CASE: Case = Case {
    meta: CaseMetadata {
        es5id: "__CASE_ID__",
        description: "__CASE_DESCRIPTION__",
        includes: &["run_test_case"],
    },
    run: check,
};

fn check() -> bool {
    // TODO: fill in the conformance check.
    true
}

case_main!(CASE);
