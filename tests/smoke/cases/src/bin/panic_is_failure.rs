use harness_support::case_main;
use harness_support::contract::{Case, CaseMetadata};

const CASE: Case = Case {
    meta: CaseMetadata {
        es5id: "smoke-panic",
        description: "a panicking check is reported as a failure",
        includes: &["run_test_case"],
    },
    run: check,
};

fn check() -> bool {
    panic!("deliberate panic from the smoke suite")
}

case_main!(CASE);
