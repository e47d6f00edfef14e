//! ES5-derived conformance cases for the sequence iteration primitive.
//!
//! Ported cases keep their upstream suite `es5id`. The suite manifest at
//! `tests/array/suite.toml` wires each case constant to its built binary.

use harness_support::contract::{Case, CaseMetadata};
use harness_support::sequence::{for_each, for_each_with_arity, CallbackArity};

/// Core check of case 15.4.4.18-7-c-ii-12, parameterized over the fixture
/// and the parameter supply so the degraded supplies stay demonstrable. On
/// every invocation the result flag is set to whether the value exceeds 10
/// and the element read back from the supplied sequence at the supplied
/// index equals that value.
pub fn callback_params_check(fixture: &[i64], arity: CallbackArity) -> bool {
    let mut result = false;
    for_each_with_arity(fixture, arity, |visit| {
        result = *visit.value > 10 && visit.sequence_element() == Some(visit.value);
    });
    result
}

fn foreach_callback_params() -> bool {
    callback_params_check(&[11], CallbackArity::ValueIndexSequence)
}

/// The iteration callback receives all three parameters, with correct
/// values, over the one-element fixture `[11]`.
pub const FOREACH_CALLBACK_PARAMS: Case = Case {
    meta: CaseMetadata {
        es5id: "15.4.4.18-7-c-ii-12",
        description: "iteration callback is called with three parameters",
        includes: &["run_test_case", "sequence"],
    },
    run: foreach_callback_params,
};

fn foreach_visit_parameters() -> bool {
    let fixture = [8_i64, 13, 21];
    let mut visited = 0usize;
    let mut all_matched = true;
    for_each(&fixture, |visit| {
        all_matched = all_matched
            && visit.index == Some(visited)
            && visit.sequence_element() == Some(visit.value);
        visited += 1;
    });
    all_matched && visited == fixture.len()
}

/// Sibling check: parameter values stay correct across every element of a
/// multi-element fixture.
pub const FOREACH_VISIT_PARAMETERS: Case = Case {
    meta: CaseMetadata {
        es5id: "15.4.4.18-7-c-ii-1",
        description: "iteration callback receives correct parameter values for every element",
        includes: &["run_test_case", "sequence"],
    },
    run: foreach_visit_parameters,
};
