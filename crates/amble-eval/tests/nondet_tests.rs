//! Integration tests for non-deterministic evaluation.
//!
//! Covers: `amb` ordering and laziness, `require`, `cut`, branch
//! isolation of assignments, choices inside loops and functions, the
//! SICP search prelude and classic puzzles.

use amble_eval::{create_context, format_diagnostics, resume, run, Options, Outcome, Value};
use amble_types::ErrorCode;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Every solution, in order. The run must end in `Finished(undefined)`.
fn solutions(source: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut outcome = run(source, create_context(4), &Options::default());
    loop {
        match outcome {
            Outcome::SuspendedChoice(suspended) => {
                values.push(suspended.value.clone());
                outcome = resume(suspended);
            }
            Outcome::Finished { value, .. } => {
                assert_eq!(value, Value::Undefined);
                return values;
            }
            Outcome::Errored { diagnostics, .. } => {
                panic!("run failed:\n{}", format_diagnostics(&diagnostics, true))
            }
        }
    }
}

/// The first `n` solutions of a possibly unbounded search.
fn first_solutions(source: &str, n: usize) -> Vec<Value> {
    let mut values = Vec::new();
    let mut outcome = run(source, create_context(4), &Options::default());
    while values.len() < n {
        let Outcome::SuspendedChoice(suspended) = outcome else {
            panic!("search ended after {} solutions", values.len());
        };
        values.push(suspended.value.clone());
        outcome = resume(suspended);
    }
    values
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn nums(ns: &[f64]) -> Vec<Value> {
    ns.iter().copied().map(Value::Number).collect()
}

fn list(items: Vec<Value>) -> Value {
    Value::list(items)
}

// ══════════════════════════════════════════════════════════════════════════════
// amb
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_deterministic_program_has_one_solution() {
    assert_eq!(solutions("1 + 4 - 10 * 5;"), nums(&[-45.0]));
}

#[test]
fn test_amb_yields_alternatives_in_order() {
    assert_eq!(solutions("amb(1, 4 + 5, 3 - 10);"), nums(&[1.0, 9.0, -7.0]));
}

#[test]
fn test_amb_without_alternatives_fails() {
    assert_eq!(solutions("amb();"), vec![]);
    assert_eq!(solutions("list(amb());"), vec![]);
    assert_eq!(solutions("amb(1, amb(), 2);"), nums(&[1.0, 2.0]));
}

#[test]
fn test_operands_vary_rightmost_fastest() {
    assert_eq!(
        solutions("amb(1, 2) * 10 + amb(3, 4);"),
        nums(&[13.0, 14.0, 23.0, 24.0])
    );
    assert_eq!(
        solutions("list(amb(1, 2), amb(3, 4));"),
        vec![
            list(nums(&[1.0, 3.0])),
            list(nums(&[1.0, 4.0])),
            list(nums(&[2.0, 3.0])),
            list(nums(&[2.0, 4.0])),
        ]
    );
}

#[test]
fn test_amb_in_conditional_expression() {
    assert_eq!(solutions("amb(false, true) ? 4 - 10 : 6;"), nums(&[6.0, -6.0]));
}

#[test]
fn test_amb_in_if_statement() {
    let source = "
        if (amb(true, false)) {
            -100;
        } else {
            200 / 2;
            210;
        }
    ";
    assert_eq!(solutions(source), nums(&[-100.0, 210.0]));
}

#[test]
fn test_nested_amb_in_branches() {
    let source = r#"
        if (amb(100 * 2 === 2, 40 % 2 === 0)) {
            amb(false, 'test' === 'test') ? amb(false === false, false) ? "hello" : false : amb(5, "world");
        } else {
            9 * 10 / 5;
        }
    "#;
    assert_eq!(
        solutions(source),
        vec![
            num(18.0),
            num(5.0),
            Value::from("world"),
            Value::from("hello"),
            Value::Bool(false),
        ]
    );
}

#[test]
fn test_amb_alternatives_are_evaluated_lazily() {
    let outcome = run(
        "const x = amb(1, 2, 3); display(x);",
        create_context(4),
        &Options::default(),
    );
    let Outcome::SuspendedChoice(suspended) = outcome else {
        panic!("expected a suspension");
    };
    assert_eq!(suspended.context().output(), ["1"]);
    let Outcome::SuspendedChoice(suspended) = resume(suspended) else {
        panic!("expected a suspension");
    };
    assert_eq!(suspended.context().output(), ["1", "2"]);
}

#[test]
fn test_error_in_later_branch() {
    let mut outcome = run(
        "const x = amb(1, 0); x === 1 ? x : undefined_name;",
        create_context(4),
        &Options::default(),
    );
    let Outcome::SuspendedChoice(suspended) = outcome else {
        panic!("expected a suspension");
    };
    assert_eq!(suspended.value, num(1.0));
    outcome = resume(suspended);
    match outcome {
        Outcome::Errored { diagnostics, .. } => {
            assert_eq!(diagnostics[0].code, ErrorCode::UNDEFINED_VARIABLE)
        }
        other => panic!("expected an error, got {}", other.status()),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Branch isolation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_assignments_are_undone_on_backtrack() {
    assert_eq!(
        solutions("let a = amb(1, 2); a = amb(4, 5); a;"),
        nums(&[4.0, 5.0, 4.0, 5.0])
    );
}

#[test]
fn test_side_effects_do_not_leak_between_branches() {
    let source = "
        let log = null;
        const x = amb(1, 2, 3);
        log = pair(x, log);
        log;
    ";
    assert_eq!(
        solutions(source),
        vec![
            list(nums(&[1.0])),
            list(nums(&[2.0])),
            list(nums(&[3.0])),
        ]
    );
}

#[test]
fn test_mutation_inside_alternative_is_undone() {
    let source = "
        let x = 0;
        function bump() {
            x = x + 1;
            return x;
        }
        amb(bump(), bump());
    ";
    assert_eq!(solutions(source), nums(&[1.0, 1.0]));
}

#[test]
fn test_choices_inside_loop_iterations() {
    let source = "
        let total = 0;
        for (let i = 0; i < 2; i = i + 1) {
            total = total + amb(0, 1);
        }
        total;
    ";
    assert_eq!(solutions(source), nums(&[0.0, 1.0, 1.0, 2.0]));
}

#[test]
fn test_choices_inside_while_loop() {
    let source = "
        let n = 0;
        let steps = 0;
        while (n < 2) {
            n = n + amb(1, 2);
            steps = steps + 1;
        }
        steps;
    ";
    // 1+1, 1+2, 2
    assert_eq!(solutions(source), nums(&[2.0, 2.0, 1.0]));
}

// ══════════════════════════════════════════════════════════════════════════════
// require
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_require_filters_solutions() {
    let source = "
        const integer = int_between(5, 10);
        require(integer % 3 === 0);
        integer;
    ";
    assert_eq!(solutions(source), nums(&[6.0, 9.0]));
}

#[test]
fn test_require_true_yields_undefined() {
    assert_eq!(solutions("require(true);"), vec![Value::Undefined]);
    assert_eq!(solutions("require(false);"), vec![]);
}

#[test]
fn test_require_inside_function() {
    let source = "
        function odd_between(low, high) {
            const n = int_between(low, high);
            require(n % 2 === 1);
            return n;
        }
        odd_between(1, 6);
    ";
    assert_eq!(solutions(source), nums(&[1.0, 3.0, 5.0]));
}

// ══════════════════════════════════════════════════════════════════════════════
// cut
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_cut_commits_to_earlier_choices() {
    assert_eq!(
        solutions("const f = amb(1, 2, 3); cut; f + amb(4, 5, 6);"),
        nums(&[5.0, 6.0, 7.0])
    );
}

#[test]
fn test_trailing_cut_yields_undefined() {
    assert_eq!(solutions("amb(1, 2); cut;"), vec![Value::Undefined]);
}

#[test]
fn test_cut_inside_function_body() {
    let source = "
        function first_of(xs) {
            const x = an_element_of(xs);
            cut;
            return x;
        }
        first_of(list(7, 8, 9));
    ";
    assert_eq!(solutions(source), nums(&[7.0]));
}

#[test]
fn test_cut_is_scoped_to_its_block() {
    let source = "
        const a = amb(1, 2);
        {
            const b = amb(3, 4);
            cut;
            a * b;
        }
    ";
    assert_eq!(solutions(source), nums(&[3.0, 6.0]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Prelude searches
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_an_element_of() {
    assert_eq!(
        solutions("an_element_of(list(1, 2, list(3, 4)));"),
        vec![num(1.0), num(2.0), list(nums(&[3.0, 4.0]))]
    );
    assert_eq!(solutions("an_element_of(null);"), vec![]);
}

#[test]
fn test_an_integer_starting_from_is_unbounded() {
    let source = "
        const n = an_integer_starting_from(1);
        require(n * n > 50);
        n;
    ";
    assert_eq!(first_solutions(source, 3), nums(&[8.0, 9.0, 10.0]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Puzzles
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_pythagorean_triples() {
    let source = "
        function a_pythagorean_triple_between(low, high) {
            const i = int_between(low, high);
            const j = int_between(i, high);
            const k = int_between(j, high);
            require(i * i + j * j === k * k);
            return list(i, j, k);
        }
        a_pythagorean_triple_between(1, 10);
    ";
    assert_eq!(
        solutions(source),
        vec![list(nums(&[3.0, 4.0, 5.0])), list(nums(&[6.0, 8.0, 10.0]))]
    );
}

#[test]
fn test_multiple_dwelling() {
    let source = r#"
        function multiple_dwelling() {
            const baker = amb(1, 2, 3, 4, 5);
            const cooper = amb(1, 2, 3, 4, 5);
            const fletcher = amb(1, 2, 3, 4, 5);
            const miller = amb(1, 2, 3, 4, 5);
            const smith = amb(1, 2, 3, 4, 5);
            require(distinct(list(baker, cooper, fletcher, miller, smith)));
            require(!(baker === 5));
            require(!(cooper === 1));
            require(!(fletcher === 5));
            require(!(fletcher === 1));
            require(miller > cooper);
            require(!(math_abs(smith - fletcher) === 1));
            require(!(math_abs(fletcher - cooper) === 1));
            return list(list("baker", baker), list("cooper", cooper),
                        list("fletcher", fletcher), list("miller", miller),
                        list("smith", smith));
        }
        multiple_dwelling();
    "#;
    let floor = |name: &str, n: f64| list(vec![Value::from(name), num(n)]);
    assert_eq!(
        solutions(source),
        vec![list(vec![
            floor("baker", 3.0),
            floor("cooper", 2.0),
            floor("fletcher", 4.0),
            floor("miller", 5.0),
            floor("smith", 1.0),
        ])]
    );
}
