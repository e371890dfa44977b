//! End-to-end scenarios and cross-cutting invariants over the public
//! `Compiler`/`CompiledModel`/`Cursor` surface. Table-driven cases use
//! `rstest`, the teacher's table-testing dependency.

use std::rc::Rc;

use cmv::{tokenize, CompiledModel, Compiler};
use rstest::rstest;

fn compiled(expr: &str) -> Rc<CompiledModel> {
    let mut compiler = Compiler::new("scenario");
    compiler.parse(expr).unwrap();
    compiler.compile().unwrap()
}

fn run(model: &Rc<CompiledModel>, input: &str) -> bool {
    let mut cursor = model.initial_state();
    for token in tokenize(input) {
        if !cursor.step(token) {
            return false;
        }
    }
    cursor.accepting()
}

#[rstest]
#[case("a?,b", "a,b", true)]
#[case("a?,b", "b", true)]
#[case("a?,b", "a", false)]
#[case("a?,b", "a,b,b", false)]
fn scenario_1_optional_then_required(#[case] expr: &str, #[case] input: &str, #[case] expected: bool) {
    assert_eq!(run(&compiled(expr), input), expected);
}

#[rstest]
#[case("(a|b)+", "a,b,a,a,a,b,b", true)]
#[case("(a|b)+", "", false)]
#[case("(a|b)+", "c", false)]
fn scenario_2_plus_over_alternation(#[case] expr: &str, #[case] input: &str, #[case] expected: bool) {
    assert_eq!(run(&compiled(expr), input), expected);
}

#[test]
fn scenario_3_nested_counted_ranges() {
    let model = compiled("(a[2,3],b[2,3])[5,6]");
    let six_reps = "a,a,b,b, a,a,a,b,b,b, a,a,b,b,b, a,a,a,b,b, a,a,a,b,b,b";
    assert!(run(&model, six_reps));

    let five_reps = "a,a,b,b, a,a,a,b,b,b, a,a,b,b,b, a,a,a,b,b";
    assert!(!run(&model, five_reps));
}

#[rstest]
#[case("a?,b?,c?", "a,b,c", true)]
#[case("a?,b?,c?", "a,c", true)]
#[case("a?,b?,c?", "", true)]
#[case("a?,b?,c?", "b,a", false)]
#[case("a?,b?,c?", "a,a", false)]
fn scenario_4_all_optional_concat(#[case] expr: &str, #[case] input: &str, #[case] expected: bool) {
    assert_eq!(run(&compiled(expr), input), expected);
}

#[test]
fn scenario_5_mixed_alternation_of_groups() {
    let model = compiled("((a?,b?,h,i)|(c*,d?,k)+|e|(f,g))");
    assert!(run(&model, "c,c,c,c,d,k"));
    assert!(run(&model, "c,d,k,k,d,k,c,c,c,d,k"));
    assert!(!run(&model, "c,d,k,k,d,c,c,c,d,k"));
}

#[rstest]
#[case("a*|(a,b)")]
#[case("(a,b)|(a,c)")]
#[case("(a|b)*,a,b,b")]
#[case("a[5,6]|a")]
#[case("a[2,4],(a|b)[1,1],(a,b,c?)*")]
fn scenario_6_ambiguous_expressions_reject_at_compile(#[case] expr: &str) {
    let mut compiler = Compiler::new("scenario");
    compiler.parse(expr).unwrap();
    assert!(compiler.compile().is_err());
}

#[test]
fn nullability_matches_acceptance_at_start() {
    let nullable = compiled("a?");
    assert!(nullable.initial_state().accepting());

    let non_nullable = compiled("a");
    assert!(!non_nullable.initial_state().accepting());
}

#[test]
fn empty_input_law() {
    assert!(run(&compiled("a?,b?"), ""));
    assert!(!run(&compiled("a,b"), ""));
}

#[test]
fn valid_lookahead_is_non_destructive() {
    let model = compiled("a,b");
    let cursor = model.initial_state();
    assert!(cursor.valid("a"));
    assert!(cursor.valid("a"));
    assert!(!cursor.accepting());
}

#[test]
fn range_counter_rejects_above_max() {
    let model = compiled("a[2,3]");
    let mut cursor = model.initial_state();
    assert!(cursor.step("a"));
    assert!(cursor.step("a"));
    assert!(cursor.step("a"));
    assert!(!cursor.step("a"));
}

#[rstest]
#[case("X[0,1]", "X?")]
#[case("X[0,*]", "X*")]
#[case("X[1,*]", "X+")]
#[case("X[1,1]", "X")]
fn reduction_law_matches_shorthand(#[case] ranged: &str, #[case] shorthand: &str) {
    let a = compiled(ranged);
    let b = compiled(shorthand);
    for input in ["", "X", "X,X", "X,X,X"] {
        assert_eq!(run(&a, input), run(&b, input), "mismatch on input {input:?}");
    }
}

#[test]
fn interleave_commutativity() {
    let forward = compiled("a & b & c");
    let reversed = compiled("c & b & a");
    for input in ["a,b,c", "c,b,a", "b,a,c", "a,b", "a,b,c,a"] {
        assert_eq!(run(&forward, input), run(&reversed, input), "mismatch on input {input:?}");
    }
}
