//! End-to-end translation tests: conditions, loops, recursion, scoping,
//! and the translator's error taxonomy

use pycpp::cpp::{Block, BlockKind, Stmt};
use pycpp::{Error, Session, Translator};

fn translate(source: &str) -> Result<Block, Error> {
    let mut session = Session::new();
    let mut translator = Translator::new(&mut session);
    translator.translate(source)
}

fn lines(source: &str) -> Vec<String> {
    translate(source).unwrap().translate()
}

fn text(source: &str) -> String {
    lines(source).join("\n")
}

// ====================
// Conditions
// ====================

#[test]
fn test_if_without_else() {
    let out = lines(
        "def clamp(x: Int) -> Int:\n    if x < 0:\n        return 0\n    return x\n",
    );
    assert_eq!(
        out,
        vec![
            "int clamp(int x) {",
            "    if (x < 0) {",
            "        return 0;",
            "    }",
            "    return x;",
            "}"
        ]
    );
}

#[test]
fn test_if_else_renders_two_sibling_blocks() {
    let out = text(
        "def pick(x: Int) -> Int:\n    if x > 0:\n        return 1\n    else:\n        return 2\n",
    );
    assert!(out.contains("if (x > 0) {"));
    assert!(out.contains("else {"));
}

#[test]
fn test_elif_chain_nests_if_inside_else() {
    let block = translate(
        "def grade(x: Int) -> Int:\n    if x > 90:\n        return 1\n    elif x > 80:\n        return 2\n    elif x > 70:\n        return 3\n    else:\n        return 4\n",
    )
    .unwrap();
    let func = match &block.statements[0] {
        Stmt::BlockStmt(b) => b,
        other => panic!("expected function, got {:?}", other),
    };
    // if + else at the top; the else holds the next if + else, recursively
    assert!(matches!(&func.statements[0], Stmt::BlockStmt(b) if matches!(b.kind, BlockKind::If(_))));
    let mut else_block = match &func.statements[1] {
        Stmt::BlockStmt(b) => b,
        other => panic!("expected else, got {:?}", other),
    };
    let mut depth = 0;
    loop {
        assert!(matches!(else_block.kind, BlockKind::Else));
        depth += 1;
        match else_block.statements.as_slice() {
            [Stmt::BlockStmt(inner_if), Stmt::BlockStmt(inner_else)] => {
                assert!(matches!(inner_if.kind, BlockKind::If(_)));
                else_block = inner_else;
            }
            _ => break,
        }
    }
    assert_eq!(depth, 3);
}

#[test]
fn test_ternary_expression() {
    let out = text("def sign(x: Int) -> Int:\n    return 1 if x > 0 else 0\n");
    assert!(out.contains("return x > 0 ? 1 : 0;"));
}

// ====================
// Loops
// ====================

#[test]
fn test_while_loop() {
    let out = lines(
        "def countdown(n: Int) -> Int:\n    while n > 0:\n        n -= 1\n    return n\n",
    );
    assert_eq!(
        out,
        vec![
            "int countdown(int n) {",
            "    while (n > 0) {",
            "        n -= 1;",
            "    }",
            "    return n;",
            "}"
        ]
    );
}

#[test]
fn test_for_range_three_spellings() {
    // range(n), range(a, b), and range(a, b, step) drive the same loop head
    let up = text("def f(n: Int) -> None:\n    for i in range(n):\n        pass\n");
    assert!(up.contains("for (int i = 0; i < n; i++) {"));

    let between = text("def f(n: Int) -> None:\n    for i in range(2, n):\n        pass\n");
    assert!(between.contains("for (int i = 2; i < n; i++) {"));

    let stepped = text("def f(n: Int) -> None:\n    for i in range(0, n, 2):\n        pass\n");
    assert!(stepped.contains("for (int i = 0; i < n; i += 2) {"));
}

#[test]
fn test_for_range_downward() {
    let out = text("def f(n: Int) -> None:\n    for i in range(n, 0, -1):\n        pass\n");
    assert!(out.contains("for (int i = n; i > 0; i--) {"));
}

#[test]
fn test_for_reuses_declared_counter() {
    let out = text(
        "def f(n: Int) -> Int:\n    i: Int = 0\n    for i in range(n):\n        pass\n    return i\n",
    );
    // already declared: the loop head assigns instead of declaring
    assert!(out.contains("for (i = 0; i < n; i++) {"));
}

#[test]
fn test_loop_sum_scenario() {
    let out = lines(
        "def total(n: Int) -> Int:\n    acc: Int = 0\n    for i in range(n):\n        acc += i\n    return acc\n",
    );
    assert_eq!(
        out,
        vec![
            "int total(int n) {",
            "    int acc = 0;",
            "    for (int i = 0; i < n; i++) {",
            "        acc += i;",
            "    }",
            "    return acc;",
            "}"
        ]
    );
}

#[test]
fn test_break_and_continue() {
    let out = text(
        "def f(n: Int) -> None:\n    for i in range(n):\n        if i == 3:\n            break\n        else:\n            continue\n",
    );
    assert!(out.contains("break;"));
    assert!(out.contains("continue;"));
}

// ====================
// Recursion
// ====================

#[test]
fn test_recursive_factorial_scenario() {
    let out = lines(
        "def fact(n: Int) -> Int:\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)\n",
    );
    assert_eq!(
        out,
        vec![
            "int fact(int n) {",
            "    if (n <= 1) {",
            "        return 1;",
            "    }",
            "    return n * fact(n - 1);",
            "}"
        ]
    );
}

#[test]
fn test_mutual_recursion_through_preregistration() {
    let out = text(
        "def is_even(n: Int) -> Int:\n    if n == 0:\n        return 1\n    return is_odd(n - 1)\ndef is_odd(n: Int) -> Int:\n    if n == 0:\n        return 0\n    return is_even(n - 1)\n",
    );
    assert!(out.contains("return is_odd(n - 1);"));
    assert!(out.contains("return is_even(n - 1);"));
}

// ====================
// Scoping
// ====================

#[test]
fn test_inner_scope_shadows_and_pops() {
    let out = text(
        "def f(x: Int) -> Double:\n    if x > 0:\n        y: Double = 1.0\n        x = 2\n    return 1.0\n",
    );
    // the inner declaration stays inside the if block
    assert!(out.contains("        double y = 1.0;"));
    // and referencing it after the block fails
    let err = translate(
        "def f(x: Int) -> Double:\n    if x > 0:\n        y: Double = 1.0\n    return y\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnboundName { name } if name == "y"));
}

#[test]
fn test_translator_survives_failed_translation() {
    let mut session = Session::new();
    let mut translator = Translator::new(&mut session);
    assert!(translator.translate("def f() -> Int:\n    return zzz\n").is_err());
    // a failed run must not corrupt scope or block state for the next one
    let block = translator
        .translate("def f() -> Int:\n    return 7\n")
        .unwrap();
    assert!(block.translate().join("\n").contains("return 7;"));
}

// ====================
// Constants and doc strings
// ====================

#[test]
fn test_const_alias_substitution_with_comment() {
    let out = lines(
        "def area(r: Double) -> Double:\n    pi: \"const\" = 3.14159\n    return pi * r * r\n",
    );
    assert_eq!(
        out,
        vec![
            "double area(double r) {",
            "    // const pi = 3.14159",
            "    return 3.14159 * r * r;",
            "}"
        ]
    );
}

#[test]
fn test_docstring_is_stripped_from_body() {
    let out = text(
        "def f() -> Int:\n    \"adds nothing\"\n    return 1\n",
    );
    assert!(!out.contains("adds nothing"));
    assert!(out.contains("return 1;"));
}

// ====================
// Error taxonomy
// ====================

#[test]
fn test_missing_annotations_batched_in_order() {
    let err = translate("def f(a, b: Int, c) -> Int:\n    return b\n").unwrap_err();
    assert_eq!(
        err,
        Error::MissingAnnotations {
            names: vec!["a".to_string(), "c".to_string()]
        }
    );
}

#[test]
fn test_assignment_before_declaration_fails() {
    let err = translate("def f() -> None:\n    x = 1\n").unwrap_err();
    assert!(matches!(err, Error::UnboundName { name } if name == "x"));
}

#[test]
fn test_declared_then_assigned_is_consistent() {
    let out = text("def f() -> Int:\n    x: Int = 1\n    x = 2\n    return x\n");
    assert!(out.contains("int x = 1;"));
    assert!(out.contains("x = 2;"));
}

#[test]
fn test_import_rejected_with_position() {
    let err = translate("import math\n").unwrap_err();
    match err {
        Error::UnsupportedSyntax { line, .. } => assert_eq!(line, 1),
        other => panic!("expected UnsupportedSyntax, got {:?}", other),
    }
}

#[test]
fn test_chained_assignment_rejected() {
    let err = translate("def f() -> None:\n    a: Int = 0\n    b: Int = 0\n    a = b = 1\n")
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedSyntax { .. }));
}

#[test]
fn test_keyword_call_rejected() {
    let err = translate(
        "def g(x: Int) -> Int:\n    return x\ndef f() -> Int:\n    return g(x=2)\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::KeywordArguments { .. }));
}
