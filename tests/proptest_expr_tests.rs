//! Property tests for expression rendering: for arbitrary expression trees
//! the rendered C++ must be re-parseable with the standard precedence table
//! and evaluate to the same value as the tree itself

use proptest::prelude::*;
use pycpp::cpp::{BinaryOp, Expr};

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = (0i64..100).prop_map(Expr::int);
    leaf.prop_recursive(5, 64, 2, |inner| {
        (
            prop_oneof![
                Just(BinaryOp::Add),
                Just(BinaryOp::Sub),
                Just(BinaryOp::Mul),
            ],
            inner.clone(),
            inner,
        )
            .prop_map(|(op, left, right)| Expr::binary(op, left, right))
    })
}

// =============================================================================
// REFERENCE EVALUATOR AND RE-PARSER
// =============================================================================

/// Evaluates the tree directly (wrapping arithmetic; both sides use it)
fn eval_tree(e: &Expr) -> i64 {
    match e {
        Expr::Const(pycpp::cpp::Literal::Int(v)) => *v,
        Expr::Binary { op, left, right } => {
            let l = eval_tree(left);
            let r = eval_tree(right);
            match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                other => panic!("unexpected operator {:?}", other),
            }
        }
        other => panic!("unexpected node {:?}", other),
    }
}

/// Minimal precedence-climbing parser over the rendered text, following the
/// C precedence table the renderer targets
struct TextParser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> TextParser<'a> {
    fn new(text: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let len = match rest.as_bytes()[0] {
                b'(' | b')' | b'+' | b'-' | b'*' => 1,
                _ => rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len()),
            };
            tokens.push(&rest[..len]);
            rest = &rest[len..];
        }
        TextParser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn parse_expr(&mut self) -> i64 {
        self.parse_add()
    }

    fn parse_add(&mut self) -> i64 {
        let mut value = self.parse_mul();
        while let Some(op @ ("+" | "-")) = self.peek() {
            self.pos += 1;
            let rhs = self.parse_mul();
            value = if op == "+" {
                value.wrapping_add(rhs)
            } else {
                value.wrapping_sub(rhs)
            };
        }
        value
    }

    fn parse_mul(&mut self) -> i64 {
        let mut value = self.parse_atom();
        while self.peek() == Some("*") {
            self.pos += 1;
            let rhs = self.parse_atom();
            value = value.wrapping_mul(rhs);
        }
        value
    }

    fn parse_atom(&mut self) -> i64 {
        match self.next() {
            Some("(") => {
                let value = self.parse_expr();
                assert_eq!(self.next(), Some(")"), "unbalanced parentheses");
                value
            }
            Some(tok) => tok.parse().expect("expected an integer token"),
            None => panic!("unexpected end of expression"),
        }
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Rendering then re-parsing with C precedence preserves the value, so
    /// the minimal parenthesization never changes grouping
    #[test]
    fn prop_precedence_round_trip(expr in arb_expr()) {
        let rendered = expr.to_string();
        let mut parser = TextParser::new(&rendered);
        let reparsed = parser.parse_expr();
        prop_assert_eq!(parser.peek(), None, "trailing tokens in {}", rendered);
        prop_assert_eq!(reparsed, eval_tree(&expr), "mismatch for {}", rendered);
    }

    /// Parentheses in any rendering are balanced
    #[test]
    fn prop_balanced_parentheses(expr in arb_expr()) {
        let rendered = expr.to_string();
        let mut depth = 0i32;
        for c in rendered.chars() {
            match c {
                '(' => depth += 1,
                ')' => { depth -= 1; prop_assert!(depth >= 0); }
                _ => {}
            }
        }
        prop_assert_eq!(depth, 0);
    }
}
