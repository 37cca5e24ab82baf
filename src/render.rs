//! Assembles the final translation unit from a session.
//!
//! The skeleton is fixed: branch-prediction helper macros, the header
//! region, the accumulated includes plus the array runtime header, the
//! translated module body, and the footer region with the binding
//! registrations.

use crate::session::{Session, REGION_FOOTER, REGION_HEADER, REGION_MAIN};

/// Renders the full translation unit, consuming the session
pub fn render(mut session: Session) -> String {
    // any deferred definitions not yet drained belong at the end of the body
    for stmt in session.take_deferred() {
        session.block_or_create(REGION_MAIN).add(stmt);
    }

    let mut lines: Vec<String> = vec![
        "#define _likely(x) __builtin_expect((x), 1)".to_string(),
        "#define _unlikely(x) __builtin_expect((x), 0)".to_string(),
        String::new(),
    ];
    if let Some(block) = session.block(REGION_HEADER) {
        lines.extend(block.translate());
    }
    for include in session.includes() {
        if include.starts_with('"') {
            lines.push(format!("#include {}", include));
        } else {
            lines.push(format!("#include <{}>", include));
        }
    }
    lines.push("#include <array.h>".to_string());
    lines.push(String::new());
    if let Some(block) = session.block(REGION_MAIN) {
        lines.extend(block.translate());
        lines.push(String::new());
    }
    if let Some(block) = session.block(REGION_FOOTER) {
        lines.extend(block.translate());
    }
    let mut out = lines.join("\n");
    while out.ends_with('\n') {
        out.pop();
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpp::{Block, Stmt};

    #[test]
    fn test_skeleton_order() {
        let mut session = Session::new();
        session.add_include("cmath");
        let mut main = Block::sequence();
        main.add(Stmt::comment("body"));
        session.set_block(REGION_MAIN, main);
        let out = render(session);
        let macro_at = out.find("_likely").unwrap();
        let cmath_at = out.find("#include <cmath>").unwrap();
        let array_at = out.find("#include <array.h>").unwrap();
        let body_at = out.find("// body").unwrap();
        assert!(macro_at < cmath_at && cmath_at < array_at && array_at < body_at);
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_empty_session_still_has_skeleton() {
        let out = render(Session::new());
        assert!(out.contains("__builtin_expect((x), 0)"));
        assert!(out.contains("#include <array.h>"));
    }
}
