//! # pycpp
//!
//! A source-to-source compiler from a restricted, type-annotated subset of
//! Python to C++. The pipeline scans and parses the source, translates it
//! into a typed C++ IR, generates pybind11-style binding glue, and renders a
//! single translation unit ready for a C++ compiler.
//!
//! ## Pipeline
//!
//! 1. **Scan**: indentation-aware lexer over the Python subset
//! 2. **Parse**: recursive descent into a closed AST
//! 3. **Translate**: AST to typed C++ IR (types, expressions, statements,
//!    blocks), resolving names through a stack of lexical scopes
//! 4. **Bind**: pybind11 registrations and buffer-unwrapping wrappers under
//!    `#ifdef PYBIND` guards
//! 5. **Render**: the fixed translation-unit skeleton
//!
//! ## Example
//!
//! ```
//! use pycpp::transpile;
//!
//! let source = "def double(x: Int) -> Int:\n    return x * 2\n";
//! let unit = transpile(source, "demo").unwrap();
//! assert!(unit.contains("int double(int x) {"));
//! assert!(unit.contains("PYBIND11_MODULE(demo, m) {"));
//! ```
//!
//! Compiling the produced unit and loading the resulting extension are the
//! caller's concern; this crate stops at the rendered source text.

pub mod bind;
pub mod cpp;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod session;
pub mod translator;

pub use error::{Error, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::SourceParser;
pub use render::render;
pub use session::Session;
pub use translator::{Binding, ContextStack, Translator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the whole pipeline: translates `source`, binds it as an extension
/// module named `module_name`, and renders the translation unit.
pub fn transpile(source: &str, module_name: &str) -> Result<String> {
    let mut session = Session::new();
    let mut translator = Translator::new(&mut session);
    let module = translator.translate(source)?;
    session.set_block(session::REGION_MAIN, module);
    bind::bind_module(&mut session, module_name)?;
    Ok(render(session))
}
