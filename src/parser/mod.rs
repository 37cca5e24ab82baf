//! Parsing of the restricted Python grammar into a closed AST
//!
//! The AST is a plain data model (serde-derived) with per-node source
//! positions; everything the translator rejects still parses far enough to
//! carry a line/column for the caret diagnostic.

pub mod ast;
mod source_parser;

pub use ast::{
    BinOp, ClassDef, CmpOp, Expr, ExprKind, FunctionDef, Module, Param, Stmt, StmtKind, UnaryOp,
};
pub use source_parser::SourceParser;
