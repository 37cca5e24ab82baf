//! The typed C++ IR: types, expressions, statements, and blocks.
//!
//! Every node renders itself as C++ source text; statements and blocks
//! produce line vectors so nesting can re-indent them.

pub mod block;
pub mod expr;
pub mod stmt;
pub mod types;

pub use block::{AccessLabel, Block, BlockKind, FunctionSig};
pub use expr::{BinaryOp, Expr, Literal, UnaryOp, Variable};
pub use stmt::{InplaceOp, Stmt};
pub use types::{ArrayType, CType, ClassType, MemberSpelling, Primitive, PyKind, ShapeDim};
