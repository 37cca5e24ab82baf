use crate::cpp::block::Block;
use crate::cpp::expr::{Expr, Variable};
use crate::cpp::types::CType;
use crate::error::{Error, Result};

/// In-place assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InplaceOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
}

impl InplaceOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            InplaceOp::Add => "+=",
            InplaceOp::Sub => "-=",
            InplaceOp::Mul => "*=",
            InplaceOp::Div => "/=",
            InplaceOp::Mod => "%=",
            InplaceOp::Shl => "<<=",
            InplaceOp::Shr => ">>=",
            InplaceOp::BitAnd => "&=",
            InplaceOp::BitXor => "^=",
            InplaceOp::BitOr => "|=",
        }
    }
}

/// A C++ statement. `translate()` renders it as a vector of source lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Variable declaration with optional initializer and qualifiers
    /// (`static`, `const`)
    VarDecl {
        var: Variable,
        init: Option<Expr>,
        qualifiers: Vec<String>,
    },
    /// `target = value;`
    Assign { target: Expr, value: Expr },
    /// `target op= value;`
    Inplace {
        op: InplaceOp,
        target: Expr,
        value: Expr,
    },
    /// `obj.attr = value;` (or `obj->attr`)
    SetAttr {
        obj: Expr,
        attr: String,
        arrow: bool,
        value: Expr,
    },
    /// `obj[index] = value;`
    SetItem {
        obj: Expr,
        index: Expr,
        value: Expr,
    },
    /// `return;` / `return value;`
    Return(Option<Expr>),
    /// Bare expression statement
    ExprStmt(Expr),
    Break,
    Continue,
    /// `using namespace ns;`
    UsingNamespace(String),
    /// `// text`
    Comment(String),
    /// `/* ... */` spanning several lines
    BlockComment(Vec<String>),
    /// `#include <header>` (or the verbatim form when quoted)
    Include(String),
    /// `#define name value`
    Define { name: String, value: String },
    /// A nested block re-indented as a statement
    BlockStmt(Block),
}

impl Stmt {
    /// Builds a declaration, rejecting references without an initializer
    pub fn var_decl(var: Variable, init: Option<Expr>) -> Result<Self> {
        if matches!(var.ty, CType::Reference(_)) && init.is_none() {
            return Err(Error::type_error(format!(
                "can't declare reference `{}` without a target",
                var.name
            )));
        }
        Ok(Stmt::VarDecl {
            var,
            init,
            qualifiers: Vec::new(),
        })
    }

    /// Same as [`Stmt::var_decl`] with declarator qualifiers
    pub fn var_decl_qualified(
        var: Variable,
        init: Option<Expr>,
        qualifiers: Vec<String>,
    ) -> Result<Self> {
        let mut stmt = Stmt::var_decl(var, init)?;
        if let Stmt::VarDecl {
            qualifiers: ref mut q,
            ..
        } = stmt
        {
            *q = qualifiers;
        }
        Ok(stmt)
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }

    /// Renders the statement as source lines
    pub fn translate(&self) -> Vec<String> {
        match self {
            Stmt::VarDecl {
                var,
                init,
                qualifiers,
            } => {
                // var_decl() rejects the one undeclarable shape (reference
                // without initializer), so rendering cannot fail
                let decl = var
                    .ty
                    .declare(&var.name, init.as_ref())
                    .expect("declaration validated on construction");
                if qualifiers.is_empty() {
                    vec![decl]
                } else {
                    vec![format!("{} {}", qualifiers.join(" "), decl)]
                }
            }
            Stmt::Assign { target, value } => vec![format!("{} = {};", target, value)],
            Stmt::Inplace { op, target, value } => {
                vec![format!("{} {} {};", target, op.symbol(), value)]
            }
            Stmt::SetAttr {
                obj,
                attr,
                arrow,
                value,
            } => {
                let sep = if *arrow { "->" } else { "." };
                vec![format!("{}{}{} = {};", obj, sep, attr, value)]
            }
            Stmt::SetItem { obj, index, value } => {
                vec![format!("{}[{}] = {};", obj, index, value)]
            }
            Stmt::Return(None) => vec!["return;".to_string()],
            Stmt::Return(Some(value)) => vec![format!("return {};", value)],
            Stmt::ExprStmt(e) => vec![format!("{};", e)],
            Stmt::Break => vec!["break;".to_string()],
            Stmt::Continue => vec!["continue;".to_string()],
            Stmt::UsingNamespace(ns) => vec![format!("using namespace {};", ns)],
            Stmt::Comment(text) => vec![format!("// {}", text)],
            Stmt::BlockComment(lines) => {
                let mut out = Vec::with_capacity(lines.len() + 2);
                out.push("/*".to_string());
                for line in lines {
                    out.push(format!(" * {}", line));
                }
                out.push(" */".to_string());
                out
            }
            Stmt::Include(header) => {
                if header.starts_with('"') {
                    vec![format!("#include {}", header)]
                } else {
                    vec![format!("#include <{}>", header)]
                }
            }
            Stmt::Define { name, value } => vec![format!("#define {} {}", name, value)],
            Stmt::BlockStmt(block) => block.translate(),
        }
    }
}
