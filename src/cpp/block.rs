use crate::cpp::expr::{Expr, Literal, Variable};
use crate::cpp::stmt::Stmt;
use crate::cpp::types::CType;

const INDENT: &str = "    ";

/// Access region label inside a class body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLabel {
    Public,
    Private,
}

impl AccessLabel {
    pub fn label(&self) -> &'static str {
        match self {
            AccessLabel::Public => "public",
            AccessLabel::Private => "private",
        }
    }
}

/// Signature of a rendered function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<(CType, String)>,
    pub ret: CType,
    /// Tokens placed before the return type (`static`, `inline`)
    pub qualifiers: Vec<String>,
    /// Doc string, carried for binding registration
    pub doc: String,
}

fn render_params(params: &[(CType, String)]) -> String {
    params
        .iter()
        .map(|(ty, name)| format!("{} {}{}", ty.cname(), ty.prefix(), name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// What a block is; decides the prefix and suffix lines around its statements
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Bare statement sequence: no braces, no indent
    Sequence,
    If(Expr),
    /// Paired with a preceding If block; an elif chain nests an If inside
    Else,
    While(Expr),
    /// Range loop; a literal step of 1 or -1 renders `++`/`--`
    For {
        var: Variable,
        start: Expr,
        stop: Expr,
        step: Expr,
        /// Whether the loop variable is declared in the loop head
        declare: bool,
    },
    Function(FunctionSig),
    Constructor {
        name: String,
        params: Vec<(CType, String)>,
        init_list: Vec<(String, Expr)>,
        doc: String,
    },
    Class(String),
    /// `public:` / `private:` label with no braces
    Access(AccessLabel),
    /// `#ifdef SYM` ... `#endif`; contents keep their own indentation
    IfDef(String),
    /// `PYBIND11_MODULE(name, m) {`
    BindModule(String),
}

/// A brace-delimited (or label-delimited) region of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Block {
            kind,
            statements: Vec::new(),
        }
    }

    pub fn sequence() -> Self {
        Block::new(BlockKind::Sequence)
    }

    pub fn add(&mut self, stmt: Stmt) {
        self.statements.push(stmt);
    }

    fn prefix(&self) -> Option<String> {
        match &self.kind {
            BlockKind::Sequence => None,
            BlockKind::If(cond) => Some(format!("if ({}) {{", cond)),
            BlockKind::Else => Some("else {".to_string()),
            BlockKind::While(cond) => Some(format!("while ({}) {{", cond)),
            BlockKind::For {
                var,
                start,
                stop,
                step,
                declare,
            } => {
                let init = if *declare {
                    format!("{} {}{} = {}", var.ty.cname(), var.ty.prefix(), var.name, start)
                } else {
                    format!("{} = {}", var.name, start)
                };
                let (cond, update) = match step {
                    Expr::Const(Literal::Int(1)) => {
                        (format!("{} < {}", var.name, stop), format!("{}++", var.name))
                    }
                    Expr::Const(Literal::Int(-1)) => {
                        (format!("{} > {}", var.name, stop), format!("{}--", var.name))
                    }
                    Expr::Const(Literal::Int(n)) if *n < 0 => (
                        format!("{} > {}", var.name, stop),
                        format!("{} -= {}", var.name, -n),
                    ),
                    other => (
                        format!("{} < {}", var.name, stop),
                        format!("{} += {}", var.name, other),
                    ),
                };
                Some(format!("for ({}; {}; {}) {{", init, cond, update))
            }
            BlockKind::Function(sig) => {
                let mut head = String::new();
                for q in &sig.qualifiers {
                    head.push_str(q);
                    head.push(' ');
                }
                Some(format!(
                    "{}{} {}({}) {{",
                    head,
                    sig.ret.spelling(),
                    sig.name,
                    render_params(&sig.params)
                ))
            }
            BlockKind::Constructor {
                name,
                params,
                init_list,
                ..
            } => {
                let head = format!("{}({})", name, render_params(params));
                if init_list.is_empty() {
                    Some(format!("{} {{", head))
                } else {
                    let inits = init_list
                        .iter()
                        .map(|(member, value)| format!("{}({})", member, value))
                        .collect::<Vec<_>>()
                        .join(", ");
                    Some(format!("{} : {} {{", head, inits))
                }
            }
            BlockKind::Class(name) => Some(format!("class {} {{", name)),
            BlockKind::Access(label) => Some(format!("{}:", label.label())),
            BlockKind::IfDef(sym) => Some(format!("#ifdef {}", sym)),
            BlockKind::BindModule(name) => Some(format!("PYBIND11_MODULE({}, m) {{", name)),
        }
    }

    fn suffix(&self) -> Option<String> {
        match &self.kind {
            BlockKind::Sequence | BlockKind::Access(_) => None,
            BlockKind::Class(_) => Some("};".to_string()),
            BlockKind::IfDef(_) => Some("#endif".to_string()),
            _ => Some("}".to_string()),
        }
    }

    fn indents(&self) -> bool {
        !matches!(self.kind, BlockKind::Sequence | BlockKind::IfDef(_))
    }

    /// Renders the block as source lines
    pub fn translate(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(prefix) = self.prefix() {
            out.push(prefix);
        }
        let indents = self.indents();
        for stmt in &self.statements {
            for line in stmt.translate() {
                if indents && !line.is_empty() {
                    out.push(format!("{}{}", INDENT, line));
                } else {
                    out.push(line);
                }
            }
        }
        if let Some(suffix) = self.suffix() {
            out.push(suffix);
        }
        out
    }
}
