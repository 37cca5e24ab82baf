use std::fmt;

use crate::cpp::types::{CType, Primitive, PyKind};

/// A named C++ variable with its static type
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: CType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: CType) -> Self {
        Variable {
            name: name.into(),
            ty,
        }
    }
}

/// A literal constant; its C++ type is inferred from the value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Dynamic value kind, for compatibility checks
    pub fn kind(&self) -> PyKind {
        match self {
            Literal::Int(_) => PyKind::Int,
            Literal::Float(_) => PyKind::Float,
            Literal::Bool(_) => PyKind::Bool,
            Literal::Str(_) => PyKind::Str,
        }
    }

    /// The primitive type this literal infers to
    pub fn inferred(&self) -> Primitive {
        match self {
            Literal::Int(_) => Primitive::Int,
            Literal::Float(_) => Primitive::Double,
            Literal::Bool(_) => Primitive::Bool,
            Literal::Str(_) => Primitive::Char,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    Invert,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Invert => "~",
        }
    }
}

/// Binary operators with their C precedence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
        }
    }

    /// Precedence level from the standard C operator table
    pub fn level(&self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 14,
            BinaryOp::Add | BinaryOp::Sub => 13,
            BinaryOp::Shl | BinaryOp::Shr => 12,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 11,
            BinaryOp::Eq | BinaryOp::Ne => 11,
            BinaryOp::BitAnd => 8,
            BinaryOp::BitXor => 7,
            BinaryOp::BitOr => 6,
            BinaryOp::LogicalAnd => 5,
            BinaryOp::LogicalOr => 4,
        }
    }
}

/// A C++ expression node.
///
/// Rendering is precedence-aware: any operand that is itself an operator node
/// with level less than or equal to the parent's is wrapped in parentheses.
/// Leaf nodes (constants, names, variables) have no level and are never
/// wrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant
    Const(Literal),
    /// Reference to a declared variable
    Var(Variable),
    /// A bare name spelled verbatim
    Name(String),
    /// Unary operator application
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operator application
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `cond ? a : b`
    Ternary {
        condition: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// Function or method call
    Call { func: Box<Expr>, args: Vec<Expr> },
    /// Member access, `obj.attr` or `obj->attr`
    GetAttr {
        obj: Box<Expr>,
        attr: String,
        arrow: bool,
    },
    /// Subscript, `obj[index]`
    GetItem { obj: Box<Expr>, index: Box<Expr> },
    /// Scope resolution, `scope::member`
    ScopeRes { scope: Box<Expr>, member: Box<Expr> },
    /// `static_cast<T>(e)`
    StaticCast { ty: CType, expr: Box<Expr> },
    /// C-style cast with a verbatim type spelling (function-pointer casts)
    Cast { ty: String, expr: Box<Expr> },
    /// `&e`
    AddressOf(Box<Expr>),
    /// `name<args...>`
    Template { name: Box<Expr>, args: Vec<Expr> },
    /// `{a, b, c}`
    InitList(Vec<Expr>),
}

impl Expr {
    pub fn int(v: i64) -> Self {
        Expr::Const(Literal::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Expr::Const(Literal::Float(v))
    }

    pub fn bool(v: bool) -> Self {
        Expr::Const(Literal::Bool(v))
    }

    pub fn str(v: impl Into<String>) -> Self {
        Expr::Const(Literal::Str(v.into()))
    }

    pub fn name(n: impl Into<String>) -> Self {
        Expr::Name(n.into())
    }

    pub fn var(v: Variable) -> Self {
        Expr::Var(v)
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn binary_add(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOp::Add, left, right)
    }

    pub fn binary_mul(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOp::Mul, left, right)
    }

    pub fn binary_div(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOp::Div, left, right)
    }

    pub fn ternary(condition: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
        }
    }

    /// Member access; `.` vs `->` is chosen from the object's static type
    pub fn get_attr(obj: Expr, attr: impl Into<String>) -> Self {
        let arrow = matches!(obj.static_type(), Some(t) if t.is_pointer());
        Expr::get_attr_with(obj, attr, arrow)
    }

    /// Member access with an explicit `->` choice
    pub fn get_attr_with(obj: Expr, attr: impl Into<String>, arrow: bool) -> Self {
        Expr::GetAttr {
            obj: Box::new(obj),
            attr: attr.into(),
            arrow,
        }
    }

    pub fn get_item(obj: Expr, index: Expr) -> Self {
        Expr::GetItem {
            obj: Box::new(obj),
            index: Box::new(index),
        }
    }

    pub fn scope_res(scope: Expr, member: Expr) -> Self {
        Expr::ScopeRes {
            scope: Box::new(scope),
            member: Box::new(member),
        }
    }

    pub fn static_cast(ty: CType, expr: Expr) -> Self {
        Expr::StaticCast {
            ty,
            expr: Box::new(expr),
        }
    }

    pub fn cast(ty: impl Into<String>, expr: Expr) -> Self {
        Expr::Cast {
            ty: ty.into(),
            expr: Box::new(expr),
        }
    }

    pub fn address_of(expr: Expr) -> Self {
        Expr::AddressOf(Box::new(expr))
    }

    pub fn template(name: Expr, args: Vec<Expr>) -> Self {
        Expr::Template {
            name: Box::new(name),
            args,
        }
    }

    /// The static type of this expression, when one is known
    pub fn static_type(&self) -> Option<&CType> {
        match self {
            Expr::Var(v) => Some(&v.ty),
            Expr::StaticCast { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Precedence level; `None` for leaf nodes that never need wrapping
    pub fn level(&self) -> Option<u8> {
        match self {
            Expr::Const(_) | Expr::Var(_) | Expr::Name(_) => None,
            Expr::Template { .. } | Expr::InitList(_) => None,
            Expr::Call { .. }
            | Expr::GetAttr { .. }
            | Expr::GetItem { .. }
            | Expr::StaticCast { .. }
            | Expr::Cast { .. } => Some(19),
            // binds tighter than postfix so `ns::f(x)` stays unwrapped
            Expr::ScopeRes { .. } => Some(20),
            Expr::Unary { .. } | Expr::AddressOf(_) => Some(16),
            Expr::Binary { op, .. } => Some(op.level()),
            Expr::Ternary { .. } => Some(3),
        }
    }

    /// Renders `operand`, parenthesizing when its level binds no tighter
    /// than `parent_level`. Left-associative postfix and scope chains pass
    /// `parent_level - 1` for their object side so same-level chaining stays
    /// unwrapped.
    fn bracket(operand: &Expr, parent_level: u8) -> String {
        match operand.level() {
            Some(level) if level <= parent_level => format!("({})", operand),
            _ => operand.to_string(),
        }
    }
}

impl From<Variable> for Expr {
    fn from(v: Variable) -> Self {
        Expr::Var(v)
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::int(v)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::float(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::bool(v)
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::name(v)
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Literal::Bool(v) => write!(f, "{}", v),
            Literal::Str(v) => write!(f, "\"{}\"", escape_string(v)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Const(lit) => write!(f, "{}", lit),
            Expr::Var(v) => write!(f, "{}", v.name),
            Expr::Name(n) => write!(f, "{}", n),
            Expr::Unary { op, operand } => {
                write!(f, "{}{}", op.symbol(), Expr::bracket(operand, 16))
            }
            Expr::Binary { op, left, right } => {
                let level = op.level();
                write!(
                    f,
                    "{} {} {}",
                    Expr::bracket(left, level),
                    op.symbol(),
                    Expr::bracket(right, level)
                )
            }
            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => write!(
                f,
                "{} ? {} : {}",
                Expr::bracket(condition, 3),
                Expr::bracket(if_true, 3),
                Expr::bracket(if_false, 3)
            ),
            Expr::Call { func, args } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", Expr::bracket(func, 18), rendered.join(", "))
            }
            Expr::GetAttr { obj, attr, arrow } => {
                let sep = if *arrow { "->" } else { "." };
                write!(f, "{}{}{}", Expr::bracket(obj, 18), sep, attr)
            }
            Expr::GetItem { obj, index } => {
                write!(f, "{}[{}]", Expr::bracket(obj, 18), index)
            }
            Expr::ScopeRes { scope, member } => {
                write!(f, "{}::{}", Expr::bracket(scope, 17), Expr::bracket(member, 17))
            }
            Expr::StaticCast { ty, expr } => {
                write!(f, "static_cast<{}>({})", ty.spelling(), expr)
            }
            Expr::Cast { ty, expr } => {
                write!(f, "({}){}", ty, Expr::bracket(expr, 15))
            }
            Expr::AddressOf(expr) => write!(f, "&{}", Expr::bracket(expr, 16)),
            Expr::Template { name, args } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}<{}>", name, rendered.join(", "))
            }
            Expr::InitList(items) => {
                let rendered: Vec<String> = items.iter().map(|a| a.to_string()).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}
