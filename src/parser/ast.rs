use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed source module (one file, one class, or one function)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Top-level statements in source order
    pub body: Vec<Stmt>,
}

/// A statement with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// What kind of statement this is
    pub kind: StmtKind,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub col: usize,
}

impl Stmt {
    /// Creates a statement at the given position
    pub fn new(kind: StmtKind, line: usize, col: usize) -> Self {
        Stmt { kind, line, col }
    }
}

/// Statement kinds of the restricted grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Function definition
    FunctionDef(FunctionDef),

    /// Class definition
    ClassDef(ClassDef),

    /// `if`/`elif`/`else`; an `elif` chain parses as a single nested `If`
    /// inside `orelse`
    If {
        /// Condition expression
        test: Expr,
        /// Statements of the true branch
        body: Vec<Stmt>,
        /// Statements of the false branch (empty when there is no `else`)
        orelse: Vec<Stmt>,
    },

    /// `while` loop
    While {
        /// Loop condition
        test: Expr,
        /// Loop body
        body: Vec<Stmt>,
    },

    /// `for` loop (the translator only accepts `range(...)` iterables)
    For {
        /// Loop variable
        target: Expr,
        /// Iterable expression
        iter: Expr,
        /// Loop body
        body: Vec<Stmt>,
    },

    /// `return [expr]`
    Return {
        /// Returned value, if any
        value: Option<Expr>,
    },

    /// Plain assignment; more than one target means a chained
    /// `a = b = expr`, which the translator rejects
    Assign {
        /// Assignment targets
        targets: Vec<Expr>,
        /// Assigned value
        value: Expr,
    },

    /// Augmented assignment (`+=`, `-=`, ...)
    AugAssign {
        /// Assignment target
        target: Expr,
        /// The compound operator
        op: BinOp,
        /// Right-hand side
        value: Expr,
    },

    /// Annotated assignment `name: T [= expr]` or `self.name: T = expr`
    AnnAssign {
        /// Assignment target (name or attribute)
        target: Expr,
        /// Type annotation expression
        annotation: Expr,
        /// Optional initializer
        value: Option<Expr>,
    },

    /// Bare expression statement
    ExprStmt {
        /// The expression
        value: Expr,
    },

    /// `pass`
    Pass,
    /// `break`
    Break,
    /// `continue`
    Continue,

    /// `import`/`from ... import ...`; parsed so the translator can reject
    /// it with a positioned diagnostic
    Import {
        /// Imported names as written
        names: Vec<String>,
    },
}

/// A function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Parameters in declaration order
    pub args: Vec<Param>,
    /// Return annotation, if present
    pub returns: Option<Expr>,
    /// Body statements
    pub body: Vec<Stmt>,
    /// Decorator names (`staticmethod`, `classmethod`, ...)
    pub decorators: Vec<String>,
}

/// A single function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Type annotation; `None` is a missing-annotation error for everything
    /// except a method's leading `self`
    pub annotation: Option<Expr>,
    /// Line of the parameter
    pub line: usize,
    /// Column of the parameter
    pub col: usize,
}

/// A class definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Class name
    pub name: String,
    /// Member statements (methods and annotated properties)
    pub body: Vec<Stmt>,
}

/// An expression with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// What kind of expression this is
    pub kind: ExprKind,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub col: usize,
}

impl Expr {
    /// Creates an expression at the given position
    pub fn new(kind: ExprKind, line: usize, col: usize) -> Self {
        Expr { kind, line, col }
    }
}

/// Expression kinds of the restricted grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal
    Str(String),
    /// Boolean literal
    Bool(bool),
    /// `None` literal
    NoneLit,

    /// Identifier reference
    Name(String),

    /// Binary operation (arithmetic, bitwise, or logical)
    BinOp {
        /// Operator
        op: BinOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Unary operation
    UnaryOp {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },

    /// Comparison with a single comparator
    Compare {
        /// Comparison operator
        op: CmpOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Conditional expression `body if test else orelse`
    IfExp {
        /// Condition
        test: Box<Expr>,
        /// Value when the condition holds
        body: Box<Expr>,
        /// Value otherwise
        orelse: Box<Expr>,
    },

    /// Call with positional and keyword arguments
    Call {
        /// Callee expression
        func: Box<Expr>,
        /// Positional arguments
        args: Vec<Expr>,
        /// Keyword arguments as (name, value) pairs
        keywords: Vec<(String, Expr)>,
    },

    /// Attribute access `value.attr`
    Attribute {
        /// Object expression
        value: Box<Expr>,
        /// Attribute name
        attr: String,
    },

    /// Subscript `value[index]`; tuple subscripts parse as a `Tuple` index
    Subscript {
        /// Object expression
        value: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
    },

    /// Tuple expression
    Tuple(Vec<Expr>),

    /// Slice inside a subscript (`:`, `1:`, `:n`, `a:b:c`); used by
    /// array-type annotations such as `Int[:, 2]`
    Slice {
        /// Lower bound
        lower: Option<Box<Expr>>,
        /// Upper bound
        upper: Option<Box<Expr>>,
        /// Step
        step: Option<Box<Expr>>,
    },
}

/// Binary operators (`and`/`or` included: the grammar has no chained
/// boolean forms, so they behave like ordinary binary nodes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `&`
    BitAnd,
    /// `^`
    BitXor,
    /// `|`
    BitOr,
    /// `and`
    And,
    /// `or`
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+x`
    Pos,
    /// `-x`
    Neg,
    /// `not x`
    Not,
    /// `~x`
    Invert,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "and",
            BinOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}
