//! AST to C++ IR translation.
//!
//! The translator walks the parsed module and produces blocks of typed C++
//! statements, resolving names through a stack of lexical scopes. All state
//! lives in the [`Translator`] and the [`Session`] it writes to; nothing is
//! global, so concurrent translations never interfere.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::{debug, error};

use crate::cpp::{
    AccessLabel, ArrayType, BinaryOp, Block, BlockKind, CType, ClassType, Expr, FunctionSig,
    InplaceOp, Literal, MemberSpelling, Primitive, ShapeDim, Stmt, UnaryOp, Variable,
};
use crate::error::{Error, Result};
use crate::lexer::Scanner;
use crate::parser::ast;
use crate::parser::SourceParser;
use crate::session::Session;

lazy_static! {
    /// Dunder method names that map onto native operator overloads
    static ref OPERATORS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("__add__", "operator +");
        m.insert("__sub__", "operator -");
        m.insert("__mul__", "operator *");
        m.insert("__truediv__", "operator /");
        m.insert("__mod__", "operator %");
        m.insert("__lshift__", "operator <<");
        m.insert("__rshift__", "operator >>");
        m.insert("__and__", "operator &");
        m.insert("__xor__", "operator ^");
        m.insert("__or__", "operator |");
        m.insert("__eq__", "operator ==");
        m.insert("__lt__", "operator <");
        m.insert("__gt__", "operator >");
        m.insert("__getitem__", "operator []");
        m.insert("__call__", "operator ()");
        m
    };
}

/// What a name resolves to during translation
#[derive(Debug, Clone)]
pub enum Binding {
    /// A declared variable
    Var(Variable),
    /// A type usable in annotations
    Type(CType),
    /// A callable function registered in this module
    Func(String),
    /// A compile-time constant; references substitute the expression
    ConstAlias(Expr),
    /// A translated class
    Class(ClassType),
    /// `self` inside a method body
    Instance(ClassType),
    /// `cls` inside a method body
    ClassRef(ClassType),
}

#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<String, Binding>,
    /// Memoized outward lookups, hits and misses both
    cache: HashMap<String, Option<Binding>>,
}

/// Stack of lexical scopes. Lookup walks from the innermost frame outward
/// and memoizes the result in the innermost frame's cache.
#[derive(Debug)]
pub struct ContextStack {
    frames: Vec<Frame>,
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack {
            frames: vec![Frame::default()],
        }
    }

    /// Number of live frames (the global frame included)
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pops the innermost frame; the global frame is never popped
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Binds a name in the innermost frame
    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        let name = name.into();
        if let Some(frame) = self.frames.last_mut() {
            frame.cache.remove(&name);
            frame.bindings.insert(name, binding);
        }
    }

    /// Binds a name in the outermost (global) frame
    pub fn bind_global(&mut self, name: impl Into<String>, binding: Binding) {
        let name = name.into();
        for frame in &mut self.frames {
            frame.cache.remove(&name);
        }
        if let Some(frame) = self.frames.first_mut() {
            frame.bindings.insert(name, binding);
        }
    }

    /// Resolves a name, innermost frame first
    pub fn get(&mut self, name: &str) -> Option<Binding> {
        let top = self.frames.len() - 1;
        if let Some(hit) = self.frames[top].cache.get(name) {
            return hit.clone();
        }
        let mut found = None;
        for frame in self.frames.iter().rev() {
            if let Some(binding) = frame.bindings.get(name) {
                found = Some(binding.clone());
                break;
            }
        }
        self.frames[top]
            .cache
            .insert(name.to_string(), found.clone());
        found
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        ContextStack::new()
    }
}

/// The annotation vocabulary preloaded into the global frame
fn default_globals() -> Vec<(&'static str, Binding)> {
    let prim = |p| Binding::Type(CType::Primitive(p));
    vec![
        ("bool", prim(Primitive::Bool)),
        ("int", prim(Primitive::Int)),
        ("long", prim(Primitive::Long)),
        ("float", prim(Primitive::Float)),
        ("double", prim(Primitive::Double)),
        ("str", prim(Primitive::Char)),
        ("Bool", prim(Primitive::Bool)),
        ("Char", prim(Primitive::Char)),
        ("Short", prim(Primitive::Short)),
        ("Int", prim(Primitive::Int)),
        ("Long", prim(Primitive::Long)),
        ("Float", prim(Primitive::Float)),
        ("Double", prim(Primitive::Double)),
        ("Void", prim(Primitive::Void)),
    ]
}

/// What a source expression translated to: not every expression is a value
#[derive(Debug, Clone)]
enum TransValue {
    /// An ordinary value expression
    Value(Expr),
    /// A type (annotation position)
    Type(CType),
    /// Something callable (function name, method access)
    Callable(Expr),
    /// A class referenced by name
    ClassRef(ClassType),
    /// `self` inside a method
    Instance(ClassType),
    /// The shape proxy of an array variable
    Shape(Variable),
}

/// Translates parsed modules into C++ IR inside a [`Session`]
pub struct Translator<'s> {
    ctx: ContextStack,
    session: &'s mut Session,
    source_lines: Vec<String>,
    /// Latch for the one-shot caret diagnostic; reset per `translate` call
    err_handled: bool,
}

impl<'s> Translator<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        let mut ctx = ContextStack::new();
        for (name, binding) in default_globals() {
            ctx.bind_global(name, binding);
        }
        Translator {
            ctx,
            session,
            source_lines: Vec::new(),
            err_handled: false,
        }
    }

    /// Makes a name visible to every translation through this translator
    pub fn bind_global(&mut self, name: impl Into<String>, binding: Binding) {
        self.ctx.bind_global(name, binding);
    }

    /// Scans, parses, and translates a source module into a block of C++
    /// statements. On failure the offending source line is logged once with
    /// a column caret before the error propagates.
    pub fn translate(&mut self, source: &str) -> Result<Block> {
        self.err_handled = false;
        let source = dedent(source);
        self.source_lines = source.lines().map(str::to_string).collect();
        let tokens = Scanner::new(&source).scan_tokens()?;
        let mut parser = SourceParser::new(tokens);
        let module = parser.parse()?;
        debug!(statements = module.body.len(), "module parsed");
        self.translate_module(&module)
    }

    fn translate_module(&mut self, module: &ast::Module) -> Result<Block> {
        // forward registration so functions can call each other and
        // themselves regardless of definition order
        for stmt in &module.body {
            match &stmt.kind {
                ast::StmtKind::FunctionDef(fd) => {
                    self.ctx.bind(fd.name.clone(), Binding::Func(fd.name.clone()));
                }
                ast::StmtKind::ClassDef(cd) => {
                    self.ctx.bind(cd.name.clone(), Binding::Func(cd.name.clone()));
                }
                _ => {}
            }
        }
        self.trans_body(&module.body, BlockKind::Sequence, Vec::new())
    }

    // ---- diagnostics ----

    /// Logs the source line and a column caret for the innermost failure,
    /// once per translation, then hands the error back
    fn report(&mut self, line: usize, col: usize, err: Error) -> Error {
        if !self.err_handled {
            if line >= 1 && line <= self.source_lines.len() {
                let text = &self.source_lines[line - 1];
                let prefix = format!("{} ", line);
                error!("{}{}", prefix, text);
                error!("{}^", " ".repeat(prefix.len() + col.saturating_sub(1)));
            }
            self.err_handled = true;
        }
        err
    }

    // ---- statements ----

    fn trans_stmt(&mut self, stmt: &ast::Stmt) -> Result<Vec<Stmt>> {
        match self.trans_stmt_inner(stmt) {
            Ok(out) => Ok(out),
            Err(err) => Err(self.report(stmt.line, stmt.col, err)),
        }
    }

    fn trans_stmt_inner(&mut self, stmt: &ast::Stmt) -> Result<Vec<Stmt>> {
        match &stmt.kind {
            ast::StmtKind::FunctionDef(fd) => {
                let block = self.trans_function(fd, None)?;
                Ok(vec![Stmt::BlockStmt(block)])
            }
            ast::StmtKind::ClassDef(cd) => {
                let block = self.trans_class(cd)?;
                Ok(vec![Stmt::BlockStmt(block)])
            }
            ast::StmtKind::If { test, body, orelse } => {
                let test = self.expr_value(test)?;
                let then_block = self.trans_body(body, BlockKind::If(test), Vec::new())?;
                let mut out = vec![Stmt::BlockStmt(then_block)];
                if !orelse.is_empty() {
                    let else_block = self.trans_body(orelse, BlockKind::Else, Vec::new())?;
                    out.push(Stmt::BlockStmt(else_block));
                }
                Ok(out)
            }
            ast::StmtKind::While { test, body } => {
                let test = self.expr_value(test)?;
                let block = self.trans_body(body, BlockKind::While(test), Vec::new())?;
                Ok(vec![Stmt::BlockStmt(block)])
            }
            ast::StmtKind::For { target, iter, body } => self.trans_for(target, iter, body),
            ast::StmtKind::Return { value } => {
                let value = match value {
                    Some(v) => Some(self.expr_value(v)?),
                    None => None,
                };
                Ok(vec![Stmt::Return(value)])
            }
            ast::StmtKind::Assign { targets, value } => {
                if targets.len() != 1 {
                    return Err(Error::unsupported(
                        stmt.line,
                        "chained assignment targets",
                    ));
                }
                let value = self.expr_value(value)?;
                let target = self.expr_value(&targets[0])?;
                Ok(vec![assign_stmt(target, value)])
            }
            ast::StmtKind::AugAssign { target, op, value } => {
                let op = inplace_op(*op)
                    .ok_or_else(|| Error::unsupported(stmt.line, "augmented boolean operator"))?;
                let value = self.expr_value(value)?;
                let target = self.expr_value(target)?;
                Ok(vec![Stmt::Inplace { op, target, value }])
            }
            ast::StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => self.trans_ann_assign(stmt.line, target, annotation, value.as_ref()),
            ast::StmtKind::ExprStmt { value } => {
                if let ast::ExprKind::Str(text) = &value.kind {
                    // bare string statements become comments
                    return Ok(vec![Stmt::comment(text.replace('\n', " "))]);
                }
                let value = self.expr_value(value)?;
                Ok(vec![Stmt::ExprStmt(value)])
            }
            ast::StmtKind::Pass => Ok(vec![Stmt::comment("pass")]),
            ast::StmtKind::Break => Ok(vec![Stmt::Break]),
            ast::StmtKind::Continue => Ok(vec![Stmt::Continue]),
            ast::StmtKind::Import { names } => Err(Error::unsupported(
                stmt.line,
                format!(
                    "import of `{}`; register bindings through the translation context instead",
                    names.join(", ")
                ),
            )),
        }
    }

    /// Translates a statement list into a block of the given kind, with a
    /// fresh scope frame seeded with `bindings`
    fn trans_body(
        &mut self,
        stmts: &[ast::Stmt],
        kind: BlockKind,
        bindings: Vec<(String, Binding)>,
    ) -> Result<Block> {
        self.ctx.push();
        for (name, binding) in bindings {
            self.ctx.bind(name, binding);
        }
        self.session.begin_block(Block::new(kind));
        let mut outcome = Ok(());
        for stmt in stmts {
            match self.trans_stmt(stmt) {
                Ok(translated) => {
                    for s in translated {
                        self.session.push_stmt(s);
                    }
                    for s in self.session.take_deferred() {
                        self.session.push_stmt(s);
                    }
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        // unwind on both paths so an error can't leak the scope or the block
        self.ctx.pop();
        let block = self.session.end_block();
        outcome.map(|_| block)
    }

    fn trans_ann_assign(
        &mut self,
        line: usize,
        target: &ast::Expr,
        annotation: &ast::Expr,
        value: Option<&ast::Expr>,
    ) -> Result<Vec<Stmt>> {
        let name = match &target.kind {
            ast::ExprKind::Name(n) => n.clone(),
            ast::ExprKind::Attribute { attr, .. } => attr.clone(),
            _ => return Err(Error::unsupported(line, "annotated assignment target")),
        };

        // `n: "const" = 10` declares a compile-time constant
        if let ast::ExprKind::Str(marker) = &annotation.kind {
            if marker.eq_ignore_ascii_case("const") {
                let value = value
                    .ok_or_else(|| Error::unsupported(line, "constant without a value"))?;
                let value = self.expr_value(value)?;
                self.ctx
                    .bind(name.clone(), Binding::ConstAlias(value.clone()));
                return Ok(vec![Stmt::comment(format!("const {} = {}", name, value))]);
            }
            return Err(Error::type_error(format!(
                "unknown annotation marker \"{}\"",
                marker
            )));
        }

        let ty = self.resolve_type(annotation)?;
        let init = match value {
            Some(v) => Some(self.expr_value(v)?),
            None => None,
        };
        if let (CType::Primitive(_), Some(Expr::Const(lit))) = (&ty, &init) {
            if !ty.compatible(lit.kind()) {
                return Err(Error::type_error(format!(
                    "can't initialize `{}: {}` from {}",
                    name,
                    ty.cname(),
                    lit
                )));
            }
        }
        let var = Variable::new(name.clone(), ty);
        self.ctx.bind(name, Binding::Var(var.clone()));
        Ok(vec![Stmt::var_decl(var, init)?])
    }

    fn trans_for(
        &mut self,
        target: &ast::Expr,
        iter: &ast::Expr,
        body: &[ast::Stmt],
    ) -> Result<Vec<Stmt>> {
        let (args, keywords) = match &iter.kind {
            ast::ExprKind::Call {
                func,
                args,
                keywords,
            } if matches!(&func.kind, ast::ExprKind::Name(n) if n == "range") => {
                (args, keywords)
            }
            _ => {
                return Err(Error::unsupported(
                    iter.line,
                    "for-loop iterables other than range(...)",
                ))
            }
        };
        if !keywords.is_empty() {
            return Err(Error::unsupported(iter.line, "keyword arguments to range"));
        }
        let mut bounds = Vec::with_capacity(args.len());
        for arg in args {
            bounds.push(self.expr_value(arg)?);
        }
        let (start, stop, step) = match bounds.len() {
            1 => (Expr::int(0), bounds.remove(0), Expr::int(1)),
            2 => {
                let stop = bounds.remove(1);
                (bounds.remove(0), stop, Expr::int(1))
            }
            3 => {
                let step = bounds.remove(2);
                let stop = bounds.remove(1);
                (bounds.remove(0), stop, step)
            }
            n => {
                return Err(Error::unsupported(
                    iter.line,
                    format!("range with {} arguments", n),
                ))
            }
        };

        let name = match &target.kind {
            ast::ExprKind::Name(n) => n.clone(),
            _ => return Err(Error::unsupported(target.line, "destructuring loop targets")),
        };
        // reuse an existing counter variable, otherwise synthesize one wide
        // enough for the bounds
        let (var, declare) = match self.ctx.get(&name) {
            Some(Binding::Var(v)) => (v, false),
            Some(_) => {
                return Err(Error::type_error(format!(
                    "loop variable `{}` shadows a non-variable binding",
                    name
                )))
            }
            None => {
                let ty = CType::Primitive(loop_var_type(&start, &stop));
                let var = Variable::new(name.clone(), ty);
                self.ctx.bind(name, Binding::Var(var.clone()));
                (var, true)
            }
        };

        let kind = BlockKind::For {
            var,
            start,
            stop,
            step,
            declare,
        };
        let block = self.trans_body(body, kind, Vec::new())?;
        Ok(vec![Stmt::BlockStmt(block)])
    }

    // ---- functions and classes ----

    /// Translates a function definition. `method_of` carries the enclosing
    /// class for methods, which excludes the leading `self` parameter and
    /// seeds `self`/`cls` into the body scope.
    fn trans_function(
        &mut self,
        fd: &ast::FunctionDef,
        method_of: Option<&ClassType>,
    ) -> Result<Block> {
        let is_static = fd
            .decorators
            .iter()
            .any(|d| d == "staticmethod" || d == "classmethod");
        let skip_first = method_of.is_some() && !is_static;

        let (params, vars) = self.resolve_params(&fd.args, skip_first)?;
        let ret = match &fd.returns {
            Some(ann) => self.resolve_type(ann)?,
            None => CType::Primitive(Primitive::Void),
        };
        let (doc, body) = split_doc(&fd.body);

        let name = match method_of {
            Some(_) => OPERATORS
                .get(fd.name.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| fd.name.clone()),
            None => fd.name.clone(),
        };
        let mut qualifiers = Vec::new();
        if method_of.is_some() && is_static {
            qualifiers.push("static".to_string());
        }
        debug!(function = %name, params = params.len(), "translating function");

        let sig = FunctionSig {
            name,
            params,
            ret,
            qualifiers,
            doc,
        };
        let mut bindings: Vec<(String, Binding)> = vars
            .into_iter()
            .map(|v| (v.name.clone(), Binding::Var(v)))
            .collect();
        if let Some(class) = method_of {
            if !is_static {
                bindings.push(("self".to_string(), Binding::Instance(class.clone())));
            }
            bindings.push(("cls".to_string(), Binding::ClassRef(class.clone())));
        }
        self.trans_body(body, BlockKind::Function(sig), bindings)
    }

    /// Resolves a parameter list, batching every missing annotation into a
    /// single error
    fn resolve_params(
        &mut self,
        args: &[ast::Param],
        skip_first: bool,
    ) -> Result<(Vec<(CType, String)>, Vec<Variable>)> {
        let mut missing = Vec::new();
        let mut params = Vec::new();
        let mut vars = Vec::new();
        for (i, param) in args.iter().enumerate() {
            if skip_first && i == 0 {
                continue;
            }
            match &param.annotation {
                None => missing.push(param.name.clone()),
                Some(ann) => {
                    let ty = self.resolve_type(ann)?;
                    params.push((ty.clone(), param.name.clone()));
                    vars.push(Variable::new(param.name.clone(), ty));
                }
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingAnnotations { names: missing });
        }
        Ok((params, vars))
    }

    fn trans_class(&mut self, cd: &ast::ClassDef) -> Result<Block> {
        let class = self.resolve_members(cd)?;
        self.ctx.bind(cd.name.clone(), Binding::Class(class.clone()));
        debug!(class = %cd.name, members = class.members.len(), "translating class");

        let mut public = Block::new(BlockKind::Access(AccessLabel::Public));
        let mut private = Block::new(BlockKind::Access(AccessLabel::Private));

        // member declarations first; initializers for statics are hoisted
        // out after the class body
        for stmt in &cd.body {
            if let ast::StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } = &stmt.kind
            {
                let name = match &target.kind {
                    ast::ExprKind::Name(n) => n.clone(),
                    _ => continue,
                };
                let ty = self.resolve_type(annotation)?;
                let var = Variable::new(name.clone(), ty.clone());
                let decl =
                    Stmt::var_decl_qualified(var, None, vec!["static".to_string()])?;
                if is_private(&name) {
                    private.add(decl);
                } else {
                    public.add(decl);
                }
                if let Some(value) = value {
                    let init = self.expr_value(value)?;
                    let hoisted = Variable::new(format!("{}::{}", cd.name, name), ty);
                    self.session.defer(Stmt::var_decl(hoisted, Some(init))?);
                }
            }
        }
        // instance members discovered from `self.x: T = ...` in __init__
        let mut declared: Vec<String> = Vec::new();
        for stmt in &cd.body {
            if let ast::StmtKind::FunctionDef(fd) = &stmt.kind {
                if fd.name != "__init__" {
                    continue;
                }
                for body_stmt in &fd.body {
                    if let ast::StmtKind::AnnAssign {
                        target, annotation, ..
                    } = &body_stmt.kind
                    {
                        if let Some(attr) = self_attr(target) {
                            if declared.iter().any(|d| d == attr) {
                                continue;
                            }
                            declared.push(attr.to_string());
                            let ty = self.resolve_type(annotation)?;
                            let var = Variable::new(attr.to_string(), ty);
                            let decl = Stmt::var_decl(var, None)?;
                            if is_private(attr) {
                                private.add(decl);
                            } else {
                                public.add(decl);
                            }
                        }
                    }
                }
            }
        }
        // constructor and methods
        for stmt in &cd.body {
            match &stmt.kind {
                ast::StmtKind::FunctionDef(fd) if fd.name == "__init__" => {
                    let block = self.trans_constructor(cd, fd, &class)?;
                    public.add(Stmt::BlockStmt(block));
                }
                ast::StmtKind::FunctionDef(fd) => {
                    let block = match self.trans_function(fd, Some(&class)) {
                        Ok(b) => b,
                        Err(err) => return Err(self.report(stmt.line, stmt.col, err)),
                    };
                    if is_private(&fd.name) {
                        private.add(Stmt::BlockStmt(block));
                    } else {
                        public.add(Stmt::BlockStmt(block));
                    }
                }
                ast::StmtKind::AnnAssign { .. } | ast::StmtKind::Pass => {}
                ast::StmtKind::ExprStmt { value }
                    if matches!(&value.kind, ast::ExprKind::Str(_)) => {}
                _ => {
                    return Err(Error::UnsupportedMember {
                        name: format!("statement at line {} in class {}", stmt.line, cd.name),
                    })
                }
            }
        }

        let mut block = Block::new(BlockKind::Class(cd.name.clone()));
        if !private.statements.is_empty() {
            block.add(Stmt::BlockStmt(private));
        }
        block.add(Stmt::BlockStmt(public));
        Ok(block)
    }

    /// First pass over a class body: build the member capability table
    fn resolve_members(&mut self, cd: &ast::ClassDef) -> Result<ClassType> {
        let mut class = ClassType::new(cd.name.clone());
        for stmt in &cd.body {
            match &stmt.kind {
                ast::StmtKind::AnnAssign { target, .. } => {
                    if let ast::ExprKind::Name(name) = &target.kind {
                        class.members.insert(
                            name.clone(),
                            MemberSpelling::StaticField(name.clone()),
                        );
                    }
                }
                ast::StmtKind::FunctionDef(fd) if fd.name == "__init__" => {
                    for body_stmt in &fd.body {
                        if let ast::StmtKind::AnnAssign { target, .. } = &body_stmt.kind {
                            if let Some(attr) = self_attr(target) {
                                class.members.insert(
                                    attr.to_string(),
                                    MemberSpelling::Field(attr.to_string()),
                                );
                            }
                        }
                    }
                }
                ast::StmtKind::FunctionDef(fd) => {
                    let spelled = OPERATORS
                        .get(fd.name.as_str())
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| fd.name.clone());
                    let is_static = fd
                        .decorators
                        .iter()
                        .any(|d| d == "staticmethod" || d == "classmethod");
                    let spelling = if is_static {
                        MemberSpelling::StaticMethod(spelled)
                    } else {
                        MemberSpelling::Method(spelled)
                    };
                    class.members.insert(fd.name.clone(), spelling);
                }
                _ => {}
            }
        }
        Ok(class)
    }

    /// Translates `__init__` into a constructor, extracting literal
    /// `self.x: T = value` lines into the member-initializer list
    fn trans_constructor(
        &mut self,
        cd: &ast::ClassDef,
        fd: &ast::FunctionDef,
        class: &ClassType,
    ) -> Result<Block> {
        let (params, vars) = self.resolve_params(&fd.args, true)?;
        let (doc, body) = split_doc(&fd.body);

        let mut init_list = Vec::new();
        let mut rest: Vec<&ast::Stmt> = Vec::new();
        for stmt in body {
            if let ast::StmtKind::AnnAssign {
                target,
                annotation: _,
                value: Some(value),
            } = &stmt.kind
            {
                if let Some(attr) = self_attr(target) {
                    if let Some(lit) = literal_expr(value) {
                        init_list.push((attr.to_string(), lit));
                    } else {
                        // non-literal initializer becomes a body assignment
                        rest.push(stmt);
                    }
                    continue;
                }
            }
            rest.push(stmt);
        }

        let kind = BlockKind::Constructor {
            name: cd.name.clone(),
            params,
            init_list,
            doc,
        };
        let mut bindings: Vec<(String, Binding)> = vars
            .into_iter()
            .map(|v| (v.name.clone(), Binding::Var(v)))
            .collect();
        bindings.push(("self".to_string(), Binding::Instance(class.clone())));
        bindings.push(("cls".to_string(), Binding::ClassRef(class.clone())));

        self.ctx.push();
        for (name, binding) in bindings {
            self.ctx.bind(name, binding);
        }
        self.session.begin_block(Block::new(kind));
        let mut outcome = Ok(());
        for stmt in rest {
            let translated = if let ast::StmtKind::AnnAssign {
                target,
                annotation: _,
                value: Some(value),
            } = &stmt.kind
            {
                // `self.x: T = expr` with a non-literal value assigns in the
                // body; the member declaration is already in the class
                match self_attr(target) {
                    Some(attr) => self
                        .expr_value(value)
                        .map(|value| {
                            vec![Stmt::SetAttr {
                                obj: Expr::name("this"),
                                attr: attr.to_string(),
                                arrow: true,
                                value,
                            }]
                        })
                        .map_err(|e| self.report(stmt.line, stmt.col, e)),
                    None => self.trans_stmt(stmt),
                }
            } else {
                self.trans_stmt(stmt)
            };
            match translated {
                Ok(list) => {
                    for s in list {
                        self.session.push_stmt(s);
                    }
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.ctx.pop();
        let block = self.session.end_block();
        outcome.map(|_| block)
    }

    // ---- expressions ----

    fn trans_expr(&mut self, expr: &ast::Expr) -> Result<TransValue> {
        match self.trans_expr_inner(expr) {
            Ok(v) => Ok(v),
            Err(err) => Err(self.report(expr.line, expr.col, err)),
        }
    }

    /// Translates an expression and requires the result to be a value
    fn expr_value(&mut self, expr: &ast::Expr) -> Result<Expr> {
        match self.trans_expr(expr)? {
            TransValue::Value(e) => Ok(e),
            TransValue::Callable(e) => Ok(e),
            TransValue::Shape(v) => Ok(Expr::get_attr(Expr::var(v), "shape")),
            TransValue::Type(t) => Err(Error::type_error(format!(
                "type `{}` used as a value",
                t.cname()
            ))),
            TransValue::ClassRef(c) => Err(Error::type_error(format!(
                "class `{}` used as a value",
                c.name
            ))),
            TransValue::Instance(_) => Err(Error::unsupported(
                expr.line,
                "`self` outside attribute access",
            )),
        }
    }

    /// Resolves a type-annotation expression
    fn resolve_type(&mut self, ann: &ast::Expr) -> Result<CType> {
        if matches!(ann.kind, ast::ExprKind::NoneLit) {
            return Ok(CType::Primitive(Primitive::Void));
        }
        match self.trans_expr(ann)? {
            TransValue::Type(t) => Ok(t),
            TransValue::ClassRef(c) => Ok(CType::Class(c)),
            _ => Err(Error::type_error("expected a type annotation")),
        }
    }

    fn trans_expr_inner(&mut self, expr: &ast::Expr) -> Result<TransValue> {
        match &expr.kind {
            ast::ExprKind::Int(v) => Ok(TransValue::Value(Expr::int(*v))),
            ast::ExprKind::Float(v) => Ok(TransValue::Value(Expr::float(*v))),
            ast::ExprKind::Bool(v) => Ok(TransValue::Value(Expr::bool(*v))),
            ast::ExprKind::Str(s) => Ok(TransValue::Value(Expr::str(s.clone()))),
            ast::ExprKind::NoneLit => Err(Error::unsupported(
                expr.line,
                "None outside a return annotation",
            )),
            ast::ExprKind::Name(name) => match self.ctx.get(name) {
                Some(Binding::Var(v)) => Ok(TransValue::Value(Expr::Var(v))),
                Some(Binding::Type(t)) => Ok(TransValue::Type(t)),
                Some(Binding::Func(f)) => Ok(TransValue::Callable(Expr::name(f))),
                Some(Binding::ConstAlias(e)) => Ok(TransValue::Value(e)),
                Some(Binding::Class(c)) => Ok(TransValue::ClassRef(c)),
                Some(Binding::Instance(c)) => Ok(TransValue::Instance(c)),
                Some(Binding::ClassRef(c)) => Ok(TransValue::ClassRef(c)),
                None => Err(Error::UnboundName { name: name.clone() }),
            },
            ast::ExprKind::BinOp { op, left, right } => {
                let op = binary_op(*op);
                let left = self.expr_value(left)?;
                let right = self.expr_value(right)?;
                Ok(TransValue::Value(Expr::binary(op, left, right)))
            }
            ast::ExprKind::UnaryOp { op, operand } => {
                let operand = self.expr_value(operand)?;
                let folded = match (op, &operand) {
                    (ast::UnaryOp::Neg, Expr::Const(Literal::Int(n))) => Expr::int(-n),
                    (ast::UnaryOp::Neg, Expr::Const(Literal::Float(f))) => Expr::float(-f),
                    (ast::UnaryOp::Pos, _) => operand,
                    _ => Expr::unary(unary_op(*op), operand),
                };
                Ok(TransValue::Value(folded))
            }
            ast::ExprKind::Compare { op, left, right } => {
                let op = compare_op(*op);
                let left = self.expr_value(left)?;
                let right = self.expr_value(right)?;
                Ok(TransValue::Value(Expr::binary(op, left, right)))
            }
            ast::ExprKind::IfExp { test, body, orelse } => {
                let test = self.expr_value(test)?;
                let body = self.expr_value(body)?;
                let orelse = self.expr_value(orelse)?;
                Ok(TransValue::Value(Expr::ternary(test, body, orelse)))
            }
            ast::ExprKind::Call {
                func,
                args,
                keywords,
            } => self.trans_call(expr.line, func, args, keywords),
            ast::ExprKind::Attribute { value, attr } => self.trans_attribute(value, attr),
            ast::ExprKind::Subscript { value, index } => self.trans_subscript(value, index),
            ast::ExprKind::Tuple(_) => Err(Error::unsupported(
                expr.line,
                "tuple expressions outside subscripts",
            )),
            ast::ExprKind::Slice { .. } => Err(Error::unsupported(
                expr.line,
                "slices outside array-type annotations",
            )),
        }
    }

    fn trans_call(
        &mut self,
        line: usize,
        func: &ast::Expr,
        args: &[ast::Expr],
        keywords: &[(String, ast::Expr)],
    ) -> Result<TransValue> {
        // len(arr) resolves at translation time against the array shape
        if let ast::ExprKind::Name(name) = &func.kind {
            if name == "len" && self.ctx.get("len").is_none() {
                if args.len() != 1 {
                    return Err(Error::unsupported(line, "len with more than one argument"));
                }
                if let TransValue::Value(Expr::Var(v)) = self.trans_expr(&args[0])? {
                    if let CType::Array(a) = v.ty.clone() {
                        return Ok(TransValue::Value(a.len_expr(&v)));
                    }
                }
                return Err(Error::unsupported(line, "len of a non-array value"));
            }
            if name == "range" && self.ctx.get("range").is_none() {
                return Err(Error::unsupported(
                    line,
                    "range(...) outside a for-loop iterable",
                ));
            }
        }

        let callee = self.trans_expr(func)?;
        if !keywords.is_empty() {
            let context = keywords
                .iter()
                .map(|(k, _)| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::KeywordArguments { context });
        }
        let mut call_args = Vec::with_capacity(args.len());
        for arg in args {
            call_args.push(self.expr_value(arg)?);
        }
        match callee {
            TransValue::Callable(f) | TransValue::Value(f) => {
                Ok(TransValue::Value(Expr::call(f, call_args)))
            }
            TransValue::ClassRef(c) => Ok(TransValue::Value(Expr::call(
                Expr::name(c.cname()),
                call_args,
            ))),
            TransValue::Type(t) if t.is_primitive() => {
                if call_args.len() != 1 {
                    return Err(Error::type_error("cast takes exactly one argument"));
                }
                let arg = call_args.remove(0);
                Ok(TransValue::Value(Expr::static_cast(t, arg)))
            }
            _ => Err(Error::unsupported(line, "call target")),
        }
    }

    fn trans_attribute(&mut self, value: &ast::Expr, attr: &str) -> Result<TransValue> {
        let base = self.trans_expr(value)?;
        match base {
            TransValue::Instance(class) => {
                let access = class.member_access(attr);
                match class.members.get(attr) {
                    Some(MemberSpelling::Method(_)) | Some(MemberSpelling::StaticMethod(_)) => {
                        Ok(TransValue::Callable(access))
                    }
                    _ => Ok(TransValue::Value(access)),
                }
            }
            TransValue::ClassRef(class) => {
                let access = class.static_access(attr);
                match class.members.get(attr) {
                    Some(MemberSpelling::Method(_)) | Some(MemberSpelling::StaticMethod(_)) => {
                        Ok(TransValue::Callable(access))
                    }
                    _ => Ok(TransValue::Value(access)),
                }
            }
            TransValue::Value(Expr::Var(v)) => match &v.ty {
                CType::Array(_) if attr == "shape" => Ok(TransValue::Shape(v.clone())),
                CType::Class(class) => {
                    let spelled = class
                        .members
                        .get(attr)
                        .map(|s| s.name().to_string())
                        .unwrap_or_else(|| attr.to_string());
                    let is_method = matches!(
                        class.members.get(attr),
                        Some(MemberSpelling::Method(_)) | Some(MemberSpelling::StaticMethod(_))
                    );
                    let access = Expr::get_attr(Expr::Var(v.clone()), spelled);
                    if is_method {
                        Ok(TransValue::Callable(access))
                    } else {
                        Ok(TransValue::Value(access))
                    }
                }
                _ => Ok(TransValue::Value(Expr::get_attr(Expr::Var(v.clone()), attr))),
            },
            TransValue::Value(e) => Ok(TransValue::Value(Expr::get_attr(e, attr))),
            TransValue::Type(t) => Err(Error::type_error(format!(
                "type `{}` has no attribute `{}`",
                t.cname(),
                attr
            ))),
            other => Err(Error::type_error(format!(
                "attribute `{}` on unsupported base {:?}",
                attr, other
            ))),
        }
    }

    fn trans_subscript(&mut self, value: &ast::Expr, index: &ast::Expr) -> Result<TransValue> {
        let base = self.trans_expr(value)?;
        match base {
            // annotation position: Double[:, 2] builds an array type
            TransValue::Type(CType::Primitive(p)) => {
                let (shape, contiguous) = self.parse_shape(index)?;
                let array = ArrayType::new(p, shape, contiguous)?;
                Ok(TransValue::Type(CType::Array(array)))
            }
            TransValue::Type(t) => Err(Error::type_error(format!(
                "type `{}` is not subscriptable",
                t.cname()
            ))),
            TransValue::Shape(v) => {
                if let CType::Array(a) = &v.ty {
                    if let ast::ExprKind::Int(i) = &index.kind {
                        if let Some(ShapeDim::Fixed(n)) = a.shape.get(*i as usize) {
                            return Ok(TransValue::Value(Expr::int(*n)));
                        }
                    }
                }
                let idx = self.expr_value(index)?;
                Ok(TransValue::Value(Expr::get_item(
                    Expr::get_attr(Expr::var(v), "shape"),
                    idx,
                )))
            }
            TransValue::Value(Expr::Var(v)) => {
                if let CType::Array(a) = v.ty.clone() {
                    let indices = self.index_list(index)?;
                    Ok(TransValue::Value(a.index_expr(&v, indices)?))
                } else {
                    let idx = self.expr_value(index)?;
                    Ok(TransValue::Value(Expr::get_item(Expr::Var(v), idx)))
                }
            }
            TransValue::Value(e) => {
                let idx = self.expr_value(index)?;
                Ok(TransValue::Value(Expr::get_item(e, idx)))
            }
            other => Err(Error::type_error(format!(
                "subscript on unsupported base {:?}",
                other
            ))),
        }
    }

    /// Flattens a subscript index into one expression per dimension
    fn index_list(&mut self, index: &ast::Expr) -> Result<Vec<Expr>> {
        match &index.kind {
            ast::ExprKind::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.expr_value(item)?);
                }
                Ok(out)
            }
            _ => Ok(vec![self.expr_value(index)?]),
        }
    }

    /// Reads an annotation subscript into (shape, contiguous). A trailing
    /// boolean entry is the contiguity flag, `:` slices are unbound
    /// dimensions, integers are fixed extents.
    fn parse_shape(&mut self, index: &ast::Expr) -> Result<(Vec<ShapeDim>, bool)> {
        let items: Vec<&ast::Expr> = match &index.kind {
            ast::ExprKind::Tuple(entries) => entries.iter().collect(),
            _ => vec![index],
        };
        let mut shape = Vec::new();
        let mut contiguous = false;
        let last = items.len().saturating_sub(1);
        for (i, item) in items.iter().enumerate() {
            match &item.kind {
                ast::ExprKind::Bool(flag) if i == last && items.len() > 1 => {
                    contiguous = *flag;
                }
                ast::ExprKind::Int(n) if *n > 0 => shape.push(ShapeDim::Fixed(*n)),
                ast::ExprKind::Int(n) => {
                    return Err(Error::type_error(format!(
                        "array dimension must be positive, got {}",
                        n
                    )))
                }
                ast::ExprKind::Slice { .. } => shape.push(ShapeDim::Unbound),
                ast::ExprKind::Name(name) => match self.ctx.get(name) {
                    Some(Binding::ConstAlias(Expr::Const(Literal::Int(n)))) => {
                        shape.push(ShapeDim::Fixed(n))
                    }
                    _ => shape.push(ShapeDim::Unbound),
                },
                _ => return Err(Error::type_error("invalid array shape entry")),
            }
        }
        if shape.is_empty() {
            return Err(Error::type_error("array type needs at least one dimension"));
        }
        Ok((shape, contiguous))
    }
}

// ---- helpers ----

/// Removes the common leading indentation, so sources captured from nested
/// scopes translate cleanly
fn dedent(source: &str) -> String {
    let margin = source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    if margin == 0 {
        return source.to_string();
    }
    source
        .lines()
        .map(|l| if l.len() >= margin { &l[margin..] } else { "" })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits a leading doc string off a function body
fn split_doc(body: &[ast::Stmt]) -> (String, &[ast::Stmt]) {
    if let Some((first, rest)) = body.split_first() {
        if let ast::StmtKind::ExprStmt { value } = &first.kind {
            if let ast::ExprKind::Str(s) = &value.kind {
                return (s.trim().replace('\n', " "), rest);
            }
        }
    }
    (String::new(), body)
}

/// The member name when `target` is `self.<name>`
fn self_attr(target: &ast::Expr) -> Option<&str> {
    if let ast::ExprKind::Attribute { value, attr } = &target.kind {
        if matches!(&value.kind, ast::ExprKind::Name(n) if n == "self") {
            return Some(attr);
        }
    }
    None
}

/// Double leading underscore without a trailing one marks a private member
fn is_private(name: &str) -> bool {
    name.starts_with("__") && !name.ends_with("__")
}

/// A literal constant usable in a member-initializer list
fn literal_expr(value: &ast::Expr) -> Option<Expr> {
    match &value.kind {
        ast::ExprKind::Int(v) => Some(Expr::int(*v)),
        ast::ExprKind::Float(v) => Some(Expr::float(*v)),
        ast::ExprKind::Bool(v) => Some(Expr::bool(*v)),
        ast::ExprKind::UnaryOp {
            op: ast::UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ast::ExprKind::Int(v) => Some(Expr::int(-v)),
            ast::ExprKind::Float(v) => Some(Expr::float(-v)),
            _ => None,
        },
        _ => None,
    }
}

/// int unless either bound needs 64 bits
fn loop_var_type(start: &Expr, stop: &Expr) -> Primitive {
    let wide = |e: &Expr| match e {
        Expr::Const(Literal::Int(n)) => i32::try_from(*n).is_err(),
        Expr::Var(v) => matches!(v.ty, CType::Primitive(Primitive::Long)),
        _ => false,
    };
    if wide(start) || wide(stop) {
        Primitive::Long
    } else {
        Primitive::Int
    }
}

fn binary_op(op: ast::BinOp) -> BinaryOp {
    match op {
        ast::BinOp::Add => BinaryOp::Add,
        ast::BinOp::Sub => BinaryOp::Sub,
        ast::BinOp::Mul => BinaryOp::Mul,
        ast::BinOp::Div => BinaryOp::Div,
        ast::BinOp::Mod => BinaryOp::Mod,
        ast::BinOp::LShift => BinaryOp::Shl,
        ast::BinOp::RShift => BinaryOp::Shr,
        ast::BinOp::BitAnd => BinaryOp::BitAnd,
        ast::BinOp::BitXor => BinaryOp::BitXor,
        ast::BinOp::BitOr => BinaryOp::BitOr,
        ast::BinOp::And => BinaryOp::LogicalAnd,
        ast::BinOp::Or => BinaryOp::LogicalOr,
    }
}

fn unary_op(op: ast::UnaryOp) -> UnaryOp {
    match op {
        ast::UnaryOp::Pos => UnaryOp::Pos,
        ast::UnaryOp::Neg => UnaryOp::Neg,
        ast::UnaryOp::Not => UnaryOp::Not,
        ast::UnaryOp::Invert => UnaryOp::Invert,
    }
}

fn compare_op(op: ast::CmpOp) -> BinaryOp {
    match op {
        ast::CmpOp::Eq => BinaryOp::Eq,
        ast::CmpOp::NotEq => BinaryOp::Ne,
        ast::CmpOp::Lt => BinaryOp::Lt,
        ast::CmpOp::LtEq => BinaryOp::Le,
        ast::CmpOp::Gt => BinaryOp::Gt,
        ast::CmpOp::GtEq => BinaryOp::Ge,
    }
}

fn inplace_op(op: ast::BinOp) -> Option<InplaceOp> {
    match op {
        ast::BinOp::Add => Some(InplaceOp::Add),
        ast::BinOp::Sub => Some(InplaceOp::Sub),
        ast::BinOp::Mul => Some(InplaceOp::Mul),
        ast::BinOp::Div => Some(InplaceOp::Div),
        ast::BinOp::Mod => Some(InplaceOp::Mod),
        ast::BinOp::LShift => Some(InplaceOp::Shl),
        ast::BinOp::RShift => Some(InplaceOp::Shr),
        ast::BinOp::BitAnd => Some(InplaceOp::BitAnd),
        ast::BinOp::BitXor => Some(InplaceOp::BitXor),
        ast::BinOp::BitOr => Some(InplaceOp::BitOr),
        ast::BinOp::And | ast::BinOp::Or => None,
    }
}

/// Picks the statement form matching the resolved target shape
fn assign_stmt(target: Expr, value: Expr) -> Stmt {
    match target {
        Expr::GetAttr { obj, attr, arrow } => Stmt::SetAttr {
            obj: *obj,
            attr,
            arrow,
            value,
        },
        Expr::GetItem { obj, index } => Stmt::SetItem {
            obj: *obj,
            index: *index,
            value,
        },
        other => Stmt::Assign {
            target: other,
            value,
        },
    }
}
