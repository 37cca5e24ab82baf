//! pybind11-style binding glue.
//!
//! Walks the translated module block and appends, under `#ifdef PYBIND`
//! guards, the include and namespace alias to the header region, buffer
//! unwrapping wrappers next to the translated functions, and a
//! `PYBIND11_MODULE` scope full of registrations to the footer region.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::cpp::{
    AccessLabel, ArrayType, Block, BlockKind, CType, Expr, FunctionSig, Primitive, Stmt, Variable,
};
use crate::error::Result;
use crate::session::{Session, REGION_FOOTER, REGION_HEADER, REGION_MAIN};

lazy_static! {
    /// Native operator spellings back to their Python dunder names
    static ref PY_OPERATORS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("operator +", "__add__");
        m.insert("operator -", "__sub__");
        m.insert("operator *", "__mul__");
        m.insert("operator /", "__truediv__");
        m.insert("operator %", "__mod__");
        m.insert("operator <<", "__lshift__");
        m.insert("operator >>", "__rshift__");
        m.insert("operator &", "__and__");
        m.insert("operator ^", "__xor__");
        m.insert("operator |", "__or__");
        m.insert("operator ==", "__eq__");
        m.insert("operator <", "__lt__");
        m.insert("operator >", "__gt__");
        m.insert("operator []", "__getitem__");
        m.insert("operator ()", "__call__");
        m
    };
}

#[derive(Debug, Clone)]
struct ClassInfo {
    name: String,
    fields: Vec<String>,
    methods: Vec<FunctionSig>,
    static_methods: Vec<FunctionSig>,
    operators: Vec<FunctionSig>,
    ctor_params: Option<Vec<(CType, String)>>,
}

/// Generates the binding glue for everything in the session's main region
pub fn bind_module(session: &mut Session, name: &str) -> Result<()> {
    let (functions, classes) = collect(session);
    debug!(
        module = name,
        functions = functions.len(),
        classes = classes.len(),
        "generating bindings"
    );
    session.set_libname(name);

    // header: include + namespace alias, guarded
    let mut header_guard = Block::new(BlockKind::IfDef("PYBIND".to_string()));
    header_guard.add(Stmt::Include("pybind11/pybind11.h".to_string()));
    header_guard.add(Stmt::ExprStmt(Expr::name("namespace py = pybind11")));
    session
        .block_or_create(REGION_HEADER)
        .add(Stmt::BlockStmt(header_guard));

    // wrappers for functions taking array parameters, next to the originals
    let mut registrations: Vec<Stmt> = Vec::new();
    for sig in &functions {
        let registered = match wrap_function(sig) {
            Some((wrapper_block, wrapper_sig)) => {
                let mut guard = Block::new(BlockKind::IfDef("PYBIND".to_string()));
                guard.add(Stmt::BlockStmt(wrapper_block));
                session
                    .block_or_create(REGION_MAIN)
                    .add(Stmt::BlockStmt(guard));
                wrapper_sig
            }
            None => sig.clone(),
        };
        registrations.push(register_function(&registered));
    }
    for class in &classes {
        let (regs, wrappers) = register_class(class);
        for wrapper in wrappers {
            let mut guard = Block::new(BlockKind::IfDef("PYBIND".to_string()));
            guard.add(Stmt::BlockStmt(wrapper));
            session
                .block_or_create(REGION_MAIN)
                .add(Stmt::BlockStmt(guard));
        }
        registrations.extend(regs);
    }

    let mut module_scope = Block::new(BlockKind::BindModule(name.to_string()));
    for stmt in registrations {
        module_scope.add(stmt);
    }
    let mut footer_guard = Block::new(BlockKind::IfDef("PYBIND".to_string()));
    footer_guard.add(Stmt::BlockStmt(module_scope));
    session
        .block_or_create(REGION_FOOTER)
        .add(Stmt::BlockStmt(footer_guard));
    Ok(())
}

/// Pulls the function signatures and class layouts out of the main region
fn collect(session: &Session) -> (Vec<FunctionSig>, Vec<ClassInfo>) {
    let mut functions = Vec::new();
    let mut classes = Vec::new();
    let main = match session.block(REGION_MAIN) {
        Some(block) => block,
        None => return (functions, classes),
    };
    for stmt in &main.statements {
        if let Stmt::BlockStmt(block) = stmt {
            match &block.kind {
                BlockKind::Function(sig) => functions.push(sig.clone()),
                BlockKind::Class(name) => classes.push(collect_class(name, block)),
                _ => {}
            }
        }
    }
    (functions, classes)
}

fn collect_class(name: &str, class_block: &Block) -> ClassInfo {
    let mut info = ClassInfo {
        name: name.to_string(),
        fields: Vec::new(),
        methods: Vec::new(),
        static_methods: Vec::new(),
        operators: Vec::new(),
        ctor_params: None,
    };
    for stmt in &class_block.statements {
        let access = match stmt {
            Stmt::BlockStmt(b) => b,
            _ => continue,
        };
        // only public members cross the binding boundary
        if !matches!(access.kind, BlockKind::Access(AccessLabel::Public)) {
            continue;
        }
        for member in &access.statements {
            match member {
                Stmt::VarDecl {
                    var, qualifiers, ..
                } if !qualifiers.iter().any(|q| q == "static") => {
                    info.fields.push(var.name.clone());
                }
                Stmt::BlockStmt(b) => match &b.kind {
                    BlockKind::Function(sig) if sig.name.starts_with("operator") => {
                        info.operators.push(sig.clone());
                    }
                    BlockKind::Function(sig)
                        if sig.qualifiers.iter().any(|q| q == "static") =>
                    {
                        info.static_methods.push(sig.clone());
                    }
                    BlockKind::Function(sig) => info.methods.push(sig.clone()),
                    BlockKind::Constructor { params, .. } => {
                        info.ctor_params = Some(params.clone());
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }
    info
}

/// The array parameters of a signature, with their element types
fn array_params(sig: &FunctionSig) -> Vec<(String, ArrayType)> {
    sig.params
        .iter()
        .filter_map(|(ty, name)| match ty {
            CType::Array(a) => Some((name.clone(), a.clone())),
            _ => None,
        })
        .collect()
}

/// Builds the buffer-unwrapping wrapper for a function with array
/// parameters: each `py::buffer` is `.request()`ed and rebuilt as the typed
/// array handle before forwarding. Returns `None` when no wrapping is
/// needed.
fn wrap_function(sig: &FunctionSig) -> Option<(Block, FunctionSig)> {
    let arrays = array_params(sig);
    if arrays.is_empty() {
        return None;
    }
    let wrapped_params: Vec<(CType, String)> = sig
        .params
        .iter()
        .map(|(ty, name)| (ty.wrapped(), name.clone()))
        .collect();
    let wrapper_sig = FunctionSig {
        name: sig.name.clone(),
        params: wrapped_params,
        ret: sig.ret.clone(),
        qualifiers: Vec::new(),
        doc: sig.doc.clone(),
    };

    let mut block = Block::new(BlockKind::Function(wrapper_sig.clone()));
    unwrap_buffers(&mut block, &arrays);
    let forward = Expr::call(Expr::name(sig.name.clone()), forwarded_args(&sig.params));
    if matches!(sig.ret, CType::Primitive(Primitive::Void)) {
        block.add(Stmt::ExprStmt(forward));
    } else {
        block.add(Stmt::Return(Some(forward)));
    }
    Some((block, wrapper_sig))
}

/// Same wrapper synthesis for a method: the receiver rides along as a
/// leading reference parameter so the wrapper stays a free function the
/// registration can point at.
fn wrap_method(class: &str, sig: &FunctionSig, is_static: bool) -> Option<(Block, FunctionSig)> {
    let arrays = array_params(sig);
    if arrays.is_empty() {
        return None;
    }
    let mut params: Vec<(CType, String)> = Vec::new();
    if !is_static {
        params.push((CType::Alias(format!("{}&", class)), "self".to_string()));
    }
    params.extend(sig.params.iter().map(|(ty, name)| (ty.wrapped(), name.clone())));
    let wrapper_sig = FunctionSig {
        name: format!("{}_{}", class, sig.name),
        params,
        ret: sig.ret.clone(),
        qualifiers: Vec::new(),
        doc: sig.doc.clone(),
    };

    let mut block = Block::new(BlockKind::Function(wrapper_sig.clone()));
    unwrap_buffers(&mut block, &arrays);
    let callee = if is_static {
        Expr::scope_res(Expr::name(class), Expr::name(sig.name.clone()))
    } else {
        Expr::get_attr_with(Expr::name("self"), sig.name.clone(), false)
    };
    let forward = Expr::call(callee, forwarded_args(&sig.params));
    if matches!(sig.ret, CType::Primitive(Primitive::Void)) {
        block.add(Stmt::ExprStmt(forward));
    } else {
        block.add(Stmt::Return(Some(forward)));
    }
    Some((block, wrapper_sig))
}

/// Factory wrapper for a constructor with array parameters, registered
/// through `py::init(&Class_init)`
fn wrap_constructor(class: &str, params: &[(CType, String)]) -> Option<(Block, FunctionSig)> {
    let arrays: Vec<(String, ArrayType)> = params
        .iter()
        .filter_map(|(ty, name)| match ty {
            CType::Array(a) => Some((name.clone(), a.clone())),
            _ => None,
        })
        .collect();
    if arrays.is_empty() {
        return None;
    }
    let wrapper_sig = FunctionSig {
        name: format!("{}_init", class),
        params: params
            .iter()
            .map(|(ty, name)| (ty.wrapped(), name.clone()))
            .collect(),
        ret: CType::Alias(class.to_string()),
        qualifiers: Vec::new(),
        doc: String::new(),
    };
    let mut block = Block::new(BlockKind::Function(wrapper_sig.clone()));
    unwrap_buffers(&mut block, &arrays);
    let construct = Expr::call(Expr::name(class), forwarded_args(params));
    block.add(Stmt::Return(Some(construct)));
    Some((block, wrapper_sig))
}

/// Emits the `.request()` unwrap and typed-handle rebuild for each array
/// parameter
fn unwrap_buffers(block: &mut Block, arrays: &[(String, ArrayType)]) {
    for (name, array) in arrays {
        let buffer = format!("buffer_{}", name);
        let request = Expr::call(Expr::get_attr_with(Expr::name(name.clone()), "request", false), vec![]);
        block.add(Stmt::VarDecl {
            var: Variable::new(buffer.clone(), CType::Alias("auto".to_string())),
            init: Some(request),
            qualifiers: Vec::new(),
        });
        let rebuilt = Expr::call(Expr::name(array.cname()), vec![Expr::name(buffer)]);
        block.add(Stmt::VarDecl {
            var: Variable::new(format!("_{}", name), CType::Array(array.clone())),
            init: Some(rebuilt),
            qualifiers: Vec::new(),
        });
    }
}

/// Argument list forwarding each array parameter as its rebuilt handle
fn forwarded_args(params: &[(CType, String)]) -> Vec<Expr> {
    params
        .iter()
        .map(|(ty, name)| match ty {
            CType::Array(_) => Expr::name(format!("_{}", name)),
            _ => Expr::name(name.clone()),
        })
        .collect()
}

/// `Ret (*)(Args)` / `Ret (Scope::*)(Args)`
fn fn_pointer_signature(ret: &CType, params: &[(CType, String)], scope: Option<&str>) -> String {
    let args = params
        .iter()
        .map(|(ty, _)| ty.spelling())
        .collect::<Vec<_>>()
        .join(", ");
    match scope {
        Some(scope) => format!("{} ({}::*)({})", ret.spelling(), scope, args),
        None => format!("{} (*)({})", ret.spelling(), args),
    }
}

/// `m.def("name", (sig)&name, "doc");`
fn register_function(sig: &FunctionSig) -> Stmt {
    let cast = Expr::cast(
        fn_pointer_signature(&sig.ret, &sig.params, None),
        Expr::address_of(Expr::name(sig.name.clone())),
    );
    Stmt::ExprStmt(Expr::call(
        Expr::get_attr_with(Expr::name("m"), "def", false),
        vec![Expr::str(sig.name.clone()), cast, Expr::str(sig.doc.clone())],
    ))
}

/// Registration statements for a class, plus the wrapper functions that
/// must be emitted next to it for members taking array parameters
fn register_class(info: &ClassInfo) -> (Vec<Stmt>, Vec<Block>) {
    let handle = format!("class_{}", info.name);
    let mut out = Vec::new();
    let mut wrappers = Vec::new();

    // auto class_Name = py::class_<Name>(m, "Name");
    let class_template = Expr::template(
        Expr::scope_res(Expr::name("py"), Expr::name("class_")),
        vec![Expr::name(info.name.clone())],
    );
    let construct = Expr::call(
        class_template,
        vec![Expr::name("m"), Expr::str(info.name.clone())],
    );
    out.push(Stmt::VarDecl {
        var: Variable::new(handle.clone(), CType::Alias("auto".to_string())),
        init: Some(construct),
        qualifiers: Vec::new(),
    });

    let def = |method: &str, args: Vec<Expr>| {
        Stmt::ExprStmt(Expr::call(
            Expr::get_attr_with(Expr::name(handle.clone()), method, false),
            args,
        ))
    };

    if let Some(params) = &info.ctor_params {
        match wrap_constructor(&info.name, params) {
            Some((block, wsig)) => {
                wrappers.push(block);
                let factory = Expr::call(
                    Expr::scope_res(Expr::name("py"), Expr::name("init")),
                    vec![Expr::address_of(Expr::name(wsig.name))],
                );
                out.push(def("def", vec![factory]));
            }
            None => {
                let init = Expr::call(
                    Expr::template(
                        Expr::scope_res(Expr::name("py"), Expr::name("init")),
                        params.iter().map(|(t, _)| Expr::name(t.spelling())).collect(),
                    ),
                    vec![],
                );
                out.push(def("def", vec![init]));
            }
        }
    }
    for field in &info.fields {
        out.push(def(
            "def_readwrite",
            vec![
                Expr::str(field.clone()),
                Expr::address_of(Expr::name(format!("{}::{}", info.name, field))),
            ],
        ));
    }
    for sig in &info.methods {
        let cast = match wrap_method(&info.name, sig, false) {
            Some((block, wsig)) => {
                wrappers.push(block);
                Expr::cast(
                    fn_pointer_signature(&wsig.ret, &wsig.params, None),
                    Expr::address_of(Expr::name(wsig.name)),
                )
            }
            None => Expr::cast(
                fn_pointer_signature(&sig.ret, &sig.params, Some(&info.name)),
                Expr::address_of(Expr::name(format!("{}::{}", info.name, sig.name))),
            ),
        };
        out.push(def(
            "def",
            vec![Expr::str(sig.name.clone()), cast, Expr::str(sig.doc.clone())],
        ));
    }
    for sig in &info.static_methods {
        let cast = match wrap_method(&info.name, sig, true) {
            Some((block, wsig)) => {
                wrappers.push(block);
                Expr::cast(
                    fn_pointer_signature(&wsig.ret, &wsig.params, None),
                    Expr::address_of(Expr::name(wsig.name)),
                )
            }
            None => Expr::cast(
                fn_pointer_signature(&sig.ret, &sig.params, None),
                Expr::address_of(Expr::name(format!("{}::{}", info.name, sig.name))),
            ),
        };
        out.push(def(
            "def_static",
            vec![Expr::str(sig.name.clone()), cast, Expr::str(sig.doc.clone())],
        ));
    }
    for sig in &info.operators {
        let py_name = PY_OPERATORS
            .get(sig.name.as_str())
            .copied()
            .unwrap_or(sig.name.as_str());
        let cast = Expr::cast(
            fn_pointer_signature(&sig.ret, &sig.params, Some(&info.name)),
            Expr::address_of(Expr::name(format!("{}::{}", info.name, sig.name))),
        );
        out.push(def(
            "def",
            vec![
                Expr::str(py_name),
                cast,
                Expr::call(
                    Expr::scope_res(Expr::name("py"), Expr::name("is_operator")),
                    vec![],
                ),
            ],
        ));
    }
    (out, wrappers)
}
