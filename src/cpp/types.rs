use std::collections::BTreeMap;
use std::fmt;

use crate::cpp::expr::{Expr, Variable};
use crate::error::{Error, Result};

/// Dynamic-language value kinds, used for primitive compatibility checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyKind {
    /// Python `int`
    Int,
    /// Python `float`
    Float,
    /// Python `bool`
    Bool,
    /// Python `str`
    Str,
}

/// Primitive C++ types with fixed sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `void`
    Void,
    /// `auto` (deduced; size 0)
    Auto,
}

impl Primitive {
    /// The C++ spelling of this primitive
    pub fn cname(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
            Primitive::Auto => "auto",
        }
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        match self {
            Primitive::Bool | Primitive::Char => 1,
            Primitive::Short => 2,
            Primitive::Int | Primitive::Float => 4,
            Primitive::Long | Primitive::Double => 8,
            Primitive::Void | Primitive::Auto => 0,
        }
    }

    /// Whether a dynamic value of `kind` can initialize this primitive
    pub fn compatible(&self, kind: PyKind) -> bool {
        match self {
            Primitive::Bool => kind == PyKind::Bool || kind == PyKind::Int,
            Primitive::Char | Primitive::Short | Primitive::Int | Primitive::Long => {
                kind == PyKind::Int
            }
            Primitive::Float | Primitive::Double => {
                kind == PyKind::Float || kind == PyKind::Int
            }
            Primitive::Void | Primitive::Auto => false,
        }
    }
}

/// One dimension of an array shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeDim {
    /// Compile-time constant extent
    Fixed(i64),
    /// Extent known only at runtime
    Unbound,
}

/// A typed N-dimensional array over a primitive element type.
///
/// A contiguous array assumes row-major storage with no gaps, which lets the
/// index expression be pure compile-time stride arithmetic. That only works
/// when every dimension after the first is a compile-time constant; the
/// constructor rejects anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// Element type
    pub base: Primitive,
    /// Shape, outermost dimension first
    pub shape: Vec<ShapeDim>,
    /// Row-major contiguous storage assumed
    pub contiguous: bool,
}

impl ArrayType {
    /// Creates an array type, checking the contiguity/shape invariant
    pub fn new(base: Primitive, shape: Vec<ShapeDim>, contiguous: bool) -> Result<Self> {
        if contiguous
            && shape
                .iter()
                .skip(1)
                .any(|d| !matches!(d, ShapeDim::Fixed(_)))
        {
            return Err(Error::type_error(
                "contiguous array requires constant shape except for the first dimension",
            ));
        }
        Ok(ArrayType {
            base,
            shape,
            contiguous,
        })
    }

    /// Number of dimensions
    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    /// Element size in bytes
    pub fn itemsize(&self) -> usize {
        self.base.size()
    }

    /// The C++ spelling, a template instantiation such as `Array<double, 2>`
    pub fn cname(&self) -> String {
        format!("Array<{}, {}>", self.base.cname(), self.dim())
    }

    /// Synthesizes the element-access expression for `var[indices]`.
    ///
    /// Contiguous arrays fold the row-major offset at compile time
    /// (`var.data[(i0 * d1 + i1) * d2 + i2]`); strided arrays read the
    /// runtime strides table and divide by the element size.
    pub fn index_expr(&self, var: &Variable, indices: Vec<Expr>) -> Result<Expr> {
        if indices.len() != self.dim() {
            return Err(Error::type_error(format!(
                "array `{}` has {} dimensions, got {} indices",
                var.name,
                self.dim(),
                indices.len()
            )));
        }
        let data = Expr::get_attr(Expr::var(var.clone()), "data");
        let offset = if self.contiguous {
            let mut indices = indices.into_iter();
            let mut offset = indices.next().unwrap_or(Expr::int(0));
            for (dim, index) in self.shape.iter().skip(1).zip(indices) {
                let extent = match dim {
                    ShapeDim::Fixed(n) => *n,
                    // new() guarantees inner dimensions are constant
                    ShapeDim::Unbound => {
                        return Err(Error::type_error(
                            "contiguous array with runtime inner dimension",
                        ))
                    }
                };
                offset = Expr::binary_add(Expr::binary_mul(offset, Expr::int(extent)), index);
            }
            offset
        } else {
            let strides = Expr::get_attr(Expr::var(var.clone()), "strides");
            let mut terms: Option<Expr> = None;
            for (i, index) in indices.into_iter().enumerate() {
                let term = Expr::binary_mul(
                    index,
                    Expr::get_item(strides.clone(), Expr::int(i as i64)),
                );
                terms = Some(match terms {
                    Some(acc) => Expr::binary_add(acc, term),
                    None => term,
                });
            }
            let sum = terms.unwrap_or(Expr::int(0));
            Expr::binary_div(sum, Expr::int(self.itemsize() as i64))
        };
        Ok(Expr::get_item(data, offset))
    }

    /// The length (`len()`) of the array: the first dimension
    pub fn len_expr(&self, var: &Variable) -> Expr {
        match self.shape.first() {
            Some(ShapeDim::Fixed(n)) => Expr::int(*n),
            _ => Expr::get_item(Expr::get_attr(Expr::var(var.clone()), "shape"), Expr::int(0)),
        }
    }
}

/// How a class member is spelled on the C++ side
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSpelling {
    /// Instance data member
    Field(String),
    /// Static data member (accessed through `Class::name`)
    StaticField(String),
    /// Instance method
    Method(String),
    /// Static method
    StaticMethod(String),
}

impl MemberSpelling {
    /// The native member name
    pub fn name(&self) -> &str {
        match self {
            MemberSpelling::Field(n)
            | MemberSpelling::StaticField(n)
            | MemberSpelling::Method(n)
            | MemberSpelling::StaticMethod(n) => n,
        }
    }

    /// Whether access goes through the class rather than an instance
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            MemberSpelling::StaticField(_) | MemberSpelling::StaticMethod(_)
        )
    }
}

/// A user-defined class type with its member capability table
#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    /// Class name
    pub name: String,
    /// Enclosing namespace, if any
    pub namespace: Option<String>,
    /// Maps source member names to their native spellings
    pub members: BTreeMap<String, MemberSpelling>,
}

impl ClassType {
    /// Creates a class type with no namespace
    pub fn new(name: impl Into<String>) -> Self {
        ClassType {
            name: name.into(),
            namespace: None,
            members: BTreeMap::new(),
        }
    }

    /// The fully qualified C++ spelling
    pub fn cname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}::{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Synthesizes the access expression for a member seen from inside a
    /// method body (`this->x` for instance members, `Class::x` for statics).
    /// Unknown members fall back to a dynamic `this->` access.
    pub fn member_access(&self, member: &str) -> Expr {
        match self.members.get(member) {
            Some(spelling) if spelling.is_static() => Expr::scope_res(
                Expr::name(self.cname()),
                Expr::name(spelling.name().to_string()),
            ),
            Some(spelling) => Expr::get_attr_with(Expr::name("this"), spelling.name(), true),
            None => Expr::get_attr_with(Expr::name("this"), member, true),
        }
    }

    /// Synthesizes the access expression for a member referenced through the
    /// class itself (`Class::x`)
    pub fn static_access(&self, member: &str) -> Expr {
        let spelled = self
            .members
            .get(member)
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| member.to_string());
        Expr::scope_res(Expr::name(self.cname()), Expr::name(spelled))
    }
}

/// A C++ type descriptor: a pure value, immutable after construction
#[derive(Debug, Clone, PartialEq)]
pub enum CType {
    /// Primitive numeric/void type
    Primitive(Primitive),
    /// Pointer to a base type
    Pointer(Box<CType>),
    /// Reference to a base type; cannot be declared without an initializer
    Reference(Box<CType>),
    /// Typed N-dimensional array
    Array(ArrayType),
    /// User-defined class
    Class(ClassType),
    /// A type spelled verbatim (`py::buffer`, `auto`, forward-declared names)
    Alias(String),
}

impl CType {
    /// Shorthand for a primitive type
    pub fn primitive(p: Primitive) -> Self {
        CType::Primitive(p)
    }

    /// Wraps this type in a pointer
    pub fn ptr(self) -> Self {
        CType::Pointer(Box::new(self))
    }

    /// Wraps this type in a reference
    pub fn reference(self) -> Self {
        CType::Reference(Box::new(self))
    }

    /// The native type token
    pub fn cname(&self) -> String {
        match self {
            CType::Primitive(p) => p.cname().to_string(),
            CType::Pointer(base) => base.cname(),
            CType::Reference(base) => format!("{}&", base.cname()),
            CType::Array(a) => a.cname(),
            CType::Class(c) => c.cname(),
            CType::Alias(s) => s.clone(),
        }
    }

    /// Declarator token placed before the variable name (`*` for pointers)
    pub fn prefix(&self) -> &'static str {
        match self {
            CType::Pointer(_) => "*",
            _ => "",
        }
    }

    /// Declarator token placed after the variable name (always empty in the
    /// supported type vocabulary; kept for the declarator contract)
    pub fn suffix(&self) -> &'static str {
        ""
    }

    /// The spelling used in parameter lists and casts: `cname prefix`
    pub fn spelling(&self) -> String {
        let prefix = self.prefix();
        if prefix.is_empty() {
            self.cname()
        } else {
            format!("{} {}", self.cname(), prefix)
        }
    }

    /// Renders a full declaration line for a named variable.
    ///
    /// References must be initialized; pointers without an initializer are
    /// set to `nullptr`.
    pub fn declare(&self, name: &str, init: Option<&Expr>) -> Result<String> {
        match (self, init) {
            (CType::Reference(_), None) => Err(Error::type_error(format!(
                "can't declare reference `{}` without a target",
                name
            ))),
            (CType::Pointer(_), None) => {
                Ok(format!("{} {}{} = nullptr;", self.cname(), self.prefix(), name))
            }
            (_, None) => Ok(format!("{} {}{};", self.cname(), self.prefix(), name)),
            (_, Some(init)) => Ok(format!(
                "{} {}{} = {};",
                self.cname(),
                self.prefix(),
                name,
                init
            )),
        }
    }

    /// Whether this is a pointer (drives `.` vs `->` attribute rendering)
    pub fn is_pointer(&self) -> bool {
        matches!(self, CType::Pointer(_))
    }

    /// Whether this is a primitive numeric type
    pub fn is_primitive(&self) -> bool {
        matches!(self, CType::Primitive(_))
    }

    /// Whether a dynamic value of `kind` is compatible with this type
    pub fn compatible(&self, kind: PyKind) -> bool {
        match self {
            CType::Primitive(p) => p.compatible(kind),
            _ => false,
        }
    }

    /// The type this one crosses the binding boundary as: arrays become the
    /// opaque buffer capsule, everything else passes through
    pub fn wrapped(&self) -> CType {
        match self {
            CType::Array(_) => CType::Alias("py::buffer".to_string()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.spelling())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_primitives() {
        let t = CType::primitive(Primitive::Int);
        assert_eq!(t.declare("n", None).unwrap(), "int n;");
        assert_eq!(
            t.declare("n", Some(&Expr::int(3))).unwrap(),
            "int n = 3;"
        );
    }

    #[test]
    fn test_declare_pointer_defaults_to_nullptr() {
        let t = CType::primitive(Primitive::Double).ptr();
        assert_eq!(t.declare("p", None).unwrap(), "double *p = nullptr;");
    }

    #[test]
    fn test_reference_requires_initializer() {
        let t = CType::primitive(Primitive::Int).reference();
        assert!(t.declare("r", None).is_err());
        assert_eq!(
            t.declare("r", Some(&Expr::name("n"))).unwrap(),
            "int& r = n;"
        );
    }

    #[test]
    fn test_contiguous_array_shape_invariant() {
        // runtime inner dimension is rejected for contiguous arrays
        let bad = ArrayType::new(
            Primitive::Double,
            vec![ShapeDim::Fixed(2), ShapeDim::Unbound],
            true,
        );
        assert!(matches!(bad, Err(Error::TypeError(_))));

        // a runtime first dimension is fine
        let ok = ArrayType::new(
            Primitive::Double,
            vec![ShapeDim::Unbound, ShapeDim::Fixed(2)],
            true,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_array_cname_is_template_instantiation() {
        let a = ArrayType::new(Primitive::Int, vec![ShapeDim::Fixed(3)], false).unwrap();
        assert_eq!(a.cname(), "Array<int, 1>");
    }

    #[test]
    fn test_contiguous_index_folds_strides() {
        let a = ArrayType::new(
            Primitive::Double,
            vec![ShapeDim::Unbound, ShapeDim::Fixed(3)],
            true,
        )
        .unwrap();
        let var = Variable::new("arr", CType::Array(a.clone()));
        let idx = a
            .index_expr(&var, vec![Expr::name("i"), Expr::name("j")])
            .unwrap();
        assert_eq!(idx.to_string(), "arr.data[i * 3 + j]");
    }

    #[test]
    fn test_strided_index_uses_runtime_strides() {
        let a = ArrayType::new(
            Primitive::Double,
            vec![ShapeDim::Unbound, ShapeDim::Unbound],
            false,
        )
        .unwrap();
        let var = Variable::new("arr", CType::Array(a.clone()));
        let idx = a
            .index_expr(&var, vec![Expr::name("i"), Expr::name("j")])
            .unwrap();
        assert_eq!(
            idx.to_string(),
            "arr.data[(i * arr.strides[0] + j * arr.strides[1]) / 8]"
        );
    }

    #[test]
    fn test_primitive_compatibility() {
        assert!(Primitive::Long.compatible(PyKind::Int));
        assert!(Primitive::Double.compatible(PyKind::Float));
        assert!(!Primitive::Int.compatible(PyKind::Float));
    }

    #[test]
    fn test_member_access_spellings() {
        let mut c = ClassType::new("Point");
        c.members
            .insert("x".to_string(), MemberSpelling::Field("x".to_string()));
        c.members.insert(
            "count".to_string(),
            MemberSpelling::StaticField("count".to_string()),
        );
        assert_eq!(c.member_access("x").to_string(), "this->x");
        assert_eq!(c.member_access("count").to_string(), "Point::count");
        assert_eq!(c.static_access("count").to_string(), "Point::count");
    }
}
