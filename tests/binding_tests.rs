//! Full-pipeline tests: rendered translation units with binding glue

use pycpp::transpile;

fn unit(source: &str, name: &str) -> String {
    transpile(source, name).unwrap()
}

// ====================
// Skeleton
// ====================

#[test]
fn test_skeleton_macros_and_array_header() {
    let out = unit("def f() -> Int:\n    return 1\n", "demo");
    assert!(out.starts_with("#define _likely(x) __builtin_expect((x), 1)"));
    assert!(out.contains("#define _unlikely(x) __builtin_expect((x), 0)"));
    assert!(out.contains("#include <array.h>"));
}

#[test]
fn test_binding_glue_is_guarded() {
    let out = unit("def f() -> Int:\n    return 1\n", "demo");
    assert!(out.contains("#ifdef PYBIND"));
    assert!(out.contains("#include <pybind11/pybind11.h>"));
    assert!(out.contains("namespace py = pybind11;"));
    // every #ifdef is closed
    assert_eq!(out.matches("#ifdef PYBIND").count(), out.matches("#endif").count());
}

// ====================
// Function registration
// ====================

#[test]
fn test_function_registered_with_cast_and_doc() {
    let out = unit(
        "def double(x: Int) -> Int:\n    \"doubles x\"\n    return x * 2\n",
        "demo",
    );
    assert!(out.contains("PYBIND11_MODULE(demo, m) {"));
    assert!(out.contains("m.def(\"double\", (int (*)(int))&double, \"doubles x\");"));
}

#[test]
fn test_array_parameter_gets_buffer_wrapper() {
    let out = unit(
        "def total(arr: Double[:, True]) -> Double:\n    acc: Double = 0.0\n    for i in range(len(arr)):\n        acc += arr[i]\n    return acc\n",
        "sums",
    );
    // the wrapper takes the capsule, unwraps it, and forwards
    assert!(out.contains("double total(py::buffer arr) {"));
    assert!(out.contains("auto buffer_arr = arr.request();"));
    assert!(out.contains("Array<double, 1> _arr = Array<double, 1>(buffer_arr);"));
    assert!(out.contains("return total(_arr);"));
    // the registration casts to the wrapped signature
    assert!(out.contains("m.def(\"total\", (double (*)(py::buffer))&total, \"\");"));
}

// ====================
// Class registration
// ====================

#[test]
fn test_class_registration_fields_and_init() {
    let out = unit(
        "class Point:\n    def __init__(self, x: Int, y: Int):\n        self.x: Int = 0\n        self.y: Int = 0\n    def dist2(self) -> Int:\n        \"squared norm\"\n        return self.x * self.x + self.y * self.y\n",
        "geo",
    );
    assert!(out.contains("auto class_Point = py::class_<Point>(m, \"Point\");"));
    assert!(out.contains("class_Point.def(py::init<int, int>());"));
    assert!(out.contains("class_Point.def_readwrite(\"x\", &Point::x);"));
    assert!(out.contains("class_Point.def_readwrite(\"y\", &Point::y);"));
    assert!(out.contains(
        "class_Point.def(\"dist2\", (int (Point::*)())&Point::dist2, \"squared norm\");"
    ));
}

#[test]
fn test_operator_method_registered_as_operator() {
    let out = unit(
        "class Acc:\n    def __init__(self):\n        self.v: Int = 0\n    def __add__(self, other: Int) -> Int:\n        return self.v + other\n",
        "ops",
    );
    assert!(out.contains("int operator +(int other) {"));
    assert!(out.contains(
        "class_Acc.def(\"__add__\", (int (Acc::*)(int))&Acc::operator +, py::is_operator());"
    ));
}

#[test]
fn test_method_array_parameter_gets_buffer_wrapper() {
    let out = unit(
        "class Acc:\n    def __init__(self):\n        self.total: Double = 0.0\n    def absorb(self, arr: Double[:]) -> None:\n        self.total += arr[0]\n",
        "accs",
    );
    // the wrapper takes the receiver by reference, unwraps the capsule,
    // and forwards through the receiver
    assert!(out.contains("void Acc_absorb(Acc& self, py::buffer arr) {"));
    assert!(out.contains("auto buffer_arr = arr.request();"));
    assert!(out.contains("Array<double, 1> _arr = Array<double, 1>(buffer_arr);"));
    assert!(out.contains("self.absorb(_arr);"));
    // the registration points at the wrapper, not the raw member
    assert!(out.contains(
        "class_Acc.def(\"absorb\", (void (*)(Acc&, py::buffer))&Acc_absorb, \"\");"
    ));
    assert!(!out.contains("&Acc::absorb"));
}

#[test]
fn test_constructor_array_parameter_registers_factory() {
    let out = unit(
        "class Series:\n    def __init__(self, arr: Double[:]):\n        self.first: Double = 0.0\n",
        "series",
    );
    assert!(out.contains("Series Series_init(py::buffer arr) {"));
    assert!(out.contains("return Series(_arr);"));
    assert!(out.contains("class_Series.def(py::init(&Series_init));"));
}

#[test]
fn test_private_members_not_registered() {
    let out = unit(
        "class Box:\n    def __init__(self):\n        self.__secret: Int = 0\n        self.open: Int = 1\n    def __peek(self) -> Int:\n        return self.__secret\n",
        "boxes",
    );
    assert!(out.contains("def_readwrite(\"open\""));
    assert!(!out.contains("def_readwrite(\"__secret\""));
    assert!(!out.contains("def(\"__peek\""));
}

#[test]
fn test_static_method_registered_with_def_static() {
    let out = unit(
        "class Util:\n    @staticmethod\n    def twice(x: Int) -> Int:\n        return x * 2\n",
        "utils",
    );
    assert!(out.contains("static int twice(int x) {"));
    assert!(out.contains("class_Util.def_static(\"twice\", (int (*)(int))&Util::twice, \"\");"));
}
