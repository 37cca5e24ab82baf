//! Class translation: member layout, access regions, constructors, and
//! static-property hoisting

use pycpp::cpp::Block;
use pycpp::{Error, Session, Translator};

fn translate(source: &str) -> Result<Block, Error> {
    let mut session = Session::new();
    let mut translator = Translator::new(&mut session);
    translator.translate(source)
}

fn text(source: &str) -> String {
    translate(source).unwrap().translate().join("\n")
}

#[test]
fn test_instance_members_declared_in_class_body() {
    let out = text(
        "class Point:\n    def __init__(self):\n        self.x: Int = 0\n        self.y: Double = 0.0\n",
    );
    assert!(out.contains("int x;"));
    assert!(out.contains("double y;"));
}

#[test]
fn test_literal_initializers_move_to_init_list() {
    let out = text(
        "class Point:\n    def __init__(self):\n        self.x: Int = 3\n        self.y: Double = 1.5\n",
    );
    assert!(out.contains("Point() : x(3), y(1.5) {"));
}

#[test]
fn test_non_literal_initializer_assigns_in_body() {
    let out = text(
        "class Scaled:\n    def __init__(self, base: Int):\n        self.v: Int = base * 2\n",
    );
    assert!(out.contains("Scaled(int base) {"));
    assert!(out.contains("this->v = base * 2;"));
}

#[test]
fn test_constructor_parameters_are_usable() {
    let out = text(
        "class Pair:\n    def __init__(self, a: Int, b: Int):\n        self.total: Int = 0\n        self.total: Int = a + b\n",
    );
    assert!(out.contains("Pair(int a, int b)"));
    assert!(out.contains("this->total = a + b;"));
}

#[test]
fn test_methods_see_self_members_through_this() {
    let out = text(
        "class Counter:\n    def __init__(self):\n        self.n: Int = 0\n    def bump(self) -> None:\n        self.n += 1\n",
    );
    assert!(out.contains("void bump() {"));
    assert!(out.contains("this->n += 1;"));
}

#[test]
fn test_static_property_declaration_and_hoisted_definition() {
    let out = text("class Counter:\n    total: Int = 0\n");
    assert!(out.contains("static int total;"));
    let class_end = out.find("};").unwrap();
    let definition = out.find("int Counter::total = 0;").unwrap();
    assert!(definition > class_end);
}

#[test]
fn test_static_member_access_uses_scope_resolution() {
    let out = text(
        "class Counter:\n    total: Int = 0\n    def bump(self) -> None:\n        self.total += 1\n",
    );
    assert!(out.contains("Counter::total += 1;"));
}

#[test]
fn test_private_block_precedes_public() {
    let out = text(
        "class Box:\n    def __init__(self):\n        self.__v: Int = 0\n    def get(self) -> Int:\n        return self.__v\n",
    );
    let private_at = out.find("private:").unwrap();
    let public_at = out.find("public:").unwrap();
    assert!(private_at < public_at);
}

#[test]
fn test_class_instantiation_and_method_call() {
    let out = text(
        "class Point:\n    def __init__(self, x: Int):\n        self.x: Int = 0\n    def get(self) -> Int:\n        return self.x\ndef use() -> Int:\n    p: Point = Point(3)\n    return p.get()\n",
    );
    assert!(out.contains("Point p = Point(3);"));
    assert!(out.contains("return p.get();"));
}

#[test]
fn test_unsupported_class_member_fails() {
    let err = translate("class Bad:\n    for i in range(3):\n        pass\n").unwrap_err();
    assert!(matches!(err, Error::UnsupportedMember { .. }));
}
