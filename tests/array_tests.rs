//! Array typing and indexing: shape annotations, contiguity, index
//! synthesis, and the shape proxy

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

// ====================
// Annotations
// ====================

#[test]
fn test_unbound_dimension_annotation() {
    let out = text("def f(arr: Double[:]) -> Double:\n    return arr[0]\n");
    assert!(out.contains("double f(Array<double, 1> arr) {"));
}

#[test]
fn test_two_dimensional_annotation() {
    let out = text("def f(m: Int[:, 4]) -> Int:\n    return m[0, 0]\n");
    assert!(out.contains("int f(Array<int, 2> m) {"));
}

#[test]
fn test_contiguous_with_runtime_inner_dimension_fails() {
    let err = translate("def f(m: Int[:, :, True]) -> Int:\n    return 0\n").unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
}

// ====================
// Index synthesis
// ====================

#[test]
fn test_strided_index_divides_by_itemsize() {
    let out = text("def f(arr: Double[:]) -> Double:\n    return arr[3]\n");
    assert!(out.contains("return arr.data[(3 * arr.strides[0]) / 8];"));
}

#[test]
fn test_contiguous_index_folds_row_major_strides() {
    let out = text(
        "def f(m: Double[:, 3, True], i: Int, j: Int) -> Double:\n    return m[i, j]\n",
    );
    assert!(out.contains("return m.data[i * 3 + j];"));
}

#[test]
fn test_two_dimensional_strided_index() {
    let out = text(
        "def f(m: Double[:, :], i: Int, j: Int) -> Double:\n    return m[i, j]\n",
    );
    assert!(out.contains(
        "return m.data[(i * m.strides[0] + j * m.strides[1]) / 8];"
    ));
}

#[test]
fn test_index_arity_mismatch_fails() {
    let err = translate("def f(m: Double[:, :]) -> Double:\n    return m[0]\n").unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
}

#[test]
fn test_array_element_assignment() {
    let out = text(
        "def fill(arr: Double[:, True], n: Int) -> None:\n    for i in range(n):\n        arr[i] = 0.0\n",
    );
    assert!(out.contains("arr.data[i] = 0.0;"));
}

// ====================
// Shape proxy and len
// ====================

#[test]
fn test_shape_of_fixed_dimension_is_inlined() {
    let out = text("def f(m: Double[:, 3]) -> Int:\n    return m.shape[1]\n");
    assert!(out.contains("return 3;"));
}

#[test]
fn test_shape_of_unbound_dimension_reads_runtime_shape() {
    let out = text("def f(m: Double[:, 3]) -> Int:\n    return m.shape[0]\n");
    assert!(out.contains("return m.shape[0];"));
}

#[test]
fn test_len_uses_first_dimension() {
    let fixed = text("def f(arr: Double[16]) -> Int:\n    return len(arr)\n");
    assert!(fixed.contains("return 16;"));
    let unbound = text("def f(arr: Double[:]) -> Int:\n    return len(arr)\n");
    assert!(unbound.contains("return arr.shape[0];"));
}

// ====================
// Scenario: contiguous array sum
// ====================

#[test]
fn test_contiguous_array_sum_scenario() {
    let out = translate(
        "def total(arr: Double[:, True]) -> Double:\n    acc: Double = 0.0\n    for i in range(len(arr)):\n        acc += arr[i]\n    return acc\n",
    )
    .unwrap()
    .translate();
    assert_eq!(
        out,
        vec![
            "double total(Array<double, 1> arr) {",
            "    double acc = 0.0;",
            "    for (int i = 0; i < arr.shape[0]; i++) {",
            "        acc += arr.data[i];",
            "    }",
            "    return acc;",
            "}"
        ]
    );
}
