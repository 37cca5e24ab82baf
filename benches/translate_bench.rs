use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pycpp::{transpile, Scanner, Session, Translator};

const FACTORIAL: &str = "def fact(n: Int) -> Int:\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)\n";

const ARRAY_SUM: &str = "def total(arr: Double[:, True]) -> Double:\n    acc: Double = 0.0\n    for i in range(len(arr)):\n        acc += arr[i]\n    return acc\n";

fn scanner_benchmark(c: &mut Criterion) {
    c.bench_function("scan factorial", |b| {
        b.iter(|| Scanner::new(black_box(FACTORIAL)).scan_tokens().unwrap())
    });
}

fn translate_benchmark(c: &mut Criterion) {
    c.bench_function("translate factorial", |b| {
        b.iter(|| {
            let mut session = Session::new();
            let mut translator = Translator::new(&mut session);
            translator.translate(black_box(FACTORIAL)).unwrap()
        })
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    c.bench_function("transpile array sum", |b| {
        b.iter(|| transpile(black_box(ARRAY_SUM), "bench").unwrap())
    });
}

criterion_group!(benches, scanner_benchmark, translate_benchmark, pipeline_benchmark);
criterion_main!(benches);
