use criterion::{black_box, criterion_group, criterion_main, Criterion};
use patito::{compile, Scanner, VirtualMachine};

const FIBONACCI: &str = r#"
    program fib;
    int fib(n : int) [
        {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
    ];
    main() { print(fib(18)); }
    end
"#;

const LOOP: &str = r#"
    program sum;
    var i, acc : int;
    var avg : float;
    main() {
        i = 0;
        acc = 0;
        while (i < 10000) do {
            acc = acc + i * 2 - 1;
            i = i + 1;
        }
        avg = acc / 10000.0;
        print(acc, avg);
    }
    end
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize fibonacci", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new(black_box(FIBONACCI));
            scanner.scan_tokens().unwrap()
        })
    });
}

fn compile_benchmark(c: &mut Criterion) {
    c.bench_function("compile fibonacci", |b| {
        b.iter(|| compile(black_box(FIBONACCI)).unwrap())
    });
}

fn execution_benchmark(c: &mut Criterion) {
    let fib = compile(FIBONACCI).unwrap();
    c.bench_function("execute recursive fib(18)", |b| {
        b.iter(|| VirtualMachine::new(black_box(&fib)).execute().unwrap())
    });

    let counting = compile(LOOP).unwrap();
    c.bench_function("execute 10k iteration loop", |b| {
        b.iter(|| VirtualMachine::new(black_box(&counting)).execute().unwrap())
    });
}

criterion_group!(
    benches,
    lexer_benchmark,
    compile_benchmark,
    execution_benchmark
);
criterion_main!(benches);
