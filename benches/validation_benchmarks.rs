use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use sieve::validation::*;
use sieve::{Array, CompiledRules, Options, PathStep, Required, RuleSet, Value, registry, rules, validate};

fn bench_path_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_parsing");

    let paths = vec!["field", "object.field", "object.array[].field", "matrix[][].cell.value"];

    group.bench_function("parse_paths", |b| {
        b.iter(|| {
            for path in &paths {
                PathStep::parse(black_box(path)).unwrap();
            }
        })
    });

    group.finish();
}

fn order_rules() -> RuleSet {
    RuleSet::new()
        .field("customer.email", rules![Required, Email])
        .field("customer.name", rules![Required, StringRule, Between::new(2.0, 64.0)])
        .field("lines", rules![Required, Array, Min(1.0)])
        .field("lines[].sku", rules![Required, AlphaNum])
        .field("lines[].quantity", rules![Required, Integer, Min(1.0)])
        .field("lines[].price", rules![Required, Numeric])
        .field("placed_at", rules![Required, Date::new()])
        .field("ships_at", rules![Date::new(), After::new("placed_at")])
}

fn order(lines: usize) -> Value {
    let lines: Vec<_> = (0..lines)
        .map(|i| json!({ "sku": format!("SKU{}", i), "quantity": "2", "price": "9.99" }))
        .collect();
    Value::from(json!({
        "customer": { "email": "ada@example.com", "name": "Ada" },
        "lines": lines,
        "placed_at": "2024-03-01",
        "ships_at": "2024-03-04"
    }))
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("order_rules", |b| {
        b.iter(|| black_box(order_rules()).compile().unwrap())
    });

    let declarations = json!({
        "email": ["required", "email"],
        "tags": ["array", "distinct", "max:10"],
        "tags[]": ["string", "between:2,20"],
        "address": { "": ["nullable", "object"], "zip": ["required", "regex:^[0-9]{5}$"] }
    });
    let registry = registry();
    group.bench_function("from_declarations", |b| {
        b.iter(|| {
            RuleSet::from_json(black_box(&declarations), &registry)
                .unwrap()
                .compile()
                .unwrap()
        })
    });

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    let compiled: CompiledRules = order_rules().compile().unwrap();

    for lines in [1, 10, 100] {
        let data = order(lines);
        group.bench_function(format!("order_{}_lines", lines), |b| {
            b.iter(|| {
                let mut data = data.clone();
                validate(Options::new(black_box(&mut data), &compiled))
            })
        });
    }

    let mut invalid = order(10);
    if let Some(lines) = invalid
        .pointer_mut(&["lines".into()])
        .and_then(Value::as_sequence_mut)
    {
        for line in lines.iter_mut() {
            line.set_pointer(&["quantity".into()], Value::from("many"));
        }
    }
    group.bench_function("order_10_invalid_lines", |b| {
        b.iter(|| {
            let mut data = invalid.clone();
            validate(Options::new(black_box(&mut data), &compiled))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_path_parsing, bench_compile, bench_validate);
criterion_main!(benches);
