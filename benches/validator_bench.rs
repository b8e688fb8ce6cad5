use criterion::{Criterion, criterion_group, criterion_main};
use laxdata::{RepairConfig, Schema, Validator, parse_json};

fn schema() -> Schema {
    let text = r#"{
        "required": ["name", "age"],
        "additionalProperties": false,
        "properties": {
            "name": {"type": "string", "maxLength": 40},
            "age": {"type": "integer", "minimum": 0, "maximum": 130},
            "email": {"type": "string", "format": "email"}
        }
    }"#;
    Schema::new(parse_json(text, &RepairConfig::default()).unwrap())
}

fn bench_validate(c: &mut Criterion) {
    let schema = schema();
    let validator = Validator::new();
    let mut group = c.benchmark_group("validate");

    let valid = parse_json(r#"{"name":"Ada","age":30,"email":"ada@example.com"}"#, &RepairConfig::default()).unwrap();
    group.bench_function("valid_all", |b| {
        b.iter(|| {
            let errs = validator.validate_all(std::hint::black_box(&valid), std::hint::black_box(&schema));
            std::hint::black_box(errs);
        })
    });

    let invalid = parse_json(
        r#"{"name":"Ada","age":"200","email":"not-an-email","extra":1}"#,
        &RepairConfig::default(),
    )
    .unwrap();
    group.bench_function("invalid_collect_all", |b| {
        b.iter(|| {
            let errs = validator.validate_all(std::hint::black_box(&invalid), std::hint::black_box(&schema));
            std::hint::black_box(errs);
        })
    });
    group.bench_function("invalid_fail_fast", |b| {
        b.iter(|| {
            let result = validator.validate(std::hint::black_box(&invalid), std::hint::black_box(&schema));
            std::hint::black_box(result);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
