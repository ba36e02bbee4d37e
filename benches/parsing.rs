use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use internet_object::tokenizer::tokenize;
use internet_object::{parse, parse_with_options, stringify, ParseOptions, StringifyOptions};

const HEADER: &str = "\
~ @active: T
~ $address: {street, city, zip?: string}
~ $schema: {id: {int, min: 0}, name, email: email, active: bool, address: $address, tags: [string]}
---
";

fn people(count: usize) -> String {
    let mut text = String::from(HEADER);
    for i in 0..count {
        text.push_str(&format!(
            "~ {}, User {}, user{}@example.com, @active, {{{} Main St, Oslo}}, [admin, dev]\n",
            i, i, i, i
        ));
    }
    text
}

fn benchmark_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    for size in [10, 100, 1000].iter() {
        let text = people(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| tokenize(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_parse_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_syntax");
    let options = ParseOptions::default();
    for size in [10, 100, 1000].iter() {
        let text = people(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| internet_object::parser::parse_document(black_box(text), &options))
        });
    }
    group.finish();
}

fn benchmark_parse_and_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_validate");
    for size in [10, 100, 1000].iter() {
        let text = people(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_strict(c: &mut Criterion) {
    let text = people(100);
    let options = ParseOptions::new().with_strict(true);
    c.bench_function("parse_validate_strict_100", |b| {
        b.iter(|| parse_with_options(black_box(&text), &options))
    });
}

fn benchmark_stringify(c: &mut Criterion) {
    let mut group = c.benchmark_group("stringify");
    let options = StringifyOptions::default();
    for size in [10, 100, 1000].iter() {
        let Ok(doc) = parse(&people(*size)) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| stringify(black_box(doc), &options))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_tokenize,
    benchmark_parse_only,
    benchmark_parse_and_validate,
    benchmark_strict,
    benchmark_stringify
);
criterion_main!(benches);
