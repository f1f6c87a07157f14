use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hato_core::namespace::rdf;
use hato_core::syntax::Triples;
use hato_core::term::Iri;
use hato_template::{dedent, format, tokenize, Arguments, QueryFormatter};

/// Generate a template with the given number of fields
fn generate_template(fields: usize) -> String {
    let mut template = String::from("SELECT *\nWHERE {\n");
    for i in 0..fields {
        template.push_str(&format!("    ?s ex:p{} {{{{{}}}}} .\n", i, i));
    }
    template.push('}');
    template
}

fn generate_arguments(fields: usize) -> Arguments {
    (0..fields).fold(Arguments::new(), |args, i| args.arg(format!("\"value {}\"", i)))
}

fn generate_triples(count: usize) -> Triples {
    let mut triples = Triples::new();
    for i in 0..count {
        triples
            .push_triple(Iri::new(format!("http://example.org/s{}", i / 4)), rdf::value, i as i64)
            .expect("integer objects are valid");
    }
    triples
}

fn benchmark_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for size in [1, 10, 100].iter() {
        let template = generate_template(*size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_fields", size)),
            &template,
            |b, template| {
                b.iter(|| black_box(tokenize(template).map(|tokens| tokens.len())));
            },
        );
    }

    group.finish();
}

fn benchmark_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");

    for size in [1, 10, 100].iter() {
        let template = generate_template(*size);
        let args = generate_arguments(*size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_fields", size)),
            &(template, args),
            |b, (template, args)| {
                b.iter(|| black_box(format(template, args)));
            },
        );
    }

    let args = Arguments::new().arg(generate_triples(400));
    group.bench_function("indent_triples_block", |b| {
        b.iter(|| black_box(format("INSERT DATA {\n    {{}}\n}", &args)));
    });

    group.finish();
}

fn benchmark_prepare(c: &mut Criterion) {
    let formatter = QueryFormatter::new()
        .with_graph(Iri::new("http://example.org/graph"))
        .with_prefix("ex", Iri::new("http://example.org/"));
    let template = generate_template(10);
    let args = generate_arguments(10);

    c.bench_function("prepare_with_header", |b| {
        b.iter(|| black_box(formatter.prepare(&template, &args)));
    });
    c.bench_function("dedent", |b| {
        let indented = template.replace('\n', "\n        ");
        b.iter(|| black_box(dedent(&indented)));
    });
}

criterion_group!(benches, benchmark_tokenize, benchmark_format, benchmark_prepare);
criterion_main!(benches);
