use criterion::{black_box, criterion_group, criterion_main, Criterion};

use svgdraw::bench_only::{Lexer, PathBuilder};
use svgdraw::{parse_svg, InstructionProducer};

static PATH: &str = "M10 20 C 30,40 50 60-70,80,90 100,110 120,130,140 A 25 25 -30 1 0 50 -25 Z";

/// A document with `width` groups per level, nested `depth` levels deep, and a
/// few shapes in every group.
fn make_document(width: usize, depth: usize) -> String {
    fn level(out: &mut String, width: usize, depth: usize) {
        out.push_str(r#"<rect x="1" y="2" width="3" height="4"/><circle cx="5" cy="5" r="2"/>"#);
        out.push_str(&format!(r#"<path d="{PATH}"/>"#));

        if depth > 0 {
            for i in 0..width {
                out.push_str(&format!(r#"<g transform="translate({i}, 1) scale(1.01)">"#));
                level(out, width, depth - 1);
                out.push_str("</g>");
            }
        }
    }

    let mut out = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);
    level(&mut out, width, depth);
    out.push_str("</svg>");
    out
}

fn flatten(c: &mut Criterion) {
    let text = make_document(4, 4);

    c.bench_function("decode and link", |b| {
        b.iter(|| parse_svg(black_box(&text), "bench", 1.0).unwrap());
    });

    let document = parse_svg(&text, "bench", 1.0).unwrap();

    c.bench_function("flatten document", |b| {
        b.iter(|| black_box(document.instructions().count()));
    });

    c.bench_function("relink document", |b| {
        b.iter(|| black_box(document.relink()));
    });
}

fn path_parser(c: &mut Criterion) {
    c.bench_function("parse path into builder", |b| {
        let input = black_box(PATH);

        b.iter(|| {
            let mut builder = PathBuilder::default();
            let _ = builder.parse(input);
        });
    });

    c.bench_function("lex str", |b| {
        let input = black_box(PATH);

        b.iter(|| {
            for (_pos, _token) in Lexer::new(input) {
                // no-op
            }
        });
    });
}

criterion_group!(benches, flatten, path_parser);
criterion_main!(benches);
