use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html::{inner_html, parse_fragment, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(blocks: usize) -> String {
    let mut out = String::with_capacity(blocks * 64);
    for i in 0..blocks {
        out.push_str(r#"<p class="line"><span style="color: red">hello</span> "#);
        out.push_str(if i % 2 == 0 { "<b>world</b>" } else { "<br>" });
        out.push_str("</p>");
    }
    out
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri<pt");
    }
    body.push_str("</script>");
    body
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input));
            black_box(stream.tokens().len());
        });
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_large", |b| {
        b.iter(|| {
            let dom = parse_fragment(black_box(&input));
            black_box(dom);
        });
    });
}

fn bench_serialize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_serialize_large", |b| {
        b.iter_batched(
            || parse_fragment(&input),
            |dom| black_box(inner_html(&dom, dom.document())),
            BatchSize::LargeInput,
        );
    });
}

fn bench_tokenize_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    c.bench_function("bench_tokenize_rawtext_adversarial", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input));
            black_box(stream.tokens().len());
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_parse_large,
    bench_serialize_large,
    bench_tokenize_rawtext_adversarial
);
criterion_main!(benches);
