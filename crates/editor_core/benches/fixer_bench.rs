use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use editor_core::merge::merge_same_tags;
use editor_core::{Normalizer, Options};
use html::parse_fragment;

const LINES: usize = 5_000;

// Pasted-looking content: nested lines, loose list children, bare cells and split spans.
fn make_messy(lines: usize) -> String {
    let mut out = String::with_capacity(lines * 96);
    for i in 0..lines {
        match i % 4 {
            0 => out.push_str("<div><p><p>nested</p></p></div>"),
            1 => out.push_str("<ul><span>loose</span><li>ok</li></ul>"),
            2 => out.push_str("<table><tr><td>cell</td></tr></table>"),
            _ => out.push_str(r#"<p><span style="color: red">a</span><span style="color: red">b</span></p>"#),
        }
    }
    out
}

fn bench_fix_structure(c: &mut Criterion) {
    let normalizer = Normalizer::new(Options::default()).expect("default options");
    let input = make_messy(LINES);
    c.bench_function("bench_fix_structure", |b| {
        b.iter_batched(
            || parse_fragment(&input),
            |mut dom| {
                let root = dom.document();
                black_box(normalizer.fix_structure(&mut dom, root));
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_clean(c: &mut Criterion) {
    let normalizer = Normalizer::new(Options::default()).expect("default options");
    let input = make_messy(LINES / 10);
    c.bench_function("bench_clean", |b| {
        b.iter(|| black_box(normalizer.clean(black_box(&input), true)));
    });
}

fn bench_merge_same_tags(c: &mut Criterion) {
    let input = make_messy(LINES);
    c.bench_function("bench_merge_same_tags", |b| {
        b.iter_batched(
            || parse_fragment(&input),
            |mut dom| {
                let root = dom.document();
                black_box(merge_same_tags(&mut dom, root, &mut [], false));
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_fix_structure, bench_clean, bench_merge_same_tags);
criterion_main!(benches);
