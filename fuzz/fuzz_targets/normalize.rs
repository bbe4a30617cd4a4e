#![no_main]

use editor_core::{Normalizer, Options};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(normalizer) = Normalizer::new(Options::default()) else {
        return;
    };

    let mut dom = html::parse_fragment(input);
    let root = dom.document();
    normalizer.fix_structure(&mut dom, root);
    let leftover = normalizer.check_structure(&dom, root);
    assert!(leftover.is_empty(), "violations left after fixing {input:?}: {leftover:?}");

    let once = normalizer.clean(input, true);
    let twice = normalizer.clean(&once, true);
    assert_eq!(once, twice, "clean is not idempotent for {input:?}");
});
