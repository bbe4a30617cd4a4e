#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let stream = html::tokenize(input);
    let dom = html::parse_fragment(input);
    assert!(stream.tokens().len() <= input.len());
    let _ = html::inner_html(&dom, dom.document());
});
