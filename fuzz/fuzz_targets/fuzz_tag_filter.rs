#![no_main]

use libfuzzer_sys::fuzz_target;
use overql::{FilterSeq, TagFilter};
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
struct Input {
    key: String,
    values: Vec<String>,
    exists: bool,
}

fuzz_target!(|input: Input| {
    if input.key.len() > 256 || input.values.len() > 32 {
        return;
    }

    // Construction either fails or yields a filter that renders as brackets
    if let Ok(filter) = TagFilter::new(input.key, input.values, input.exists) {
        let rendered = filter.to_string();
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with(']'));

        let mut seq = FilterSeq::new();
        if seq.add(filter).is_ok() {
            assert_eq!(seq.len(), 1);
            assert_eq!(seq.to_string(), rendered);
        }
    }
});
