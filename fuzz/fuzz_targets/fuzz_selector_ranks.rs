#![no_main]

use libfuzzer_sys::fuzz_target;
use overql::Selector;

fuzz_target!(|ranks: Vec<u8>| {
    if let Ok(selector) = Selector::from_ranks(&ranks) {
        let kinds = selector.kinds();
        assert!(!kinds.is_empty() && kinds.len() <= 3);
        assert!(kinds.windows(2).all(|pair| pair[0] < pair[1]));

        // Any permutation of the same ranks resolves to the same selector
        let mut reversed = ranks.clone();
        reversed.reverse();
        assert_eq!(Selector::from_ranks(&reversed).ok(), Some(selector));
    }
});
