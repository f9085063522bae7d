// tests/properties.rs

use proptest::prelude::*;

use stag::ui::{OutputBuffer, sanitize_ansi};
use stag::watch::path_utils::clean;
use stag::watch::{expand_extension, subtract};

fn path_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("".to_string()),
            Just(".".to_string()),
            Just("..".to_string()),
            "[a-z]{1,4}",
        ],
        0..6,
    )
    .prop_map(|parts| parts.join("/"))
}

proptest! {
    #[test]
    fn clean_is_idempotent(path in path_strategy()) {
        let once = clean(&path);
        prop_assert_eq!(clean(&once), once.clone());
        prop_assert!(!once.is_empty());
        prop_assert!(once == "/" || !once.ends_with('/'));
    }

    #[test]
    fn brace_group_yields_one_pattern_per_alternative(
        stem in "[a-z/*]{0,8}",
        alts in proptest::collection::vec("[a-z]{1,4}", 1..5),
    ) {
        let pattern = format!("{stem}.{{{}}}", alts.join(","));
        let expanded = expand_extension(&pattern);
        prop_assert_eq!(expanded.len(), alts.len());
        for (pat, alt) in expanded.iter().zip(&alts) {
            prop_assert_eq!(pat, &format!("{stem}.{alt}"));
        }
    }

    #[test]
    fn subtract_keeps_order_and_drops_only_excluded(
        includes in proptest::collection::vec("[a-d]{1,2}", 0..12),
        excludes in proptest::collection::vec("[a-d]{1,2}", 0..6),
    ) {
        let kept = subtract(includes.clone(), &excludes);
        prop_assert!(kept.iter().all(|p| !excludes.contains(p)));
        let expected: Vec<String> = includes
            .into_iter()
            .filter(|p| !excludes.contains(p))
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn output_buffer_never_exceeds_its_cap(
        cap in 0usize..64,
        chunks in proptest::collection::vec("[a-zé✓\n]{0,20}", 0..20),
    ) {
        let mut buf = OutputBuffer::with_capacity(cap);
        let mut all = String::new();
        for chunk in &chunks {
            buf.push(chunk);
            all.push_str(chunk);
            prop_assert!(buf.len() <= cap);
        }
        prop_assert!(all.ends_with(buf.as_str()));
    }

    #[test]
    fn sanitize_removes_every_cursor_move(
        text in "[a-z ]{0,10}",
        n in 0u32..100,
        dir in prop_oneof![Just('A'), Just('B'), Just('C'), Just('D')],
    ) {
        let dirty = format!("{text}\x1b[{n}{dir}{text}");
        let clean = sanitize_ansi(&dirty);
        prop_assert_eq!(clean, format!("{text}{text}"));
    }
}
