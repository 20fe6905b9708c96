//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{head, join, segments, tail};
    use proptest::prelude::*;

    /// Strategy producing a valid multi-segment path like "a/b7/cd".
    fn multi_segment_path() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-zA-Z0-9_.-]{1,12}", 2..6).prop_map(|segs| segs.join("/"))
    }

    proptest! {
        /// Property: head never contains a separator
        #[test]
        fn head_contains_no_separator(path in multi_segment_path()) {
            prop_assert!(!head(&path).contains('/'));
        }

        /// Property: joining head and tail reconstructs the original path
        #[test]
        fn head_tail_join_roundtrip(path in multi_segment_path()) {
            prop_assert_eq!(join(head(&path), tail(&path)), path);
        }

        /// Property: head of a single-segment path is the path itself and
        /// tail is empty
        #[test]
        fn single_segment_identity(seg in "[a-zA-Z0-9_.-]{1,12}") {
            prop_assert_eq!(head(&seg), seg.as_str());
            prop_assert_eq!(tail(&seg), "");
        }

        /// Property: repeatedly peeling head+tail enumerates exactly the
        /// segments of the path, in order
        #[test]
        fn peeling_matches_segments(path in multi_segment_path()) {
            let mut peeled = Vec::new();
            let mut rest = path.as_str();
            while !rest.is_empty() {
                peeled.push(head(rest).to_string());
                rest = tail(rest);
            }
            let direct: Vec<String> = segments(&path).map(|s| s.to_string()).collect();
            prop_assert_eq!(peeled, direct);
        }

        /// Property: head and tail are deterministic
        #[test]
        fn head_tail_deterministic(path in ".*") {
            prop_assert_eq!(head(&path), head(&path));
            prop_assert_eq!(tail(&path), tail(&path));
        }
    }
}
