//! Path manipulation utilities for ifcx-core
//!
//! Node paths are `/`-joined sequences of segment names, e.g.
//! `"site/building/wall"`. These helpers split and join such paths; they are
//! pure and total, with no error conditions.

/// First `/`-delimited segment of a path.
///
/// For a single-segment path the whole path is returned.
pub fn head(path: &str) -> &str {
    match path.find('/') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Remaining path with the head segment removed.
///
/// Empty if the path had only one segment.
pub fn tail(path: &str) -> &str {
    match path.find('/') {
        Some(idx) => &path[idx + 1..],
        None => "",
    }
}

/// Join a parent path and a child segment name.
pub fn join(parent: &str, name: &str) -> String {
    format!("{}/{}", parent, name)
}

/// Iterate the segments of a path in order. An empty path yields nothing.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head() {
        assert_eq!(head("a/b/c"), "a");
        assert_eq!(head("a"), "a");
        assert_eq!(head(""), "");
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("a/b/c"), "b/c");
        assert_eq!(tail("a/b"), "b");
        assert_eq!(tail("a"), "");
        assert_eq!(tail(""), "");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("a", "b"), "a/b");
        assert_eq!(join("a/b", "c"), "a/b/c");
    }

    #[test]
    fn test_segments() {
        let segs: Vec<&str> = segments("a/b/c").collect();
        assert_eq!(segs, vec!["a", "b", "c"]);

        let segs: Vec<&str> = segments("a").collect();
        assert_eq!(segs, vec!["a"]);

        assert_eq!(segments("").count(), 0);
    }

    #[test]
    fn test_head_tail_roundtrip() {
        let path = "site/building/storey/wall";
        assert_eq!(join(head(path), tail(path)), path);
    }
}
