//! Error types.

use core::fmt;

/// A write through a view violated the view's membership constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContainmentError {
    /// The element would be strictly contained by a stored element, so it
    /// cannot be added through the root view.
    #[error("element is strictly contained by a stored element and cannot be a root")]
    NotRoot,
    /// The element does not satisfy the view's container/item bounds.
    #[error("element is outside the view's containment bounds")]
    OutsideView,
}

/// `put_if_not_ambiguous` refused the insertion because the key would
/// resolve ambiguously. The map is left exactly as it was; the rejected key
/// and value are handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousInsert<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> AmbiguousInsert<K, V> {
    pub fn into_inner(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> fmt::Display for AmbiguousInsert<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("insertion rejected: the key would resolve ambiguously")
    }
}

impl<K: fmt::Debug, V: fmt::Debug> std::error::Error for AmbiguousInsert<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            ContainmentError::OutsideView.to_string(),
            "element is outside the view's containment bounds"
        );
        let e = AmbiguousInsert { key: "k", value: 1 };
        assert!(e.to_string().contains("ambiguous"));
        assert_eq!(e.into_inner(), ("k", 1));
    }

    #[test]
    fn ambiguous_insert_is_a_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&AmbiguousInsert { key: 1u8, value: "v" });
        takes_error(&ContainmentError::NotRoot);
    }
}
