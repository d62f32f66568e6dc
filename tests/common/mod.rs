//! Helpers for integration tests.

/// `count` distinct well-formed identifiers.
pub fn asins(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("B{i:09}")).collect()
}
