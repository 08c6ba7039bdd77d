//! Structural helpers.

use std::collections::BTreeMap;

/// Builds a new mapping by applying `f(value, key, mapping)` to every entry.
///
/// All keys are preserved. Callers must not rely on the order in which `f`
/// is invoked.
pub fn map_indexed<K, V, W, F>(mapping: &BTreeMap<K, V>, mut f: F) -> BTreeMap<K, W>
where
    K: Ord + Clone,
    F: FnMut(&V, &K, &BTreeMap<K, V>) -> W,
{
    mapping
        .iter()
        .map(|(key, value)| (key.clone(), f(value, key, mapping)))
        .collect()
}
