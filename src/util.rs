use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Index into a list of `len` entries picked by `id`, stable across runs.
pub fn stable_index(id: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (stable_hash(id) % len as u64) as usize
}
