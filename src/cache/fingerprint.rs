// src/cache/fingerprint.rs

use blake3::Hasher;

/// blake3 hex digest of file contents.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Cache key for one optimised image.
///
/// Depends on the source path (relative to the project root), the source
/// bytes and the optimiser parameter tag. Fields are length-prefixed so
/// distinct triples can never collide by concatenation.
pub fn cache_key(rel_path: &str, content_hash: &str, params: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(b"assetpipe-image-cache\0");
    for field in [rel_path, content_hash, params] {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_blake3_hex() {
        assert_eq!(
            content_hash(b"hello world"),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn every_component_changes_the_key() {
        let base = cache_key("src/img/a.png", "h1", "v1");
        assert_eq!(base, cache_key("src/img/a.png", "h1", "v1"));
        assert_ne!(base, cache_key("src/img/b.png", "h1", "v1"));
        assert_ne!(base, cache_key("src/img/a.png", "h2", "v1"));
        assert_ne!(base, cache_key("src/img/a.png", "h1", "v2"));
    }

    #[test]
    fn shifted_boundaries_do_not_collide() {
        assert_ne!(cache_key("ab", "c", "d"), cache_key("a", "bc", "d"));
    }
}
