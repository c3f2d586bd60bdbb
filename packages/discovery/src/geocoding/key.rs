use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "geocode:";

/// Trim, lowercase and collapse interior whitespace.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stable cache key for an already-normalized address.
pub fn cache_key(normalized: &str) -> String {
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{}{}", KEY_PREFIX, hex::encode(digest))
}
