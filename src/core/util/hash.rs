// SPDX-License-Identifier: MIT OR Apache-2.0

//! One hashing convention for every fingerprint in the crate: SHA-256 over a
//! canonical byte encoding, truncated to the number of hex characters the caller
//! needs. Used for correlation ids, partition keys, novelty hashes and content hashes.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `parts` joined with `\0`, truncated to `hex_len` characters.
pub fn fingerprint(parts: &[&str], hex_len: usize) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\0");
        }
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    let full = hex::encode(digest);
    full[..hex_len.min(full.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_and_truncated() {
        let a = fingerprint(&["orders-1", "system1.operation.completed"], 12);
        let b = fingerprint(&["orders-1", "system1.operation.completed"], 12);
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn fingerprint_distinguishes_inputs() {
        let a = fingerprint(&["orders-1"], 8);
        let b = fingerprint(&["orders-2"], 8);
        assert_ne!(a, b);
    }
}
