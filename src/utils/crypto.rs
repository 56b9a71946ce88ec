//! Hashing primitives.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data`.
#[must_use]
pub fn compute_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let hash = compute_sha256(b"abc");
        assert_eq!(
            hash[..8],
            [0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea]
        );
        assert_eq!(hash, compute_sha256(b"abc"));
        assert_ne!(hash, compute_sha256(b"abd"));
    }
}
