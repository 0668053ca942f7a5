use std::fmt;

/// Bucket selector for one key: a 64-bit nonnegative hash of the key's
/// serialized bytes.
///
/// The hash is stable across processes and releases; clients and server must
/// agree on it, so any change to the derivation is a wire break. Distinct
/// keys may collide; chain resolution handles collisions by comparing full
/// key bytes, never hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyHash(u64);

impl KeyHash {
    /// Construct from a raw value. The top bit is cleared so the hash stays
    /// nonnegative when carried as a signed 64-bit integer.
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw & 0x7fff_ffff_ffff_ffff)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Domain-separated BLAKE3 key hasher.
///
/// The domain tag is prepended to every hash computation so that key hashes
/// can never collide with hashes computed for other purposes over the same
/// bytes.
pub struct KeyHasher {
    domain: &'static str,
}

impl KeyHasher {
    /// The production key-hash domain. Changing it is a wire break.
    pub const KEY: Self = Self {
        domain: "shoal-key-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash serialized key bytes into a bucket selector.
    pub fn hash(&self, key: &[u8]) -> KeyHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(key);
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        KeyHash::from_u64(u64::from_be_bytes(prefix))
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let h1 = KeyHasher::KEY.hash(b"some-key");
        let h2 = KeyHasher::KEY.hash(b"some-key");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_keys_hash_differently() {
        assert_ne!(KeyHasher::KEY.hash(b"a"), KeyHasher::KEY.hash(b"b"));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let other = KeyHasher::new("shoal-test-v1");
        assert_ne!(KeyHasher::KEY.hash(b"k"), other.hash(b"k"));
    }

    #[test]
    fn hash_is_nonnegative() {
        for key in [&b"a"[..], b"b", b"longer key material", b""] {
            let h = KeyHasher::KEY.hash(key);
            assert_eq!(h.as_u64() >> 63, 0);
        }
    }

    #[test]
    fn from_u64_clears_top_bit() {
        let h = KeyHash::from_u64(u64::MAX);
        assert_eq!(h.as_u64(), 0x7fff_ffff_ffff_ffff);
    }

    #[test]
    fn display_is_fixed_width_hex() {
        let h = KeyHash::from_u64(0xab);
        assert_eq!(h.to_string(), "00000000000000ab");
    }
}
