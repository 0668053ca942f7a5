use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use shoal_chain::{Blob, Chain};
use shoal_types::KeyHash;

/// Per-alias store of key-hash buckets.
///
/// Each bucket holds the append-ordered chain of blobs for one [`KeyHash`].
/// The sharded map's entry lock serializes all mutations of a bucket, so
/// `get_and_append` is linearizable per bucket; operations on different
/// buckets never contend beyond shard granularity.
///
/// The store owns the authoritative chains. Callers receive snapshots and
/// never write a whole chain back; they only append blobs or propose head
/// replacements.
pub struct ChainStore {
    buckets: DashMap<KeyHash, Vec<Blob>>,
    compaction_threshold: Option<usize>,
}

impl ChainStore {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            compaction_threshold: None,
        }
    }

    /// A store that flags buckets whose chains grow past `threshold` as
    /// compaction candidates. Advisory only: appends are never delayed.
    pub fn with_compaction_threshold(threshold: usize) -> Self {
        Self {
            buckets: DashMap::new(),
            compaction_threshold: Some(threshold),
        }
    }

    /// Snapshot the chain for a bucket. Missing buckets are empty chains.
    pub fn get(&self, hash: KeyHash) -> Chain {
        self.buckets
            .get(&hash)
            .map(|bucket| Chain::from_blobs(bucket.value().clone()))
            .unwrap_or_default()
    }

    /// Atomically append `blob` to the bucket and return the chain as it
    /// was immediately before the append.
    ///
    /// The pre-append snapshot is the whole contract: a client that holds
    /// it plus the blob it sent can compute the outcome of any conditional
    /// operation without the server understanding the payload.
    pub fn get_and_append(&self, hash: KeyHash, blob: Blob) -> Chain {
        let mut entry = self.buckets.entry(hash).or_default();
        let prior = Chain::from_blobs(entry.value().clone());
        entry.push(blob);
        if let Some(threshold) = self.compaction_threshold {
            if entry.len() > threshold {
                debug!(%hash, len = entry.len(), threshold, "bucket is a compaction candidate");
            }
        }
        prior
    }

    /// Replace an exact chain prefix with an equivalent (usually shorter)
    /// one. Applied only if `expected` is byte-for-byte a prefix of the
    /// current chain; otherwise silently ignored. Returns whether the
    /// replacement was applied.
    ///
    /// A missing bucket behaves as the empty chain, so only an empty
    /// expected prefix matches it.
    pub fn replace_at_head(&self, hash: KeyHash, expected: &Chain, replacement: &Chain) -> bool {
        match self.buckets.entry(hash) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                let matches = current.len() >= expected.len()
                    && current[..expected.len()] == expected.blobs()[..];
                if !matches {
                    debug!(%hash, "head replacement ignored: prefix mismatch");
                    return false;
                }
                let mut next = replacement.blobs().to_vec();
                next.extend_from_slice(&current[expected.len()..]);
                debug!(
                    %hash,
                    before = current.len(),
                    after = next.len(),
                    "head replacement applied"
                );
                if next.is_empty() {
                    occupied.remove();
                } else {
                    *occupied.get_mut() = next;
                }
                true
            }
            Entry::Vacant(vacant) => {
                if !expected.is_empty() {
                    return false;
                }
                if !replacement.is_empty() {
                    vacant.insert(replacement.blobs().to_vec());
                }
                true
            }
        }
    }

    /// Remove every bucket.
    pub fn clear(&self) {
        self.buckets.clear();
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainStore")
            .field("bucket_count", &self.bucket_count())
            .finish()
    }
}
