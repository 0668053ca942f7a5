use crate::codec::OperationCodec;
use crate::error::ChainError;
use crate::operation::Operation;

/// The encoded byte sequence for one operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Blob(Vec<u8>);

impl Blob {
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// An immutable, ordered sequence of blobs for one key-hash bucket.
///
/// Order is the server's commit order: index 0 is the oldest entry. A chain
/// never mutates in place; the server returns a new chain after compaction,
/// and clients hold transient snapshots they drop after a fold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chain {
    blobs: Vec<Blob>,
}

impl Chain {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_blobs(blobs: Vec<Blob>) -> Self {
        Self { blobs }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Iterate blobs oldest → newest.
    pub fn iter(&self) -> std::slice::Iter<'_, Blob> {
        self.blobs.iter()
    }

    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn into_blobs(self) -> Vec<Blob> {
        self.blobs
    }

    /// Whether `prefix` is an exact prefix of this chain, blob for blob.
    pub fn starts_with(&self, prefix: &Chain) -> bool {
        self.blobs.len() >= prefix.blobs.len()
            && self.blobs[..prefix.blobs.len()] == prefix.blobs[..]
    }

    /// Lazily decode the chain oldest → newest.
    ///
    /// The iterator yields operations until the first malformed blob, then
    /// yields that error (with the blob's position) and fuses.
    pub fn decode<'a>(&'a self, codec: &'a OperationCodec) -> ChainDecoder<'a> {
        ChainDecoder {
            codec,
            blobs: &self.blobs,
            position: 0,
            failed: false,
        }
    }
}

impl FromIterator<Blob> for Chain {
    fn from_iter<I: IntoIterator<Item = Blob>>(iter: I) -> Self {
        Self {
            blobs: iter.into_iter().collect(),
        }
    }
}

/// Lazy decoding iterator over a chain. See [`Chain::decode`].
pub struct ChainDecoder<'a> {
    codec: &'a OperationCodec,
    blobs: &'a [Blob],
    position: usize,
    failed: bool,
}

impl Iterator for ChainDecoder<'_> {
    type Item = Result<Operation, ChainError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.blobs.len() {
            return None;
        }
        let position = self.position;
        self.position += 1;
        match self.codec.decode(&self.blobs[position]) {
            Ok(op) => Some(Ok(op)),
            Err(source) => {
                self.failed = true;
                Some(Err(ChainError::MalformedOperation { position, source }))
            }
        }
    }
}
