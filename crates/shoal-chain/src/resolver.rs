use tracing::warn;

use crate::chain::Chain;
use crate::codec::OperationCodec;
use crate::error::ChainError;

/// What to do with a blob that fails to decode during resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Fail the enclosing operation (the default).
    Fail,
    /// Skip the blob and keep folding. Each skip is logged.
    Skip,
}

/// Deterministic fold of a chain into the current value of one key.
///
/// Resolution walks the chain oldest → newest and applies every operation
/// whose key bytes equal the target key, ignoring all others. The result
/// depends only on the chain contents and the key — not on time, thread,
/// or whether the server has compacted the chain.
#[derive(Clone)]
pub struct Resolver {
    codec: OperationCodec,
}

impl Resolver {
    pub fn new(codec: OperationCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &OperationCodec {
        &self.codec
    }

    /// Resolve `key` against `chain` with the default malformed-blob policy.
    pub fn resolve(&self, chain: &Chain, key: &[u8]) -> Result<Option<Vec<u8>>, ChainError> {
        self.resolve_with_policy(chain, key, MalformedPolicy::Fail)
    }

    pub fn resolve_with_policy(
        &self,
        chain: &Chain,
        key: &[u8],
        policy: MalformedPolicy,
    ) -> Result<Option<Vec<u8>>, ChainError> {
        let mut value: Option<Vec<u8>> = None;
        for (position, blob) in chain.iter().enumerate() {
            let op = match self.codec.decode(blob) {
                Ok(op) => op,
                Err(source) => match policy {
                    MalformedPolicy::Fail => {
                        return Err(ChainError::MalformedOperation { position, source })
                    }
                    MalformedPolicy::Skip => {
                        warn!(position, error = %source, "skipping malformed blob");
                        continue;
                    }
                },
            };
            if op.key() != key {
                continue;
            }
            let next = op.apply(value.as_deref()).map(<[u8]>::to_vec);
            value = next;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Blob;
    use crate::error::CodecError;
    use crate::operation::Operation;

    fn resolver() -> Resolver {
        Resolver::new(OperationCodec::new())
    }

    fn chain_of(ops: &[Operation]) -> Chain {
        let codec = OperationCodec::new();
        ops.iter().map(|op| codec.encode(op)).collect()
    }

    // -----------------------------------------------------------------------
    // Fold semantics
    // -----------------------------------------------------------------------

    #[test]
    fn empty_chain_resolves_to_none() {
        assert_eq!(resolver().resolve(&Chain::empty(), b"a").unwrap(), None);
    }

    #[test]
    fn put_then_remove_then_put() {
        let chain = chain_of(&[
            Operation::put("a", "0", 1),
            Operation::put("a", "1", 2),
            Operation::remove("a", 3),
            Operation::put("a", "2", 4),
        ]);
        assert_eq!(
            resolver().resolve(&chain, b"a").unwrap(),
            Some(b"2".to_vec())
        );
    }

    #[test]
    fn remove_leaves_none() {
        let chain = chain_of(&[Operation::put("a", "0", 1), Operation::remove("a", 2)]);
        assert_eq!(resolver().resolve(&chain, b"a").unwrap(), None);
    }

    #[test]
    fn put_if_absent_respects_existing_value() {
        let chain = chain_of(&[
            Operation::put("a", "0", 1),
            Operation::put_if_absent("a", "1", 2),
        ]);
        assert_eq!(
            resolver().resolve(&chain, b"a").unwrap(),
            Some(b"0".to_vec())
        );
    }

    #[test]
    fn put_if_absent_installs_after_remove() {
        let chain = chain_of(&[
            Operation::put("a", "0", 1),
            Operation::remove("a", 2),
            Operation::put_if_absent("a", "2", 3),
        ]);
        assert_eq!(
            resolver().resolve(&chain, b"a").unwrap(),
            Some(b"2".to_vec())
        );
    }

    #[test]
    fn replace_without_value_is_a_noop() {
        let chain = chain_of(&[Operation::replace("a", "1", 1)]);
        assert_eq!(resolver().resolve(&chain, b"a").unwrap(), None);
    }

    #[test]
    fn conditional_replace_folds_by_byte_equality() {
        let hit = chain_of(&[
            Operation::put("a", "0", 1),
            Operation::replace_conditional("a", "0", "1", 2),
        ]);
        assert_eq!(resolver().resolve(&hit, b"a").unwrap(), Some(b"1".to_vec()));

        let miss = chain_of(&[
            Operation::put("a", "9", 1),
            Operation::replace_conditional("a", "0", "1", 2),
        ]);
        assert_eq!(
            resolver().resolve(&miss, b"a").unwrap(),
            Some(b"9".to_vec())
        );
    }

    // -----------------------------------------------------------------------
    // Locality
    // -----------------------------------------------------------------------

    #[test]
    fn other_keys_in_the_bucket_are_ignored() {
        let base = chain_of(&[Operation::put("a", "1", 1), Operation::remove("a", 2)]);
        let noisy = chain_of(&[
            Operation::put("b", "x", 0),
            Operation::put("a", "1", 1),
            Operation::put("b", "y", 1),
            Operation::remove("a", 2),
            Operation::put_if_absent("b", "z", 3),
        ]);
        let r = resolver();
        assert_eq!(r.resolve(&base, b"a").unwrap(), r.resolve(&noisy, b"a").unwrap());
        assert_eq!(r.resolve(&noisy, b"b").unwrap(), Some(b"x".to_vec()));
    }

    #[test]
    fn key_comparison_is_byte_exact() {
        let chain = chain_of(&[Operation::put("ab", "1", 1)]);
        let r = resolver();
        assert_eq!(r.resolve(&chain, b"ab").unwrap(), Some(b"1".to_vec()));
        assert_eq!(r.resolve(&chain, b"a").unwrap(), None);
        assert_eq!(r.resolve(&chain, b"abc").unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Malformed-blob policy
    // -----------------------------------------------------------------------

    fn chain_with_corrupt_middle() -> Chain {
        let codec = OperationCodec::new();
        Chain::from_blobs(vec![
            codec.encode(&Operation::put("a", "1", 1)),
            Blob::from_vec(vec![250, 0, 0]),
            codec.encode(&Operation::put("a", "2", 3)),
        ])
    }

    #[test]
    fn fail_policy_reports_position() {
        let err = resolver()
            .resolve(&chain_with_corrupt_middle(), b"a")
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::MalformedOperation {
                position: 1,
                source: CodecError::UnknownOpcode(250),
            }
        );
    }

    #[test]
    fn skip_policy_folds_past_corruption() {
        let value = resolver()
            .resolve_with_policy(&chain_with_corrupt_middle(), b"a", MalformedPolicy::Skip)
            .unwrap();
        assert_eq!(value, Some(b"2".to_vec()));
    }

    #[test]
    fn first_committed_install_wins_until_a_total_operation() {
        // Once a conditional install has taken effect, later conditional
        // installs cannot displace it; only Put or Remove can.
        let chain = chain_of(&[
            Operation::put_if_absent("a", "1", 1),
            Operation::put_if_absent("a", "2", 2),
            Operation::put_if_absent("a", "3", 3),
            Operation::replace_conditional("a", "9", "8", 4),
        ]);
        let r = resolver();
        assert_eq!(r.resolve(&chain, b"a").unwrap(), Some(b"1".to_vec()));

        let mut ops = vec![
            Operation::put_if_absent("a", "1", 1),
            Operation::put_if_absent("a", "2", 2),
            Operation::put("a", "7", 3),
        ];
        assert_eq!(
            r.resolve(&chain_of(&ops), b"a").unwrap(),
            Some(b"7".to_vec())
        );

        ops.push(Operation::remove("a", 4));
        assert_eq!(r.resolve(&chain_of(&ops), b"a").unwrap(), None);
    }

    #[test]
    fn interleaved_keys_resolve_as_if_in_separate_buckets() {
        let for_a = [
            Operation::put("a", "1", 1),
            Operation::replace_conditional("a", "1", "2", 3),
        ];
        let for_b = [
            Operation::put_if_absent("b", "x", 2),
            Operation::remove("b", 4),
        ];
        let interleaved = chain_of(&[
            for_a[0].clone(),
            for_b[0].clone(),
            for_a[1].clone(),
            for_b[1].clone(),
        ]);

        let r = resolver();
        assert_eq!(
            r.resolve(&interleaved, b"a").unwrap(),
            r.resolve(&chain_of(&for_a), b"a").unwrap()
        );
        assert_eq!(
            r.resolve(&interleaved, b"b").unwrap(),
            r.resolve(&chain_of(&for_b), b"b").unwrap()
        );
        assert_eq!(r.resolve(&interleaved, b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(r.resolve(&interleaved, b"b").unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn resolution_is_stable_across_calls() {
        let chain = chain_of(&[
            Operation::put("a", "0", 1),
            Operation::put_if_absent("a", "1", 2),
            Operation::replace_conditional("a", "0", "7", 3),
            Operation::replace("a", "8", 4),
        ]);
        let r = resolver();
        let first = r.resolve(&chain, b"a").unwrap();
        for _ in 0..20 {
            assert_eq!(r.resolve(&chain, b"a").unwrap(), first);
        }
        assert_eq!(first, Some(b"8".to_vec()));
    }
}
