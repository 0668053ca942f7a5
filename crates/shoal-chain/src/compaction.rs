use std::collections::HashMap;

use crate::chain::Chain;
use crate::codec::OperationCodec;
use crate::error::ChainError;
use crate::operation::Operation;

/// Canonical, equivalence-preserving chain compaction.
///
/// For every key that appears in a chain, the compacted chain contains
/// exactly one `Put` of the key's resolved value — or nothing, if the key
/// resolves to no value. Keys are emitted in order of their last occurrence
/// in the source chain. Resolution of any key is identical before and after
/// compaction; compaction is an optimization, never a semantic change.
#[derive(Clone)]
pub struct Compactor {
    codec: OperationCodec,
}

struct KeyState {
    value: Option<Vec<u8>>,
    last_position: usize,
    last_timestamp: u64,
}

impl Compactor {
    pub fn new(codec: OperationCodec) -> Self {
        Self { codec }
    }

    pub fn compact(&self, chain: &Chain) -> Result<Chain, ChainError> {
        let mut states: HashMap<Vec<u8>, KeyState> = HashMap::new();

        for (position, blob) in chain.iter().enumerate() {
            let op = self
                .codec
                .decode(blob)
                .map_err(|source| ChainError::MalformedOperation { position, source })?;
            match states.get_mut(op.key()) {
                Some(state) => {
                    let next = op.apply(state.value.as_deref()).map(<[u8]>::to_vec);
                    state.value = next;
                    state.last_position = position;
                    state.last_timestamp = op.timestamp();
                }
                None => {
                    states.insert(
                        op.key().to_vec(),
                        KeyState {
                            value: op.apply(None).map(<[u8]>::to_vec),
                            last_position: position,
                            last_timestamp: op.timestamp(),
                        },
                    );
                }
            }
        }

        let mut survivors: Vec<(Vec<u8>, KeyState)> = states
            .into_iter()
            .filter(|(_, state)| state.value.is_some())
            .collect();
        survivors.sort_by_key(|(_, state)| state.last_position);

        let blobs = survivors
            .into_iter()
            .filter_map(|(key, state)| {
                state.value.map(|value| {
                    self.codec.encode(&Operation::Put {
                        key,
                        value,
                        timestamp: state.last_timestamp,
                    })
                })
            })
            .collect();
        Ok(Chain::from_blobs(blobs))
    }
}
