use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use shoal_chain::Chain;
use shoal_protocol::{
    EntityCodec, EntityRequest, EntityResponse, ProtocolError, ResponseStatus, StoreRequest,
};

use crate::store::ChainStore;

/// The process-wide alias → store map.
///
/// Its lifecycle is bound to the entity; creation and teardown are driven
/// by the surrounding cluster framework.
pub struct StoreRegistry {
    stores: DashMap<String, Arc<ChainStore>>,
    compaction_threshold: Option<usize>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            stores: DashMap::new(),
            compaction_threshold: None,
        }
    }

    /// Stores created by this registry flag buckets past `threshold` as
    /// compaction candidates.
    pub fn with_compaction_threshold(threshold: usize) -> Self {
        Self {
            stores: DashMap::new(),
            compaction_threshold: Some(threshold),
        }
    }

    /// Fetch the store for `alias`, creating it on first use.
    pub fn create(&self, alias: &str) -> Arc<ChainStore> {
        let entry = self.stores.entry(alias.to_string()).or_insert_with(|| {
            debug!(alias, "creating store");
            match self.compaction_threshold {
                Some(threshold) => Arc::new(ChainStore::with_compaction_threshold(threshold)),
                None => Arc::new(ChainStore::new()),
            }
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, alias: &str) -> Option<Arc<ChainStore>> {
        self.stores.get(alias).map(|entry| Arc::clone(entry.value()))
    }

    /// Tear down one store. Returns whether it existed.
    pub fn remove(&self, alias: &str) -> bool {
        self.stores.remove(alias).is_some()
    }

    /// All known aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> =
            self.stores.iter().map(|entry| entry.key().clone()).collect();
        aliases.sort();
        aliases
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches entity messages to the addressed store.
///
/// The service never decodes operation blobs: every store request maps
/// onto one store primitive, and the payload bytes pass through untouched.
pub struct EntityService {
    registry: StoreRegistry,
}

impl EntityService {
    pub fn new(registry: StoreRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// Handle a decoded request.
    pub fn handle(&self, request: &EntityRequest) -> EntityResponse {
        let Some(store) = self.registry.get(&request.alias) else {
            return EntityResponse::Failure {
                status: ResponseStatus::UnknownAlias,
                message: format!("no store named {:?}", request.alias),
            };
        };

        match &request.request {
            StoreRequest::Get { hash } => EntityResponse::Success(store.get(*hash)),
            StoreRequest::GetAndAppend { hash, blob } => {
                EntityResponse::Success(store.get_and_append(*hash, blob.clone()))
            }
            StoreRequest::Append { hash, blob } => {
                store.get_and_append(*hash, blob.clone());
                EntityResponse::Success(Chain::empty())
            }
            StoreRequest::ReplaceAtHead {
                hash,
                expected,
                replacement,
            } => {
                // Ignored on mismatch, still a success: compaction proposals
                // are advisory and correctness-neutral.
                store.replace_at_head(*hash, expected, replacement);
                EntityResponse::Success(Chain::empty())
            }
            StoreRequest::Clear => {
                store.clear();
                EntityResponse::Success(Chain::empty())
            }
        }
    }

    /// Handle a raw request frame and produce a raw response frame.
    pub fn handle_frame(&self, frame: &[u8]) -> Vec<u8> {
        let response = match EntityCodec::decode_request(frame) {
            Ok(request) => self.handle(&request),
            Err(ProtocolError::UnsupportedOpcode(opcode)) => EntityResponse::Failure {
                status: ResponseStatus::UnsupportedOpcode,
                message: format!("unsupported message opcode {opcode:#04x}"),
            },
            Err(error) => EntityResponse::Failure {
                status: ResponseStatus::BadRequest,
                message: error.to_string(),
            },
        };

        EntityCodec::encode_response(&response).unwrap_or_else(|error| {
            // Response exceeded the frame limit; report that instead.
            let fallback = EntityResponse::Failure {
                status: ResponseStatus::Internal,
                message: error.to_string(),
            };
            EntityCodec::encode_response(&fallback)
                .unwrap_or_else(|_| vec![ResponseStatus::Internal.as_u8(), 0, 0, 0, 0])
        })
    }
}

impl Default for EntityService {
    fn default() -> Self {
        Self::new(StoreRegistry::new())
    }
}
