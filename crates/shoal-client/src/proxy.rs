use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use shoal_chain::{Chain, Compactor, Operation, OperationCodec, Resolver};
use shoal_protocol::{EntityRequest, EntityResponse, ResponseStatus, StoreRequest};
use shoal_types::{KeyHash, KeyHasher, Serializer, WriteClock};

use crate::error::{ClientError, ClientResult};
use crate::transport::EntityTransport;

/// Client-side tuning for a [`StoreProxy`].
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Deadline for one network round-trip.
    pub call_deadline: Duration,
    /// Chain length at which the proxy proposes head compaction to the
    /// server after a fold.
    pub compaction_threshold: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            call_deadline: Duration::from_secs(5),
            compaction_threshold: 32,
        }
    }
}

/// Caller-facing facade over one clustered store.
///
/// Every mutation is encoded as an operation and appended to the chain of
/// the key's hash bucket; every answer is computed by folding a chain the
/// server returned. Conditional operations rely on the `GetAndAppend`
/// contract — the server atomically appends and returns the chain as it
/// was immediately before the append — so the proxy can tell the caller
/// truthfully whether an install happened, and every other client folding
/// the same chain later reaches the same answer.
///
/// The proxy is safe for concurrent use from many tasks. The only point of
/// suspension is awaiting the transport; a call dropped after its request
/// frame has left the client must be treated as *outcome unknown* — the
/// server may have appended, and the next `get` will observe it if so.
pub struct StoreProxy<K, V> {
    alias: String,
    transport: Arc<dyn EntityTransport>,
    key_serializer: Arc<dyn Serializer<K>>,
    value_serializer: Arc<dyn Serializer<V>>,
    codec: OperationCodec,
    resolver: Resolver,
    compactor: Compactor,
    hasher: KeyHasher,
    clock: WriteClock,
    config: ProxyConfig,
}

impl<K, V> StoreProxy<K, V> {
    pub fn new(
        alias: impl Into<String>,
        transport: Arc<dyn EntityTransport>,
        key_serializer: Arc<dyn Serializer<K>>,
        value_serializer: Arc<dyn Serializer<V>>,
    ) -> Self {
        Self::with_config(
            alias,
            transport,
            key_serializer,
            value_serializer,
            ProxyConfig::default(),
        )
    }

    pub fn with_config(
        alias: impl Into<String>,
        transport: Arc<dyn EntityTransport>,
        key_serializer: Arc<dyn Serializer<K>>,
        value_serializer: Arc<dyn Serializer<V>>,
        config: ProxyConfig,
    ) -> Self {
        let codec = OperationCodec::new();
        Self {
            alias: alias.into(),
            transport,
            key_serializer,
            value_serializer,
            resolver: Resolver::new(codec.clone()),
            compactor: Compactor::new(codec.clone()),
            codec,
            hasher: KeyHasher::KEY,
            clock: WriteClock::new(),
            config,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    // ---- Caller-facing operations ----

    /// Current value of `key`, or `None` if unmapped.
    pub async fn get(&self, key: &K) -> ClientResult<Option<V>> {
        let key_bytes = self.key_serializer.serialize(key)?;
        let hash = self.hasher.hash(&key_bytes);
        let chain = self.fetch(StoreRequest::Get { hash }).await?;
        let resolved = self.resolver.resolve(&chain, &key_bytes)?;
        self.maybe_propose_compaction(hash, &chain).await;
        self.deserialize_value(resolved)
    }

    /// Unconditionally install `value` under `key`.
    pub async fn put(&self, key: &K, value: &V) -> ClientResult<()> {
        let key_bytes = self.key_serializer.serialize(key)?;
        let value_bytes = self.value_serializer.serialize(value)?;
        let hash = self.hasher.hash(&key_bytes);
        let op = Operation::put(key_bytes, value_bytes, self.clock.tick());
        self.append(hash, &op).await
    }

    /// Unconditionally delete the mapping for `key`.
    pub async fn remove(&self, key: &K) -> ClientResult<()> {
        let key_bytes = self.key_serializer.serialize(key)?;
        let hash = self.hasher.hash(&key_bytes);
        let op = Operation::remove(key_bytes, self.clock.tick());
        self.append(hash, &op).await
    }

    /// Install `value` only if `key` is unmapped. Returns `None` when the
    /// install happened, or the existing value when it did not.
    pub async fn put_if_absent(&self, key: &K, value: &V) -> ClientResult<Option<V>> {
        let key_bytes = self.key_serializer.serialize(key)?;
        let value_bytes = self.value_serializer.serialize(value)?;
        let hash = self.hasher.hash(&key_bytes);
        let op = Operation::put_if_absent(key_bytes.clone(), value_bytes, self.clock.tick());
        let pre_chain = self.get_and_append(hash, &op).await?;
        let previous = self.resolver.resolve(&pre_chain, &key_bytes)?;
        self.maybe_propose_compaction(hash, &pre_chain).await;
        self.deserialize_value(previous)
    }

    /// Install `value` only if `key` is mapped. Returns the previous value.
    pub async fn replace(&self, key: &K, value: &V) -> ClientResult<Option<V>> {
        let key_bytes = self.key_serializer.serialize(key)?;
        let value_bytes = self.value_serializer.serialize(value)?;
        let hash = self.hasher.hash(&key_bytes);
        let op = Operation::replace(key_bytes.clone(), value_bytes, self.clock.tick());
        let pre_chain = self.get_and_append(hash, &op).await?;
        let previous = self.resolver.resolve(&pre_chain, &key_bytes)?;
        self.maybe_propose_compaction(hash, &pre_chain).await;
        self.deserialize_value(previous)
    }

    /// Install `value` only if the current value equals `expected` (by
    /// serialized byte equality). Returns whether the install happened.
    pub async fn replace_conditional(
        &self,
        key: &K,
        expected: &V,
        value: &V,
    ) -> ClientResult<bool> {
        let key_bytes = self.key_serializer.serialize(key)?;
        let expected_bytes = self.value_serializer.serialize(expected)?;
        let value_bytes = self.value_serializer.serialize(value)?;
        let hash = self.hasher.hash(&key_bytes);
        let op = Operation::replace_conditional(
            key_bytes.clone(),
            expected_bytes.clone(),
            value_bytes,
            self.clock.tick(),
        );
        let pre_chain = self.get_and_append(hash, &op).await?;
        let previous = self.resolver.resolve(&pre_chain, &key_bytes)?;
        self.maybe_propose_compaction(hash, &pre_chain).await;
        Ok(previous.as_deref() == Some(expected_bytes.as_slice()))
    }

    /// Recompute the mapping of each key with `f` and install the result.
    ///
    /// Per key: the current value is fetched, `f` produces the new mapping
    /// (`None` removes it), and the change is installed with a
    /// compare-and-set retry loop — if another client commits between the
    /// read and the install, `f` is re-evaluated against the value that
    /// won. Removals commit unconditionally: the operation set has no
    /// conditional remove. The batch as a whole is not atomic, and one
    /// key's failure does not abort the rest.
    pub async fn bulk_compute<F>(&self, keys: &[K], f: F) -> Vec<(K, ClientResult<Option<V>>)>
    where
        K: Clone,
        F: Fn(&K, Option<V>) -> Option<V>,
    {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let result = self.compute_one(key, &f).await;
            results.push((key.clone(), result));
        }
        results
    }

    /// Drop every mapping in the store.
    pub async fn clear(&self) -> ClientResult<()> {
        self.fetch(StoreRequest::Clear).await?;
        Ok(())
    }

    // ---- Internals ----

    async fn compute_one<F>(&self, key: &K, f: &F) -> ClientResult<Option<V>>
    where
        F: Fn(&K, Option<V>) -> Option<V>,
    {
        let key_bytes = self.key_serializer.serialize(key)?;
        let hash = self.hasher.hash(&key_bytes);
        let chain = self.fetch(StoreRequest::Get { hash }).await?;
        let mut previous_bytes = self.resolver.resolve(&chain, &key_bytes)?;

        loop {
            let previous = self.deserialize_value(previous_bytes.clone())?;
            let next = f(key, previous);
            let next_bytes = match &next {
                Some(value) => Some(self.value_serializer.serialize(value)?),
                None => None,
            };

            if next_bytes == previous_bytes {
                return Ok(next);
            }

            let op = match (&previous_bytes, next_bytes) {
                (None, Some(bytes)) => {
                    Operation::put_if_absent(key_bytes.clone(), bytes, self.clock.tick())
                }
                (Some(expected), Some(bytes)) => Operation::replace_conditional(
                    key_bytes.clone(),
                    expected.clone(),
                    bytes,
                    self.clock.tick(),
                ),
                // The operation set has no conditional remove, so a removal
                // commits unconditionally.
                (_, None) => Operation::remove(key_bytes.clone(), self.clock.tick()),
            };

            let pre_chain = self.get_and_append(hash, &op).await?;
            let observed = self.resolver.resolve(&pre_chain, &key_bytes)?;
            self.maybe_propose_compaction(hash, &pre_chain).await;

            if matches!(op, Operation::Remove { .. }) || observed == previous_bytes {
                return Ok(next);
            }
            // Lost the race: the conditional folded as a no-op against a
            // value some other client installed. Recompute against it.
            previous_bytes = observed;
        }
    }

    async fn append(&self, hash: KeyHash, op: &Operation) -> ClientResult<()> {
        let blob = self.codec.encode(op);
        self.fetch(StoreRequest::Append { hash, blob }).await?;
        Ok(())
    }

    async fn get_and_append(&self, hash: KeyHash, op: &Operation) -> ClientResult<Chain> {
        let blob = self.codec.encode(op);
        self.fetch(StoreRequest::GetAndAppend { hash, blob }).await
    }

    async fn fetch(&self, request: StoreRequest) -> ClientResult<Chain> {
        match self.exchange(request).await? {
            EntityResponse::Success(chain) => Ok(chain),
            EntityResponse::Failure { status, message } => {
                Err(Self::failure_to_error(status, message))
            }
        }
    }

    async fn exchange(&self, request: StoreRequest) -> ClientResult<EntityResponse> {
        let request = EntityRequest::new(self.alias.clone(), request);
        let deadline = self.config.call_deadline;
        match tokio::time::timeout(deadline, self.transport.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                elapsed_ms: deadline.as_millis() as u64,
            }),
        }
    }

    /// Propose head compaction when a fold observed a long chain.
    ///
    /// The observed chain is the expected prefix, so the server applies the
    /// replacement only if nothing it holds before our snapshot point has
    /// changed; on any mismatch the proposal is silently dropped. Failures
    /// here never surface to the caller — compaction is correctness-neutral.
    async fn maybe_propose_compaction(&self, hash: KeyHash, observed: &Chain) {
        if observed.len() < self.config.compaction_threshold {
            return;
        }
        let compacted = match self.compactor.compact(observed) {
            Ok(compacted) => compacted,
            Err(error) => {
                debug!(%hash, error = %error, "skipping compaction proposal");
                return;
            }
        };
        if compacted.len() >= observed.len() {
            return;
        }
        debug!(
            %hash,
            before = observed.len(),
            after = compacted.len(),
            "proposing head compaction"
        );
        let request = StoreRequest::ReplaceAtHead {
            hash,
            expected: observed.clone(),
            replacement: compacted,
        };
        if let Err(error) = self.exchange(request).await {
            debug!(%hash, error = %error, "compaction proposal dropped");
        }
    }

    fn deserialize_value(&self, bytes: Option<Vec<u8>>) -> ClientResult<Option<V>> {
        bytes
            .map(|raw| self.value_serializer.deserialize(&raw))
            .transpose()
            .map_err(Into::into)
    }

    fn failure_to_error(status: ResponseStatus, message: String) -> ClientError {
        match status {
            ResponseStatus::UnknownAlias => ClientError::EntityUnavailable(message),
            ResponseStatus::UnsupportedOpcode => ClientError::IncompatibleServer(message),
            status => ClientError::Server { status, message },
        }
    }
}
