use async_trait::async_trait;

use shoal_protocol::{EntityCodec, EntityRequest, EntityResponse};

use crate::error::ClientResult;

/// Transport seam for the entity protocol: one request in, one response
/// out, with the suspension point on the round-trip.
///
/// Implementations must tolerate the caller dropping the returned future:
/// once the request frame has left the client, the operation may or may
/// not be applied by the server, and cancellation must not corrupt the
/// transport's own state.
#[async_trait]
pub trait EntityTransport: Send + Sync {
    async fn exchange(&self, request: EntityRequest) -> ClientResult<EntityResponse>;
}

/// Transport over any in-process frame handler.
///
/// Every exchange is encoded to a real request frame and the reply decoded
/// from a real response frame, so the full wire path is exercised even when
/// the "server" is a function in the same process. Used for embedding and
/// for tests against an in-process entity service.
pub struct FrameTransport<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    handle: F,
}

impl<F> FrameTransport<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    pub fn new(handle: F) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl<F> EntityTransport for FrameTransport<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    async fn exchange(&self, request: EntityRequest) -> ClientResult<EntityResponse> {
        let frame = EntityCodec::encode_request(&request)?;
        let reply = (self.handle)(&frame);
        Ok(EntityCodec::decode_response(&reply)?)
    }
}
