use shoal_chain::{Blob, Chain};
use shoal_types::KeyHash;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Message opcodes. Distinct from the operation opcodes inside blobs.
pub mod opcodes {
    pub const GET: u8 = 0x10;
    pub const GET_AND_APPEND: u8 = 0x11;
    pub const APPEND: u8 = 0x12;
    pub const REPLACE_AT_HEAD: u8 = 0x13;
    pub const CLEAR: u8 = 0x14;
}

/// One store-level operation, as carried inside an entity request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreRequest {
    /// Snapshot the chain for a bucket.
    Get { hash: KeyHash },
    /// Atomically append a blob and return the pre-append chain.
    GetAndAppend { hash: KeyHash, blob: Blob },
    /// Append a blob; no chain comes back.
    Append { hash: KeyHash, blob: Blob },
    /// Compaction proposal: replace `expected` (an exact chain prefix) with
    /// `replacement`. Ignored without error on mismatch.
    ReplaceAtHead {
        hash: KeyHash,
        expected: Chain,
        replacement: Chain,
    },
    /// Drop every bucket in the store.
    Clear,
}

impl StoreRequest {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Get { .. } => opcodes::GET,
            Self::GetAndAppend { .. } => opcodes::GET_AND_APPEND,
            Self::Append { .. } => opcodes::APPEND,
            Self::ReplaceAtHead { .. } => opcodes::REPLACE_AT_HEAD,
            Self::Clear => opcodes::CLEAR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "Get",
            Self::GetAndAppend { .. } => "GetAndAppend",
            Self::Append { .. } => "Append",
            Self::ReplaceAtHead { .. } => "ReplaceAtHead",
            Self::Clear => "Clear",
        }
    }
}

/// A client → server message: store alias plus one store-level operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRequest {
    pub alias: String,
    pub request: StoreRequest,
}

impl EntityRequest {
    pub fn new(alias: impl Into<String>, request: StoreRequest) -> Self {
        Self {
            alias: alias.into(),
            request,
        }
    }
}

/// Response status byte. Zero is success; everything else is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseStatus {
    Ok = 0,
    UnknownAlias = 1,
    UnsupportedOpcode = 2,
    BadRequest = 3,
    Internal = 4,
}

impl ResponseStatus {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::UnknownAlias),
            2 => Some(Self::UnsupportedOpcode),
            3 => Some(Self::BadRequest),
            4 => Some(Self::Internal),
            _ => None,
        }
    }
}

/// A server → client message.
///
/// Success always carries a chain; messages with nothing to return
/// (append, compaction proposal, clear) carry the empty chain so the
/// response grammar stays uniform across opcodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityResponse {
    Success(Chain),
    Failure {
        status: ResponseStatus,
        message: String,
    },
}

impl EntityResponse {
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Success(_) => ResponseStatus::Ok,
            Self::Failure { status, .. } => *status,
        }
    }
}
