use shoal_chain::{Blob, Chain};
use shoal_types::KeyHash;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{
    opcodes, EntityRequest, EntityResponse, ResponseStatus, StoreRequest, MAX_FRAME_SIZE,
};

/// Codec for entity messages.
///
/// Request framing: `aliasLen:u16 alias:utf8 opcode:u8 payload`.
/// Response framing: `status:u8 [chain | errLen:u32 err:utf8]` where
/// `chain := chainLen:u32 (blobLen:u32 blob)*`. All integers big-endian,
/// no trailing delimiter; one message per frame.
pub struct EntityCodec;

impl EntityCodec {
    pub fn encode_request(request: &EntityRequest) -> ProtocolResult<Vec<u8>> {
        let alias = request.alias.as_bytes();
        if alias.len() > u16::MAX as usize {
            return Err(ProtocolError::Framing(format!(
                "alias too long: {} bytes",
                alias.len()
            )));
        }

        let mut buf = Vec::with_capacity(3 + alias.len() + 16);
        buf.extend_from_slice(&(alias.len() as u16).to_be_bytes());
        buf.extend_from_slice(alias);
        buf.push(request.request.opcode());
        match &request.request {
            StoreRequest::Get { hash } => {
                write_hash(&mut buf, *hash);
            }
            StoreRequest::GetAndAppend { hash, blob } | StoreRequest::Append { hash, blob } => {
                write_hash(&mut buf, *hash);
                write_blob(&mut buf, blob);
            }
            StoreRequest::ReplaceAtHead {
                hash,
                expected,
                replacement,
            } => {
                write_hash(&mut buf, *hash);
                write_chain(&mut buf, expected);
                write_chain(&mut buf, replacement);
            }
            StoreRequest::Clear => {}
        }

        check_frame_size(buf.len())?;
        Ok(buf)
    }

    pub fn decode_request(data: &[u8]) -> ProtocolResult<EntityRequest> {
        check_frame_size(data.len())?;
        let mut reader = FrameReader::new(data);
        let alias_len = reader.read_u16("alias length")? as usize;
        let alias_bytes = reader.read_bytes(alias_len, "alias")?;
        let alias = std::str::from_utf8(alias_bytes)
            .map_err(|e| ProtocolError::Framing(format!("alias is not UTF-8: {e}")))?
            .to_string();
        let opcode = reader.read_u8("opcode")?;

        let request = match opcode {
            opcodes::GET => StoreRequest::Get {
                hash: reader.read_hash()?,
            },
            opcodes::GET_AND_APPEND => StoreRequest::GetAndAppend {
                hash: reader.read_hash()?,
                blob: reader.read_blob()?,
            },
            opcodes::APPEND => StoreRequest::Append {
                hash: reader.read_hash()?,
                blob: reader.read_blob()?,
            },
            opcodes::REPLACE_AT_HEAD => StoreRequest::ReplaceAtHead {
                hash: reader.read_hash()?,
                expected: reader.read_chain()?,
                replacement: reader.read_chain()?,
            },
            opcodes::CLEAR => StoreRequest::Clear,
            other => return Err(ProtocolError::UnsupportedOpcode(other)),
        };

        reader.expect_end()?;
        Ok(EntityRequest { alias, request })
    }

    pub fn encode_response(response: &EntityResponse) -> ProtocolResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.push(response.status().as_u8());
        match response {
            EntityResponse::Success(chain) => {
                write_chain(&mut buf, chain);
            }
            EntityResponse::Failure { message, .. } => {
                buf.extend_from_slice(&(message.len() as u32).to_be_bytes());
                buf.extend_from_slice(message.as_bytes());
            }
        }
        check_frame_size(buf.len())?;
        Ok(buf)
    }

    pub fn decode_response(data: &[u8]) -> ProtocolResult<EntityResponse> {
        check_frame_size(data.len())?;
        let mut reader = FrameReader::new(data);
        let status_byte = reader.read_u8("status")?;
        let status = ResponseStatus::from_u8(status_byte)
            .ok_or_else(|| ProtocolError::Framing(format!("unknown status byte {status_byte}")))?;

        let response = match status {
            ResponseStatus::Ok => EntityResponse::Success(reader.read_chain()?),
            failure => {
                let len = reader.read_u32("error length")? as usize;
                let raw = reader.read_bytes(len, "error")?;
                let message = std::str::from_utf8(raw)
                    .map_err(|e| ProtocolError::Framing(format!("error is not UTF-8: {e}")))?
                    .to_string();
                EntityResponse::Failure {
                    status: failure,
                    message,
                }
            }
        };

        reader.expect_end()?;
        Ok(response)
    }
}

fn check_frame_size(size: usize) -> ProtocolResult<()> {
    if size > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size,
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(())
}

fn write_hash(buf: &mut Vec<u8>, hash: KeyHash) {
    buf.extend_from_slice(&hash.as_u64().to_be_bytes());
}

fn write_blob(buf: &mut Vec<u8>, blob: &Blob) {
    buf.extend_from_slice(&(blob.len() as u32).to_be_bytes());
    buf.extend_from_slice(blob.as_bytes());
}

fn write_chain(buf: &mut Vec<u8>, chain: &Chain) {
    buf.extend_from_slice(&(chain.len() as u32).to_be_bytes());
    for blob in chain.iter() {
        write_blob(buf, blob);
    }
}

struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self, what: &str) -> ProtocolResult<u8> {
        let bytes = self.read_bytes(1, what)?;
        Ok(bytes[0])
    }

    fn read_u16(&mut self, what: &str) -> ProtocolResult<u16> {
        let bytes = self.read_bytes(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self, what: &str) -> ProtocolResult<u32> {
        let bytes = self.read_bytes(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self, what: &str) -> ProtocolResult<u64> {
        let bytes = self.read_bytes(8, what)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> ProtocolResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(ProtocolError::Framing(format!(
                "truncated frame: need {len} bytes for {what}, have {}",
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_hash(&mut self) -> ProtocolResult<KeyHash> {
        Ok(KeyHash::from_u64(self.read_u64("key hash")?))
    }

    fn read_blob(&mut self) -> ProtocolResult<Blob> {
        let len = self.read_u32("blob length")? as usize;
        let bytes = self.read_bytes(len, "blob")?;
        Ok(Blob::from_vec(bytes.to_vec()))
    }

    fn read_chain(&mut self) -> ProtocolResult<Chain> {
        let count = self.read_u32("chain length")? as usize;
        let mut blobs = Vec::new();
        for _ in 0..count {
            blobs.push(self.read_blob()?);
        }
        Ok(Chain::from_blobs(blobs))
    }

    fn expect_end(&self) -> ProtocolResult<()> {
        if self.remaining() != 0 {
            return Err(ProtocolError::Framing(format!(
                "{} trailing bytes after message",
                self.remaining()
            )));
        }
        Ok(())
    }
}
