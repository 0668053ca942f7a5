use crate::chain::Blob;
use crate::error::CodecError;
use crate::operation::{Opcode, Operation};

/// Decoder entry for one opcode: parses everything after the opcode byte.
pub type DecodeFn = fn(&mut ByteReader<'_>) -> Result<Operation, CodecError>;

/// Data-driven opcode dispatch table.
///
/// Maps the opcode byte to its payload decoder, so supporting a new opcode
/// is one `register` call — the chain and the resolver are untouched.
#[derive(Clone)]
pub struct OpcodeTable {
    decoders: [Option<DecodeFn>; 256],
}

impl OpcodeTable {
    /// An empty table with no opcodes registered.
    pub fn empty() -> Self {
        Self {
            decoders: [None; 256],
        }
    }

    /// The standard table covering every shipped opcode.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(Opcode::Put.as_u8(), decode_put);
        table.register(Opcode::Remove.as_u8(), decode_remove);
        table.register(Opcode::PutIfAbsent.as_u8(), decode_put_if_absent);
        table.register(Opcode::Replace.as_u8(), decode_replace);
        table.register(Opcode::ReplaceConditional.as_u8(), decode_replace_conditional);
        table
    }

    pub fn register(&mut self, opcode: u8, decoder: DecodeFn) {
        self.decoders[opcode as usize] = Some(decoder);
    }

    pub fn lookup(&self, opcode: u8) -> Option<DecodeFn> {
        self.decoders[opcode as usize]
    }
}

/// Bidirectional mapping between an [`Operation`] and its wire [`Blob`].
///
/// Wire layout (big-endian, u32 lengths):
///
/// ```text
/// blob := opcode:u8 ts:u64 keyLen:u32 key [len:u32 bytes]*
/// ```
///
/// `decode(encode(op)) == op` for every supported opcode; decode rejects
/// unknown opcodes, truncated payloads, overrunning length prefixes, and
/// trailing bytes.
#[derive(Clone)]
pub struct OperationCodec {
    table: OpcodeTable,
}

impl OperationCodec {
    pub fn new() -> Self {
        Self {
            table: OpcodeTable::standard(),
        }
    }

    pub fn with_table(table: OpcodeTable) -> Self {
        Self { table }
    }

    pub fn encode(&self, op: &Operation) -> Blob {
        let mut buf = Vec::with_capacity(Self::encoded_len(op));
        buf.push(op.opcode().as_u8());
        buf.extend_from_slice(&op.timestamp().to_be_bytes());
        match op {
            Operation::Put { key, value, .. }
            | Operation::PutIfAbsent { key, value, .. }
            | Operation::Replace { key, value, .. } => {
                write_field(&mut buf, key);
                write_field(&mut buf, value);
            }
            Operation::Remove { key, .. } => {
                write_field(&mut buf, key);
            }
            Operation::ReplaceConditional {
                key,
                expected,
                value,
                ..
            } => {
                write_field(&mut buf, key);
                write_field(&mut buf, expected);
                write_field(&mut buf, value);
            }
        }
        Blob::from_vec(buf)
    }

    pub fn decode(&self, blob: &Blob) -> Result<Operation, CodecError> {
        let mut reader = ByteReader::new(blob.as_bytes());
        let opcode = reader.read_u8("opcode")?;
        let decoder = self
            .table
            .lookup(opcode)
            .ok_or(CodecError::UnknownOpcode(opcode))?;
        let op = decoder(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(CodecError::TrailingBytes(reader.remaining()));
        }
        Ok(op)
    }

    fn encoded_len(op: &Operation) -> usize {
        let fields = match op {
            Operation::Put { key, value, .. }
            | Operation::PutIfAbsent { key, value, .. }
            | Operation::Replace { key, value, .. } => 8 + key.len() + value.len(),
            Operation::Remove { key, .. } => 4 + key.len(),
            Operation::ReplaceConditional {
                key,
                expected,
                value,
                ..
            } => 12 + key.len() + expected.len() + value.len(),
        };
        1 + 8 + fields
    }
}

impl Default for OperationCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn write_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn decode_put(r: &mut ByteReader<'_>) -> Result<Operation, CodecError> {
    let timestamp = r.read_u64("timestamp")?;
    let key = r.read_field("key")?;
    let value = r.read_field("value")?;
    Ok(Operation::Put {
        key,
        value,
        timestamp,
    })
}

fn decode_remove(r: &mut ByteReader<'_>) -> Result<Operation, CodecError> {
    let timestamp = r.read_u64("timestamp")?;
    let key = r.read_field("key")?;
    Ok(Operation::Remove { key, timestamp })
}

fn decode_put_if_absent(r: &mut ByteReader<'_>) -> Result<Operation, CodecError> {
    let timestamp = r.read_u64("timestamp")?;
    let key = r.read_field("key")?;
    let value = r.read_field("value")?;
    Ok(Operation::PutIfAbsent {
        key,
        value,
        timestamp,
    })
}

fn decode_replace(r: &mut ByteReader<'_>) -> Result<Operation, CodecError> {
    let timestamp = r.read_u64("timestamp")?;
    let key = r.read_field("key")?;
    let value = r.read_field("value")?;
    Ok(Operation::Replace {
        key,
        value,
        timestamp,
    })
}

fn decode_replace_conditional(r: &mut ByteReader<'_>) -> Result<Operation, CodecError> {
    let timestamp = r.read_u64("timestamp")?;
    let key = r.read_field("key")?;
    let expected = r.read_field("expected")?;
    let value = r.read_field("value")?;
    Ok(Operation::ReplaceConditional {
        key,
        expected,
        value,
        timestamp,
    })
}

/// Cursor over a blob's bytes with truncation-checked reads.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        if self.remaining() < 1 {
            return Err(CodecError::Truncated(field));
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        if self.remaining() < 4 {
            return Err(CodecError::Truncated(field));
        }
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_be_bytes(raw))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        if self.remaining() < 8 {
            return Err(CodecError::Truncated(field));
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_be_bytes(raw))
    }

    /// A length-prefixed field: `len:u32 bytes`.
    pub fn read_field(&mut self, field: &'static str) -> Result<Vec<u8>, CodecError> {
        let declared = self.read_u32(field)? as usize;
        if declared > self.remaining() {
            return Err(CodecError::LengthOverrun {
                field,
                declared,
                remaining: self.remaining(),
            });
        }
        let bytes = self.buf[self.pos..self.pos + declared].to_vec();
        self.pos += declared;
        Ok(bytes)
    }
}
