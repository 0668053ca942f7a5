/// Wire discriminator for each operation variant.
///
/// Values are fixed by the protocol; a future variant reserves a new value
/// and never reuses or changes an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Put = 1,
    Remove = 2,
    PutIfAbsent = 3,
    Replace = 4,
    ReplaceConditional = 5,
}

impl Opcode {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Put),
            2 => Some(Self::Remove),
            3 => Some(Self::PutIfAbsent),
            4 => Some(Self::Replace),
            5 => Some(Self::ReplaceConditional),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Put => "Put",
            Self::Remove => "Remove",
            Self::PutIfAbsent => "PutIfAbsent",
            Self::Replace => "Replace",
            Self::ReplaceConditional => "ReplaceConditional",
        }
    }
}

/// A single mutation of one key, as recorded in a chain.
///
/// Keys and values are serialized bytes; equality anywhere in the pipeline
/// is byte equality. The timestamp is informational (diagnostics only) —
/// the server's append order is the only ordering that affects resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Unconditionally install a value.
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        timestamp: u64,
    },
    /// Unconditionally delete the mapping.
    Remove { key: Vec<u8>, timestamp: u64 },
    /// Install only if the key currently has no value.
    PutIfAbsent {
        key: Vec<u8>,
        value: Vec<u8>,
        timestamp: u64,
    },
    /// Install only if the key currently has some value.
    Replace {
        key: Vec<u8>,
        value: Vec<u8>,
        timestamp: u64,
    },
    /// Install only if the current value equals `expected`.
    ReplaceConditional {
        key: Vec<u8>,
        expected: Vec<u8>,
        value: Vec<u8>,
        timestamp: u64,
    },
}

impl Operation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn remove(key: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self::Remove {
            key: key.into(),
            timestamp,
        }
    }

    pub fn put_if_absent(
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        timestamp: u64,
    ) -> Self {
        Self::PutIfAbsent {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn replace(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self::Replace {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn replace_conditional(
        key: impl Into<Vec<u8>>,
        expected: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        timestamp: u64,
    ) -> Self {
        Self::ReplaceConditional {
            key: key.into(),
            expected: expected.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Put { .. } => Opcode::Put,
            Self::Remove { .. } => Opcode::Remove,
            Self::PutIfAbsent { .. } => Opcode::PutIfAbsent,
            Self::Replace { .. } => Opcode::Replace,
            Self::ReplaceConditional { .. } => Opcode::ReplaceConditional,
        }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. }
            | Self::Remove { key, .. }
            | Self::PutIfAbsent { key, .. }
            | Self::Replace { key, .. }
            | Self::ReplaceConditional { key, .. } => key,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Put { timestamp, .. }
            | Self::Remove { timestamp, .. }
            | Self::PutIfAbsent { timestamp, .. }
            | Self::Replace { timestamp, .. }
            | Self::ReplaceConditional { timestamp, .. } => *timestamp,
        }
    }

    /// The effect of this operation on the key's current value.
    ///
    /// Pure, total, and deterministic. `prev` is the value the key resolves
    /// to immediately before this operation; the return value is the value
    /// immediately after it.
    pub fn apply<'a>(&'a self, prev: Option<&'a [u8]>) -> Option<&'a [u8]> {
        match self {
            Self::Put { value, .. } => Some(value),
            Self::Remove { .. } => None,
            Self::PutIfAbsent { value, .. } => match prev {
                None => Some(value),
                Some(existing) => Some(existing),
            },
            Self::Replace { value, .. } => prev.map(|_| value.as_slice()),
            Self::ReplaceConditional {
                expected, value, ..
            } => match prev {
                Some(existing) if existing == expected.as_slice() => Some(value),
                other => other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Opcode mapping
    // -----------------------------------------------------------------------

    #[test]
    fn opcode_values_are_fixed() {
        assert_eq!(Opcode::Put.as_u8(), 1);
        assert_eq!(Opcode::Remove.as_u8(), 2);
        assert_eq!(Opcode::PutIfAbsent.as_u8(), 3);
        assert_eq!(Opcode::Replace.as_u8(), 4);
        assert_eq!(Opcode::ReplaceConditional.as_u8(), 5);
    }

    #[test]
    fn opcode_from_u8_roundtrip() {
        for code in [
            Opcode::Put,
            Opcode::Remove,
            Opcode::PutIfAbsent,
            Opcode::Replace,
            Opcode::ReplaceConditional,
        ] {
            assert_eq!(Opcode::from_u8(code.as_u8()), Some(code));
        }
        assert_eq!(Opcode::from_u8(0), None);
        assert_eq!(Opcode::from_u8(6), None);
        assert_eq!(Opcode::from_u8(255), None);
    }

    // -----------------------------------------------------------------------
    // Effect table
    // -----------------------------------------------------------------------

    #[test]
    fn put_overwrites_any_state() {
        let op = Operation::put("k", "new", 1);
        assert_eq!(op.apply(None), Some(&b"new"[..]));
        assert_eq!(op.apply(Some(b"old")), Some(&b"new"[..]));
    }

    #[test]
    fn remove_clears_any_state() {
        let op = Operation::remove("k", 1);
        assert_eq!(op.apply(None), None);
        assert_eq!(op.apply(Some(b"old")), None);
    }

    #[test]
    fn put_if_absent_only_installs_on_none() {
        let op = Operation::put_if_absent("k", "new", 1);
        assert_eq!(op.apply(None), Some(&b"new"[..]));
        assert_eq!(op.apply(Some(b"old")), Some(&b"old"[..]));
    }

    #[test]
    fn replace_only_installs_on_some() {
        let op = Operation::replace("k", "new", 1);
        assert_eq!(op.apply(None), None);
        assert_eq!(op.apply(Some(b"old")), Some(&b"new"[..]));
    }

    #[test]
    fn replace_conditional_compares_bytes() {
        let op = Operation::replace_conditional("k", "old", "new", 1);
        assert_eq!(op.apply(None), None);
        assert_eq!(op.apply(Some(b"old")), Some(&b"new"[..]));
        assert_eq!(op.apply(Some(b"other")), Some(&b"other"[..]));
    }

    #[test]
    fn apply_is_deterministic() {
        let op = Operation::put_if_absent("k", "v", 9);
        for _ in 0..10 {
            assert_eq!(op.apply(Some(b"x")), Some(&b"x"[..]));
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[test]
    fn key_and_timestamp_accessors() {
        let op = Operation::replace_conditional("key", "old", "new", 42);
        assert_eq!(op.key(), b"key");
        assert_eq!(op.timestamp(), 42);
        assert_eq!(op.opcode(), Opcode::ReplaceConditional);
        assert_eq!(op.opcode().name(), "ReplaceConditional");
    }
}
