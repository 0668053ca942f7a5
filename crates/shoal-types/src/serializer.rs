use crate::error::TypeError;

/// Byte-encoder seam for opaque key and value types.
///
/// All implementations must satisfy these invariants:
/// - `deserialize(serialize(x)) == x` for every value the serializer accepts.
/// - Serialization is stable: the same value always produces the same bytes.
///   Downstream equality (conditional replace, key matching during chain
///   resolution) is byte equality on serialized form, nothing finer.
/// - Failures are reported through [`TypeError`], never panics.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, TypeError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<T, TypeError>;
}

/// UTF-8 serializer for `String` keys and values.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringSerializer;

impl Serializer<String> for StringSerializer {
    fn serialize(&self, value: &String) -> Result<Vec<u8>, TypeError> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, TypeError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| TypeError::Serialization(format!("invalid UTF-8: {e}")))
    }
}

/// Pass-through serializer for callers that already hold raw bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentitySerializer;

impl Serializer<Vec<u8>> for IdentitySerializer {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>, TypeError> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>, TypeError> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip() {
        let s = StringSerializer;
        let bytes = s.serialize(&"hello".to_string()).unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(s.deserialize(&bytes).unwrap(), "hello");
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let s = StringSerializer;
        let err = s.deserialize(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }

    #[test]
    fn identity_roundtrip() {
        let s = IdentitySerializer;
        let value = vec![0u8, 1, 2, 0xff];
        let bytes = s.serialize(&value).unwrap();
        assert_eq!(s.deserialize(&bytes).unwrap(), value);
    }
}
