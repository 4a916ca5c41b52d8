use std::io;
use crate::amf::amf0::{markers, Amf0Properties, Amf0Value};
use crate::{ByteBuffer, Error, Result};

fn truncated(e: io::Error) -> Error {
    Error::amf_decode(format!("Truncated AMF0 value: {}", e))
}

/// Deepest object/array nesting accepted from a peer
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Amf0Decoder<'a> {
    buffer: &'a mut ByteBuffer,
    depth: usize,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf0Decoder { buffer, depth: 0 }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    pub fn decode(&mut self) -> Result<Amf0Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::amf_decode(format!(
                "AMF0 nesting deeper than {}",
                MAX_NESTING_DEPTH
            )));
        }
        let marker = self.buffer.read_u8().map_err(truncated)?;

        self.depth += 1;
        let result = self.decode_marker(marker);
        self.depth -= 1;
        result
    }

    fn decode_marker(&mut self, marker: u8) -> Result<Amf0Value> {
        match marker {
            markers::NUMBER => self.decode_number(),
            markers::BOOLEAN => self.decode_boolean(),
            markers::STRING => self.decode_string(),
            markers::OBJECT => Ok(Amf0Value::Object(self.decode_properties()?)),
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::ECMA_ARRAY => self.decode_ecma_array(),
            markers::STRICT_ARRAY => self.decode_strict_array(),
            markers::DATE => self.decode_date(),
            markers::LONG_STRING => self.decode_long_string(),
            markers::MOVIE_CLIP | markers::REFERENCE => Err(Error::amf_decode(format!(
                "Unsupported AMF0 marker: 0x{:02x}",
                marker
            ))),
            _ => Err(Error::amf_decode(format!("Unknown AMF0 marker: 0x{:02x}", marker))),
        }
    }

    fn decode_number(&mut self) -> Result<Amf0Value> {
        let value = self.buffer.read_f64_be().map_err(truncated)?;
        Ok(Amf0Value::Number(value))
    }

    fn decode_boolean(&mut self) -> Result<Amf0Value> {
        let value = self.buffer.read_u8().map_err(truncated)? != 0;
        Ok(Amf0Value::Boolean(value))
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.buffer.read_bytes(len).map_err(truncated)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::amf_decode(format!("Invalid UTF-8 in string: {}", e)))
    }

    fn decode_string(&mut self) -> Result<Amf0Value> {
        let len = self.buffer.read_u16_be().map_err(truncated)? as usize;
        Ok(Amf0Value::String(self.read_utf8(len)?))
    }

    fn decode_long_string(&mut self) -> Result<Amf0Value> {
        let len = self.buffer.read_u32_be().map_err(truncated)? as usize;
        Ok(Amf0Value::LongString(self.read_utf8(len)?))
    }

    /// Name/value pairs up to the empty-name + OBJECT_END terminator
    fn decode_properties(&mut self) -> Result<Amf0Properties> {
        let mut object = Vec::new();
        loop {
            let name_len = self.buffer.read_u16_be().map_err(truncated)? as usize;
            if name_len == 0 {
                let end = self.buffer.read_u8().map_err(truncated)?;
                if end != markers::OBJECT_END {
                    return Err(Error::amf_decode(format!(
                        "Expected object end marker, found 0x{:02x}",
                        end
                    )));
                }
                break;
            }
            let name = self.read_utf8(name_len)?;
            let value = self.decode()?;
            object.push((name, value));
        }
        Ok(object)
    }

    fn decode_ecma_array(&mut self) -> Result<Amf0Value> {
        // Count is advisory; the terminator is authoritative
        let _count = self.buffer.read_u32_be().map_err(truncated)?;
        Ok(Amf0Value::EcmaArray(self.decode_properties()?))
    }

    fn decode_strict_array(&mut self) -> Result<Amf0Value> {
        let count = self.buffer.read_u32_be().map_err(truncated)? as usize;
        let mut array = Vec::with_capacity(count.min(self.buffer.remaining()));
        for _ in 0..count {
            array.push(self.decode()?);
        }
        Ok(Amf0Value::Array(array))
    }

    fn decode_date(&mut self) -> Result<Amf0Value> {
        let timestamp = self.buffer.read_f64_be().map_err(truncated)?;
        let timezone = self.buffer.read_i16_be().map_err(truncated)?;
        Ok(Amf0Value::Date(timestamp, timezone))
    }
}

/// Decode a single value from the front of `data`, returning it with the
/// number of bytes it occupied.
pub fn decode_amf0_value(data: &[u8]) -> Result<(Amf0Value, usize)> {
    let mut buffer = ByteBuffer::new(data.to_vec());
    let mut decoder = Amf0Decoder::new(&mut buffer);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_string_reports_length() {
        let bytes = [0x02, 0x00, 0x07, b'_', b'r', b'e', b's', b'u', b'l', b't', 0xFF];
        let (value, used) = decode_amf0_value(&bytes).unwrap();
        assert_eq!(value, Amf0Value::String("_result".into()));
        assert_eq!(used, 10);
    }

    #[test]
    fn test_decode_object() {
        let mut bytes = vec![0x03];
        bytes.extend_from_slice(&[0x00, 0x05]);
        bytes.extend_from_slice(b"level");
        bytes.extend_from_slice(&[0x02, 0x00, 0x06]);
        bytes.extend_from_slice(b"status");
        bytes.extend_from_slice(&[0x00, 0x00, 0x09]);

        let (value, used) = decode_amf0_value(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(value.get_property("level").and_then(|v| v.as_string()), Some("status"));
    }

    #[test]
    fn test_truncated_number_is_decode_error() {
        let err = decode_amf0_value(&[0x00, 0x40, 0x00]).unwrap_err();
        assert!(matches!(err, Error::AmfDecode(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unknown_marker() {
        assert!(matches!(decode_amf0_value(&[0x42]), Err(Error::AmfDecode(_))));
        assert!(matches!(decode_amf0_value(&[markers::REFERENCE, 0, 1]), Err(Error::AmfDecode(_))));
    }

    fn nested_objects(depth: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for _ in 0..depth {
            bytes.extend_from_slice(&[0x03, 0x00, 0x01, b'a']);
        }
        bytes.push(0x05);
        for _ in 0..depth {
            bytes.extend_from_slice(&[0x00, 0x00, 0x09]);
        }
        bytes
    }

    #[test]
    fn test_nesting_limit() {
        let bytes = nested_objects(MAX_NESTING_DEPTH - 1);
        let (_, used) = decode_amf0_value(&bytes).unwrap();
        assert_eq!(used, bytes.len());

        let err = decode_amf0_value(&nested_objects(MAX_NESTING_DEPTH)).unwrap_err();
        assert!(matches!(err, Error::AmfDecode(_)));
    }

    #[test]
    fn test_hostile_nesting_is_decode_error() {
        let err = decode_amf0_value(&nested_objects(200_000)).unwrap_err();
        assert!(matches!(err, Error::AmfDecode(_)));
        assert!(!err.is_fatal());

        let mut array = Vec::new();
        for _ in 0..100_000 {
            array.extend_from_slice(&[0x0A, 0x00, 0x00, 0x00, 0x01]);
        }
        array.push(0x05);
        assert!(matches!(decode_amf0_value(&array), Err(Error::AmfDecode(_))));
    }

    #[test]
    fn test_missing_object_end() {
        let bytes = [0x03, 0x00, 0x00, 0x05];
        assert!(decode_amf0_value(&bytes).is_err());
    }
}
