use crate::amf::amf0::{markers, Amf0Value};
use crate::{ByteBuffer, Error, Result};

pub struct Amf0Encoder {
    buffer: ByteBuffer,
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: ByteBuffer::with_capacity(256),
        }
    }

    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        match value {
            Amf0Value::Number(n) => self.encode_number(*n),
            Amf0Value::Boolean(b) => self.encode_boolean(*b),
            Amf0Value::String(s) => self.encode_string(s),
            Amf0Value::Object(obj) => self.encode_object(obj),
            Amf0Value::Null => self.write_marker(markers::NULL),
            Amf0Value::Undefined => self.write_marker(markers::UNDEFINED),
            Amf0Value::EcmaArray(obj) => self.encode_ecma_array(obj),
            Amf0Value::Array(arr) => self.encode_array(arr),
            Amf0Value::Date(timestamp, timezone) => self.encode_date(*timestamp, *timezone),
            Amf0Value::LongString(s) => self.encode_long_string(s),
        }
    }

    fn write_marker(&mut self, marker: u8) -> Result<()> {
        self.buffer.write_u8(marker)?;
        Ok(())
    }

    fn encode_number(&mut self, value: f64) -> Result<()> {
        self.write_marker(markers::NUMBER)?;
        self.buffer.write_f64_be(value)?;
        Ok(())
    }

    fn encode_string(&mut self, value: &str) -> Result<()> {
        if value.len() > u16::MAX as usize {
            return Err(Error::amf_encode(format!(
                "String of {} bytes needs a long string",
                value.len()
            )));
        }
        self.write_marker(markers::STRING)?;
        self.write_string_no_marker(value)
    }

    fn encode_boolean(&mut self, value: bool) -> Result<()> {
        self.write_marker(markers::BOOLEAN)?;
        self.buffer.write_u8(if value { 1 } else { 0 })?;
        Ok(())
    }

    fn encode_properties(&mut self, obj: &[(String, Amf0Value)]) -> Result<()> {
        for (key, value) in obj {
            self.write_string_no_marker(key)?;
            self.encode(value)?;
        }
        self.buffer.write_u16_be(0)?;
        self.buffer.write_u8(markers::OBJECT_END)?;
        Ok(())
    }

    fn encode_object(&mut self, obj: &[(String, Amf0Value)]) -> Result<()> {
        self.write_marker(markers::OBJECT)?;
        self.encode_properties(obj)
    }

    fn encode_ecma_array(&mut self, obj: &[(String, Amf0Value)]) -> Result<()> {
        self.write_marker(markers::ECMA_ARRAY)?;
        self.buffer.write_u32_be(obj.len() as u32)?;
        self.encode_properties(obj)
    }

    fn encode_array(&mut self, arr: &[Amf0Value]) -> Result<()> {
        self.write_marker(markers::STRICT_ARRAY)?;
        self.buffer.write_u32_be(arr.len() as u32)?;
        for value in arr {
            self.encode(value)?;
        }
        Ok(())
    }

    fn encode_date(&mut self, timestamp: f64, timezone: i16) -> Result<()> {
        self.write_marker(markers::DATE)?;
        self.buffer.write_f64_be(timestamp)?;
        self.buffer.write_i16_be(timezone)?;
        Ok(())
    }

    fn encode_long_string(&mut self, value: &str) -> Result<()> {
        self.write_marker(markers::LONG_STRING)?;
        let bytes = value.as_bytes();
        self.buffer.write_u32_be(bytes.len() as u32)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    /// Property names carry a length prefix but no type marker
    fn write_string_no_marker(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > u16::MAX as usize {
            return Err(Error::amf_encode("Property name longer than 65535 bytes"));
        }
        self.buffer.write_u16_be(bytes.len() as u16)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }
}

/// Encode a sequence of values back to back
pub fn encode_amf0_values(values: &[Amf0Value]) -> Result<Vec<u8>> {
    let mut encoder = Amf0Encoder::new();
    for value in values {
        encoder.encode(value)?;
    }
    Ok(encoder.into_bytes())
}
