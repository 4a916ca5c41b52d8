use std::fmt;

/// Object and ECMA array properties, in wire order
pub type Amf0Properties = Vec<(String, Amf0Value)>;

/// AMF0 data types
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),                                    // 0x00
    Boolean(bool),                                  // 0x01
    String(String),                                 // 0x02
    Object(Amf0Properties),                         // 0x03
    Null,                                           // 0x05
    Undefined,                                      // 0x06
    EcmaArray(Amf0Properties),                      // 0x08
    Array(Vec<Amf0Value>),                          // 0x0A (strict array)
    Date(f64, i16),                                 // 0x0B
    LongString(String),                             // 0x0C
}

// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIE_CLIP: u8 = 0x04;    // reserved, never decoded
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;     // not supported
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
}

impl Amf0Value {
    /// Build an object from `(key, value)` pairs
    pub fn object<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Amf0Value)>) -> Self {
        Amf0Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string reference
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::LongString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract object reference
    pub fn as_object(&self) -> Option<&[(String, Amf0Value)]> {
        match self {
            Amf0Value::Object(obj) | Amf0Value::EcmaArray(obj) => Some(obj.as_slice()),
            _ => None,
        }
    }

    /// Get property from object; the first match wins
    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object()
            .and_then(|obj| obj.iter().find(|(name, _)| name == key))
            .map(|(_, value)| value)
    }

    /// Check if null or undefined
    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Value::Null | Amf0Value::Undefined)
    }

    /// Name of the AMF0 type, for log lines
    pub fn type_name(&self) -> &'static str {
        match self {
            Amf0Value::Number(_) => "number",
            Amf0Value::Boolean(_) => "boolean",
            Amf0Value::String(_) => "string",
            Amf0Value::Object(_) => "object",
            Amf0Value::Null => "null",
            Amf0Value::Undefined => "undefined",
            Amf0Value::EcmaArray(_) => "ecma-array",
            Amf0Value::Array(_) => "strict-array",
            Amf0Value::Date(..) => "date",
            Amf0Value::LongString(_) => "long-string",
        }
    }
}

/// Compact rendering used when logging received commands
impl fmt::Display for Amf0Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amf0Value::Number(n) => write!(f, "{:.3}", n),
            Amf0Value::Boolean(b) => write!(f, "{}", b),
            Amf0Value::String(s) | Amf0Value::LongString(s) => write!(f, "{:?}", s),
            Amf0Value::Null => f.write_str("<null>"),
            Amf0Value::Undefined => f.write_str("<undefined>"),
            Amf0Value::Date(ms, tz) => write!(f, "<date {} tz {}>", ms, tz),
            Amf0Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Amf0Value::Object(obj) | Amf0Value::EcmaArray(obj) => {
                f.write_str("{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}
