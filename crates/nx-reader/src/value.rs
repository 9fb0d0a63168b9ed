//! Typed view of a node payload.

use std::fmt;

use crate::decode::{self, Payload, Vector};
use crate::node::Bitmap;

/// A node payload decoded according to its type tag.
///
/// References into the string, bitmap, and audio tables are resolved and
/// borrowed from the owning [`NxFile`](crate::NxFile).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue<'a> {
    /// No payload.
    Empty,
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// String (borrowed from the string table).
    String(&'a str),
    /// Coordinate pair.
    Vector(Vector),
    /// Bitmap blob with its two coordinates.
    Bitmap(Bitmap<'a>),
    /// Audio blob.
    Audio(&'a [u8]),
    /// Unrecognized type tag; the raw payload is passed through.
    Unknown { tag: u16, payload: Payload },
}

impl NodeValue<'_> {
    /// Get as integer if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as vector if this is a vector value.
    pub fn as_vector(&self) -> Option<Vector> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpret the payload as a flag, using the NX boolean convention.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Integer(v) => Some(decode::to_bool(v.to_le_bytes()[0])),
            _ => None,
        }
    }
}

impl fmt::Display for NodeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("(empty)"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Vector(v) => write!(f, "{v}"),
            Self::Bitmap(b) => write!(f, "bitmap ({} bytes, {}, {})", b.data.len(), b.x, b.y),
            Self::Audio(a) => write!(f, "audio ({} bytes)", a.len()),
            Self::Unknown { tag, payload } => write!(f, "unknown tag {tag}: {payload:02X?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(NodeValue::Integer(3).as_i64(), Some(3));
        assert_eq!(NodeValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(NodeValue::Float(0.5).as_i64(), None);
        assert_eq!(NodeValue::String("hi").as_str(), Some("hi"));
        assert_eq!(
            NodeValue::Vector(Vector::new(1, 2)).as_vector(),
            Some(Vector::new(1, 2))
        );
        assert_eq!(NodeValue::Empty.as_str(), None);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(NodeValue::Integer(1).as_bool(), Some(true));
        assert_eq!(NodeValue::Integer(2).as_bool(), Some(false));
        assert_eq!(NodeValue::Integer(0).as_bool(), Some(false));
        assert_eq!(NodeValue::Float(1.0).as_bool(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeValue::Integer(-7).to_string(), "-7");
        assert_eq!(NodeValue::String("x").to_string(), "\"x\"");
        assert_eq!(NodeValue::Audio(&[0; 3]).to_string(), "audio (3 bytes)");
        assert_eq!(
            NodeValue::Unknown {
                tag: 9,
                payload: [0xAB, 0, 0, 0, 0, 0, 0, 1]
            }
            .to_string(),
            "unknown tag 9: [AB, 00, 00, 00, 00, 00, 00, 01]"
        );
    }
}
