//! Pixel and table field encodings.
//!
//! Maps the label keywords `ByteOrder` and `Type` to a concrete numeric
//! representation and reads raw values out of byte buffers.

use isis_common::{IsisError, IsisResult};

/// Byte order keyword (`Lsb`, `Msb`, `NoByteOrder`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Lsb,
    Msb,
    /// Host byte order.
    Native,
}

impl ByteOrder {
    pub fn from_label(s: &str) -> IsisResult<Self> {
        match s {
            "Lsb" => Ok(ByteOrder::Lsb),
            "Msb" => Ok(ByteOrder::Msb),
            "NoByteOrder" => Ok(ByteOrder::Native),
            other => Err(IsisError::unsupported(format!("byte order `{}`", other))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ByteOrder::Lsb => "Lsb",
            ByteOrder::Msb => "Msb",
            ByteOrder::Native => "NoByteOrder",
        }
    }

    fn is_little(&self) -> bool {
        match self {
            ByteOrder::Lsb => true,
            ByteOrder::Msb => false,
            ByteOrder::Native => cfg!(target_endian = "little"),
        }
    }
}

/// Numeric type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    UnsignedByte,
    SignedByte,
    UnsignedWord,
    SignedWord,
    UnsignedInteger,
    SignedInteger,
    Real,
    Double,
}

impl NumericType {
    /// Parse a `Type` keyword. `Integer` is an alias of `SignedInteger`.
    pub fn from_label(s: &str) -> IsisResult<Self> {
        match s {
            "UnsignedByte" => Ok(NumericType::UnsignedByte),
            "SignedByte" => Ok(NumericType::SignedByte),
            "UnsignedWord" => Ok(NumericType::UnsignedWord),
            "SignedWord" => Ok(NumericType::SignedWord),
            "UnsignedInteger" => Ok(NumericType::UnsignedInteger),
            "SignedInteger" | "Integer" => Ok(NumericType::SignedInteger),
            "Real" => Ok(NumericType::Real),
            "Double" => Ok(NumericType::Double),
            other => Err(IsisError::unsupported(format!("pixel type `{}`", other))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NumericType::UnsignedByte => "UnsignedByte",
            NumericType::SignedByte => "SignedByte",
            NumericType::UnsignedWord => "UnsignedWord",
            NumericType::SignedWord => "SignedWord",
            NumericType::UnsignedInteger => "UnsignedInteger",
            NumericType::SignedInteger => "SignedInteger",
            NumericType::Real => "Real",
            NumericType::Double => "Double",
        }
    }

    /// Size of one value in bytes.
    pub fn item_size(&self) -> usize {
        match self {
            NumericType::UnsignedByte | NumericType::SignedByte => 1,
            NumericType::UnsignedWord | NumericType::SignedWord => 2,
            NumericType::UnsignedInteger | NumericType::SignedInteger | NumericType::Real => 4,
            NumericType::Double => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumericType::Real | NumericType::Double)
    }

    /// Lowest representable value.
    pub fn min_value(&self) -> f64 {
        match self {
            NumericType::UnsignedByte => u8::MIN as f64,
            NumericType::SignedByte => i8::MIN as f64,
            NumericType::UnsignedWord => u16::MIN as f64,
            NumericType::SignedWord => i16::MIN as f64,
            NumericType::UnsignedInteger => u32::MIN as f64,
            NumericType::SignedInteger => i32::MIN as f64,
            NumericType::Real => f32::MIN as f64,
            NumericType::Double => f64::MIN,
        }
    }

    /// Highest representable value.
    pub fn max_value(&self) -> f64 {
        match self {
            NumericType::UnsignedByte => u8::MAX as f64,
            NumericType::SignedByte => i8::MAX as f64,
            NumericType::UnsignedWord => u16::MAX as f64,
            NumericType::SignedWord => i16::MAX as f64,
            NumericType::UnsignedInteger => u32::MAX as f64,
            NumericType::SignedInteger => i32::MAX as f64,
            NumericType::Real => f32::MAX as f64,
            NumericType::Double => f64::MAX,
        }
    }

    /// Read one value from the start of `bytes`.
    ///
    /// `bytes` must hold at least `item_size()` bytes.
    pub fn read(&self, bytes: &[u8], order: ByteOrder) -> f64 {
        let little = order.is_little();

        macro_rules! read_as {
            ($t:ty, $n:expr) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&bytes[..$n]);
                if little {
                    <$t>::from_le_bytes(buf) as f64
                } else {
                    <$t>::from_be_bytes(buf) as f64
                }
            }};
        }

        match self {
            NumericType::UnsignedByte => bytes[0] as f64,
            NumericType::SignedByte => bytes[0] as i8 as f64,
            NumericType::UnsignedWord => read_as!(u16, 2),
            NumericType::SignedWord => read_as!(i16, 2),
            NumericType::UnsignedInteger => read_as!(u32, 4),
            NumericType::SignedInteger => read_as!(i32, 4),
            NumericType::Real => read_as!(f32, 4),
            NumericType::Double => read_as!(f64, 8),
        }
    }

    /// Decode a whole buffer of packed values.
    pub fn read_all(&self, bytes: &[u8], order: ByteOrder) -> Vec<f64> {
        bytes
            .chunks_exact(self.item_size())
            .map(|chunk| self.read(chunk, order))
            .collect()
    }
}

/// Encode `values` with the given type and order. Values are cast with `as`.
pub fn encode(values: &[f64], kind: NumericType, order: ByteOrder) -> Vec<u8> {
    let little = order.is_little();
    let mut out = Vec::with_capacity(values.len() * kind.item_size());

    macro_rules! write_as {
        ($v:expr, $t:ty) => {{
            let v = $v as $t;
            if little {
                out.extend_from_slice(&v.to_le_bytes());
            } else {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }};
    }

    for &v in values {
        match kind {
            NumericType::UnsignedByte => write_as!(v, u8),
            NumericType::SignedByte => write_as!(v, i8),
            NumericType::UnsignedWord => write_as!(v, u16),
            NumericType::SignedWord => write_as!(v, i16),
            NumericType::UnsignedInteger => write_as!(v, u32),
            NumericType::SignedInteger => write_as!(v, i32),
            NumericType::Real => write_as!(v, f32),
            NumericType::Double => write_as!(v, f64),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label() {
        assert_eq!(NumericType::from_label("Integer").unwrap(), NumericType::SignedInteger);
        assert_eq!(NumericType::from_label("Real").unwrap().item_size(), 4);
        assert!(matches!(
            NumericType::from_label("Complex"),
            Err(IsisError::UnsupportedFormat(_))
        ));
        assert_eq!(ByteOrder::from_label("Msb").unwrap(), ByteOrder::Msb);
        assert!(ByteOrder::from_label("Middle").is_err());
    }

    #[test]
    fn test_read_byte_orders() {
        let le = [0x34, 0x12];
        let be = [0x12, 0x34];
        assert_eq!(NumericType::UnsignedWord.read(&le, ByteOrder::Lsb), 4660.0);
        assert_eq!(NumericType::UnsignedWord.read(&be, ByteOrder::Msb), 4660.0);
        assert_eq!(NumericType::SignedByte.read(&[0xff], ByteOrder::Lsb), -1.0);
    }

    #[test]
    fn test_float_limits() {
        assert_eq!(NumericType::Real.min_value(), f32::MIN as f64);
        assert!(NumericType::Real.is_float());
        assert!(!NumericType::SignedWord.is_float());
    }

    #[test]
    fn test_encode_then_read() {
        let values = [-2.5, 0.0, 1.0e6];
        for order in [ByteOrder::Lsb, ByteOrder::Msb] {
            let bytes = encode(&values, NumericType::Real, order);
            assert_eq!(NumericType::Real.read_all(&bytes, order), values.to_vec());
        }
    }
}
