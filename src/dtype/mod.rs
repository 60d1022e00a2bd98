//! Element types for mesh tiles
//!
//! Tiles, channel payloads and trace files all use the matrix's native
//! floating-point width. There is no mixed precision anywhere in a sweep.

mod element;

pub use element::Element;

use std::fmt;

/// Floating-point widths a tile can hold
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 64-bit IEEE 754
    F64,
    /// 32-bit IEEE 754
    F32,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 => 8,
            Self::F32 => 4,
        }
    }

    /// Machine epsilon of this width
    #[inline]
    pub const fn epsilon(self) -> f64 {
        match self {
            Self::F64 => f64::EPSILON,
            Self::F32 => f32::EPSILON as f64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F64 => write!(f, "f64"),
            Self::F32 => write!(f, "f32"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(<f32 as Element>::DTYPE.size_in_bytes(), size_of::<f32>());
        assert_eq!(<f64 as Element>::DTYPE.size_in_bytes(), size_of::<f64>());
    }

    #[test]
    fn test_dtype_display() {
        assert_eq!(DType::F64.to_string(), "f64");
        assert_eq!(DType::F32.to_string(), "f32");
    }
}
