//! Element trait for mapping Rust float types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

/// Trait for types that can be stored in a tile
///
/// # Bounds
/// - `Pod + Zeroable` - tiles and channel traces are reinterpreted as raw
///   bytes when persisted (bytemuck)
/// - `Add + Sub + Mul + Div` - elimination arithmetic (Output = Self)
/// - `PartialOrd` - pivot search
pub trait Element:
    Copy
    + Clone
    + Debug
    + Send
    + Sync
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for norms and error accumulation
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// Absolute value
    fn abs_val(self) -> Self;

    /// True unless the value is NaN or infinite
    fn is_finite_val(self) -> bool;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn abs_val(self) -> Self {
        self.abs()
    }

    #[inline]
    fn is_finite_val(self) -> bool {
        self.is_finite()
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn abs_val(self) -> Self {
        self.abs()
    }

    #[inline]
    fn is_finite_val(self) -> bool {
        self.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiplier<T: Element>(a: T, pivot: T) -> T {
        if pivot.abs_val() > T::zero() { a / pivot } else { T::zero() }
    }

    #[test]
    fn test_elimination_arithmetic() {
        assert_eq!(multiplier(3.0f64, -2.0), -1.5);
        assert_eq!(multiplier(3.0f32, 0.0), 0.0);
        assert_eq!(f32::from_f64(0.5).to_f64(), 0.5);
        assert!(!f64::from_f64(f64::NAN).is_finite_val());
        assert_eq!(<f64 as Element>::DTYPE, DType::F64);
    }
}
