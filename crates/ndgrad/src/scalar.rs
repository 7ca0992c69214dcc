//! Scalar trait for tensor element types and the runtime dtype tag.

use crate::data::TensorData;
use crate::error::TensorError;
use crate::tensor::DenseTensor;
use std::fmt::{self, Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

pub use faer::{c32, c64};

/// Numeric representation of a tensor.
///
/// The names follow the usual array-library convention: `Complex64` stores
/// two `f32` components, `Complex128` two `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DType {
    /// Standard floating-point representation.
    #[default]
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl DType {
    /// Check if this representation is complex-valued.
    pub fn is_complex(self) -> bool {
        matches!(self, DType::Complex64 | DType::Complex128)
    }

    /// Canonical name (`"float32"`, `"complex128"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
        }
    }

    /// Smallest representation able to hold values of both `self` and `other`.
    ///
    /// ```
    /// use ndgrad::DType;
    ///
    /// assert_eq!(DType::Float32.promote(DType::Float64), DType::Float64);
    /// assert_eq!(DType::Float64.promote(DType::Complex64), DType::Complex128);
    /// ```
    pub fn promote(self, other: DType) -> DType {
        let wide = self.is_double() || other.is_double();
        match (self.is_complex() || other.is_complex(), wide) {
            (false, false) => DType::Float32,
            (false, true) => DType::Float64,
            (true, false) => DType::Complex64,
            (true, true) => DType::Complex128,
        }
    }

    fn is_double(self) -> bool {
        matches!(self, DType::Float64 | DType::Complex128)
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "float" | "f32" => Ok(DType::Float32),
            "float64" | "double" | "f64" => Ok(DType::Float64),
            "complex64" | "cfloat" | "c32" => Ok(DType::Complex64),
            "complex128" | "cdouble" | "c64" => Ok(DType::Complex128),
            other => Err(TensorError::UnknownDType(other.to_string())),
        }
    }
}

/// Trait for scalar types supported by ndgrad.
///
/// Every scalar converts losslessly into `c64`; converting back into a real
/// type keeps the real part only.
pub trait Scalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Runtime tag of this element type.
    const DTYPE: DType;

    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Complex conjugate (identity for real types).
    fn conj(self) -> Self;

    fn exp(self) -> Self;

    fn sin(self) -> Self;

    fn cos(self) -> Self;

    /// Widen into `c64`.
    fn to_c64(self) -> c64;

    /// Narrow from `c64`, dropping the imaginary part for real types.
    fn from_c64(z: c64) -> Self;

    fn from_f64(x: f64) -> Self {
        Self::from_c64(c64::new(x, 0.0))
    }

    fn powi(self, n: i32) -> Self;

    /// Wrap a typed tensor into the dtype-erased enum.
    fn into_data(tensor: DenseTensor<Self>) -> TensorData;

    /// Borrow the typed tensor if `data` holds this element type.
    fn from_data(data: &TensorData) -> Option<&DenseTensor<Self>>;
}

macro_rules! impl_real_scalar {
    ($t:ty, $dtype:ident) => {
        impl Scalar for $t {
            const DTYPE: DType = DType::$dtype;

            fn one() -> Self {
                1.0
            }

            fn conj(self) -> Self {
                self
            }

            fn exp(self) -> Self {
                <$t>::exp(self)
            }

            fn sin(self) -> Self {
                <$t>::sin(self)
            }

            fn cos(self) -> Self {
                <$t>::cos(self)
            }

            fn powi(self, n: i32) -> Self {
                <$t>::powi(self, n)
            }

            fn to_c64(self) -> c64 {
                c64::new(self as f64, 0.0)
            }

            fn from_c64(z: c64) -> Self {
                z.re as $t
            }

            fn into_data(tensor: DenseTensor<Self>) -> TensorData {
                TensorData::$dtype(tensor)
            }

            fn from_data(data: &TensorData) -> Option<&DenseTensor<Self>> {
                match data {
                    TensorData::$dtype(t) => Some(t),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_complex_scalar {
    ($t:ty, $re:ty, $dtype:ident) => {
        impl Scalar for $t {
            const DTYPE: DType = DType::$dtype;

            fn one() -> Self {
                <$t>::new(1.0, 0.0)
            }

            fn conj(self) -> Self {
                <$t>::conj(&self)
            }

            fn exp(self) -> Self {
                <$t>::exp(self)
            }

            fn sin(self) -> Self {
                <$t>::sin(self)
            }

            fn cos(self) -> Self {
                <$t>::cos(self)
            }

            fn powi(self, n: i32) -> Self {
                <$t>::powi(&self, n)
            }

            fn to_c64(self) -> c64 {
                c64::new(self.re as f64, self.im as f64)
            }

            fn from_c64(z: c64) -> Self {
                <$t>::new(z.re as $re, z.im as $re)
            }

            fn into_data(tensor: DenseTensor<Self>) -> TensorData {
                TensorData::$dtype(tensor)
            }

            fn from_data(data: &TensorData) -> Option<&DenseTensor<Self>> {
                match data {
                    TensorData::$dtype(t) => Some(t),
                    _ => None,
                }
            }
        }
    };
}

impl_real_scalar!(f32, Float32);
impl_real_scalar!(f64, Float64);
impl_complex_scalar!(c32, f32, Complex64);
impl_complex_scalar!(c64, f64, Complex128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_is_complex() {
        assert!(!DType::Float32.is_complex());
        assert!(!DType::Float64.is_complex());
        assert!(DType::Complex64.is_complex());
        assert!(DType::Complex128.is_complex());
    }

    #[test]
    fn test_dtype_default_is_float32() {
        assert_eq!(DType::default(), DType::Float32);
    }

    #[test]
    fn test_dtype_parse() {
        assert_eq!("float64".parse::<DType>().unwrap(), DType::Float64);
        assert_eq!(" Double ".parse::<DType>().unwrap(), DType::Float64);
        assert_eq!("complex64".parse::<DType>().unwrap(), DType::Complex64);
        assert_eq!("c64".parse::<DType>().unwrap(), DType::Complex128);
        assert!("int8".parse::<DType>().is_err());
    }

    #[test]
    fn test_dtype_promote() {
        assert_eq!(DType::Float32.promote(DType::Float32), DType::Float32);
        assert_eq!(DType::Complex64.promote(DType::Float32), DType::Complex64);
        assert_eq!(DType::Complex64.promote(DType::Float64), DType::Complex128);
    }

    #[test]
    fn test_zero_one() {
        assert_eq!(f64::zero(), 0.0);
        assert_eq!(f64::one(), 1.0);
        assert_eq!(c64::zero(), c64::new(0.0, 0.0));
        assert_eq!(c64::one(), c64::new(1.0, 0.0));
    }

    #[test]
    fn test_conj() {
        assert_eq!(Scalar::conj(2.5f64), 2.5);
        assert_eq!(Scalar::conj(c64::new(1.0, 2.0)), c64::new(1.0, -2.0));
    }

    #[test]
    fn test_complex_exp() {
        // e^{i pi} = -1
        let z = Scalar::exp(c64::new(0.0, std::f64::consts::PI));
        assert!((z.re + 1.0).abs() < 1e-12);
        assert!(z.im.abs() < 1e-12);
    }

    #[test]
    fn test_complex_sin_cos() {
        // sin^2 + cos^2 = 1 off the real axis too
        let z = c64::new(0.3, -1.7);
        let s = Scalar::sin(z);
        let c = Scalar::cos(z);
        let one = s * s + c * c;
        assert!((one.re - 1.0).abs() < 1e-12);
        assert!(one.im.abs() < 1e-12);
    }

    #[test]
    fn test_powi() {
        assert_eq!(2.0f64.powi(3), 8.0);
        assert_eq!(Scalar::powi(2.0f64, -2), 0.25);
        assert_eq!(Scalar::powi(c64::new(0.0, 1.0), 2), c64::new(-1.0, 0.0));
        assert_eq!(Scalar::powi(c64::new(3.0, 1.0), 0), c64::one());
    }

    #[test]
    fn test_from_c64_drops_imaginary_for_reals() {
        assert_eq!(f32::from_c64(c64::new(1.5, 2.0)), 1.5);
        assert_eq!(c32::from_c64(c64::new(1.5, 2.0)), c32::new(1.5, 2.0));
    }
}
