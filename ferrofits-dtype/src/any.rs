use std::fmt::{Display, Formatter};

use ferrofits_error::{FitsError, FitsResult, fits_err};
use num_complex::{Complex, Complex32, Complex64};
use num_traits::{Float, NumCast};

use crate::{NativeValue, ValueType};

/// An owned scalar of any value type.
///
/// Used where the type of a value is only known at run time, e.g. when parsing a header record
/// without knowing its type in advance.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    /// A logical value
    Bool(bool),
    /// A signed byte
    I8(i8),
    /// An unsigned byte
    U8(u8),
    /// A 16-bit signed integer
    I16(i16),
    /// A 16-bit unsigned integer
    U16(u16),
    /// A 32-bit signed integer
    I32(i32),
    /// A 32-bit unsigned integer
    U32(u32),
    /// A 64-bit signed integer
    I64(i64),
    /// A 64-bit unsigned integer
    U64(u64),
    /// A single-precision real
    F32(f32),
    /// A double-precision real
    F64(f64),
    /// A single-precision complex number
    C32(Complex32),
    /// A double-precision complex number
    C64(Complex64),
    /// A string
    Str(String),
}

impl AnyValue {
    /// The value type of the wrapped value.
    pub fn value_type(&self) -> ValueType {
        match self {
            AnyValue::Bool(_) => ValueType::Bool,
            AnyValue::I8(_) => ValueType::I8,
            AnyValue::U8(_) => ValueType::U8,
            AnyValue::I16(_) => ValueType::I16,
            AnyValue::U16(_) => ValueType::U16,
            AnyValue::I32(_) => ValueType::I32,
            AnyValue::U32(_) => ValueType::U32,
            AnyValue::I64(_) => ValueType::I64,
            AnyValue::U64(_) => ValueType::U64,
            AnyValue::F32(_) => ValueType::F32,
            AnyValue::F64(_) => ValueType::F64,
            AnyValue::C32(_) => ValueType::C32,
            AnyValue::C64(_) => ValueType::C64,
            AnyValue::Str(_) => ValueType::Str,
        }
    }

    /// Casts to a native type, see the `TryFrom` implementations for the rules.
    pub fn cast<T: TryFrom<AnyValue, Error = FitsError>>(self) -> FitsResult<T> {
        T::try_from(self)
    }

    /// Casts to a real number type.
    ///
    /// Booleans count as 0 or 1, complex numbers are accepted when their imaginary part is zero.
    /// Floating point values are accepted as integers only when they have no fractional part.
    fn cast_real<T: NumCast + NativeValue>(self) -> FitsResult<T> {
        if T::VALUE_TYPE.is_int() && self.real_part().is_some_and(|real| real.fract() != 0.0) {
            return Err(fits_err!(
                "{} value {} is not an integer and cannot be cast to {}",
                self.value_type(),
                self,
                T::VALUE_TYPE
            ));
        }
        let cast = match &self {
            AnyValue::Bool(v) => <T as NumCast>::from(<u8 as From<bool>>::from(*v)),
            AnyValue::I8(v) => <T as NumCast>::from(*v),
            AnyValue::U8(v) => <T as NumCast>::from(*v),
            AnyValue::I16(v) => <T as NumCast>::from(*v),
            AnyValue::U16(v) => <T as NumCast>::from(*v),
            AnyValue::I32(v) => <T as NumCast>::from(*v),
            AnyValue::U32(v) => <T as NumCast>::from(*v),
            AnyValue::I64(v) => <T as NumCast>::from(*v),
            AnyValue::U64(v) => <T as NumCast>::from(*v),
            AnyValue::F32(v) => <T as NumCast>::from(*v),
            AnyValue::F64(v) => <T as NumCast>::from(*v),
            AnyValue::C32(v) if v.im == 0.0 => <T as NumCast>::from(v.re),
            AnyValue::C64(v) if v.im == 0.0 => <T as NumCast>::from(v.re),
            _ => {
                return Err(fits_err!(
                    UnsupportedType: "cannot convert {} value {} to {}",
                    self.value_type(),
                    self,
                    T::VALUE_TYPE
                ));
            }
        };
        cast.ok_or_else(|| {
            fits_err!(
                "{} value {} cannot be represented as {}",
                self.value_type(),
                self,
                T::VALUE_TYPE
            )
        })
    }

    /// The value of a floating point or complex number, as a double.
    fn real_part(&self) -> Option<f64> {
        match self {
            AnyValue::F32(v) => Some(<f64 as From<f32>>::from(*v)),
            AnyValue::F64(v) => Some(*v),
            AnyValue::C32(v) => Some(<f64 as From<f32>>::from(v.re)),
            AnyValue::C64(v) => Some(v.re),
            _ => None,
        }
    }

    /// Casts to a complex number type. Real numbers get a zero imaginary part.
    fn cast_complex<T: Float + NativeValue>(self) -> FitsResult<Complex<T>> {
        let parts = match &self {
            AnyValue::C32(v) => (<T as NumCast>::from(v.re), <T as NumCast>::from(v.im)),
            AnyValue::C64(v) => (<T as NumCast>::from(v.re), <T as NumCast>::from(v.im)),
            AnyValue::Str(_) | AnyValue::Bool(_) => {
                return Err(fits_err!(
                    UnsupportedType: "cannot convert {} value {} to a complex number",
                    self.value_type(),
                    self
                ));
            }
            _ => (Some(self.clone().cast_real::<T>()?), Some(T::zero())),
        };
        match parts {
            (Some(re), Some(im)) => Ok(Complex::new(re, im)),
            _ => Err(fits_err!("{} cannot be represented as a complex number", self)),
        }
    }
}

impl Display for AnyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyValue::Bool(v) => write!(f, "{v}"),
            AnyValue::I8(v) => write!(f, "{v}"),
            AnyValue::U8(v) => write!(f, "{v}"),
            AnyValue::I16(v) => write!(f, "{v}"),
            AnyValue::U16(v) => write!(f, "{v}"),
            AnyValue::I32(v) => write!(f, "{v}"),
            AnyValue::U32(v) => write!(f, "{v}"),
            AnyValue::I64(v) => write!(f, "{v}"),
            AnyValue::U64(v) => write!(f, "{v}"),
            AnyValue::F32(v) => write!(f, "{v}"),
            AnyValue::F64(v) => write!(f, "{v}"),
            AnyValue::C32(v) => write!(f, "({}, {})", v.re, v.im),
            AnyValue::C64(v) => write!(f, "({}, {})", v.re, v.im),
            AnyValue::Str(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! from_native {
    ($($T:ty),*) => {
        $(
            impl From<$T> for AnyValue {
                fn from(value: $T) -> Self {
                    value.into_any()
                }
            }
        )*
    };
}

from_native!(
    bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, Complex32, Complex64, String
);

impl From<&str> for AnyValue {
    fn from(value: &str) -> Self {
        AnyValue::Str(value.to_string())
    }
}

macro_rules! real_from_any {
    ($($T:ty),*) => {
        $(
            impl TryFrom<AnyValue> for $T {
                type Error = FitsError;

                fn try_from(value: AnyValue) -> FitsResult<Self> {
                    value.cast_real::<$T>()
                }
            }
        )*
    };
}

real_from_any!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl TryFrom<AnyValue> for Complex32 {
    type Error = FitsError;

    fn try_from(value: AnyValue) -> FitsResult<Self> {
        value.cast_complex::<f32>()
    }
}

impl TryFrom<AnyValue> for Complex64 {
    type Error = FitsError;

    fn try_from(value: AnyValue) -> FitsResult<Self> {
        value.cast_complex::<f64>()
    }
}

impl TryFrom<AnyValue> for bool {
    type Error = FitsError;

    fn try_from(value: AnyValue) -> FitsResult<Self> {
        match value {
            AnyValue::Bool(v) => Ok(v),
            other => Err(fits_err!(
                UnsupportedType: "cannot convert {} value {} to bool",
                other.value_type(),
                other
            )),
        }
    }
}

/// Any value can be read as a string: non-string values are rendered as text.
impl TryFrom<AnyValue> for String {
    type Error = FitsError;

    fn try_from(value: AnyValue) -> FitsResult<Self> {
        Ok(match value {
            AnyValue::Str(v) => v,
            other => other.to_string(),
        })
    }
}
