use std::fmt::{Display, Formatter};

use ferrofits_error::{FitsError, FitsResult, fits_bail, fits_err};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::ValueType;

/// Datatype codes exchanged with the transport, numbered like CFITSIO's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum TypeCode {
    /// `TBIT`
    Bit = 1,
    /// `TBYTE`
    Byte = 11,
    /// `TSBYTE`
    SByte = 12,
    /// `TLOGICAL`
    Logical = 14,
    /// `TSTRING`
    String = 16,
    /// `TUSHORT`
    UShort = 20,
    /// `TSHORT`
    Short = 21,
    /// `TUINT`
    UInt = 30,
    /// `TINT`
    Int = 31,
    /// `TULONG`
    ULong = 40,
    /// `TLONG`
    Long = 41,
    /// `TFLOAT`
    Float = 42,
    /// `TULONGLONG`
    ULongLong = 80,
    /// `TLONGLONG`
    LongLong = 81,
    /// `TDOUBLE`
    Double = 82,
    /// `TCOMPLEX`
    Complex = 83,
    /// `TDBLCOMPLEX`
    DblComplex = 163,
}

impl TypeCode {
    /// The value type exchanged under this code.
    ///
    /// `TLONG` and `TULONG` are 64-bit wide. `TBIT` has no value type.
    pub fn value_type(self) -> FitsResult<ValueType> {
        Ok(match self {
            TypeCode::Logical => ValueType::Bool,
            TypeCode::SByte => ValueType::I8,
            TypeCode::Byte => ValueType::U8,
            TypeCode::Short => ValueType::I16,
            TypeCode::UShort => ValueType::U16,
            TypeCode::Int => ValueType::I32,
            TypeCode::UInt => ValueType::U32,
            TypeCode::Long | TypeCode::LongLong => ValueType::I64,
            TypeCode::ULong | TypeCode::ULongLong => ValueType::U64,
            TypeCode::Float => ValueType::F32,
            TypeCode::Double => ValueType::F64,
            TypeCode::Complex => ValueType::C32,
            TypeCode::DblComplex => ValueType::C64,
            TypeCode::String => ValueType::Str,
            TypeCode::Bit => fits_bail!(UnsupportedType: "bit columns are not supported"),
        })
    }

    /// Parses a raw code.
    pub fn from_raw(code: i32) -> FitsResult<Self> {
        Self::try_from(code).map_err(|_| fits_err!(UnsupportedType: "unknown datatype code {}", code))
    }
}

impl Display for TypeCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeCode::Bit => "TBIT",
            TypeCode::Byte => "TBYTE",
            TypeCode::SByte => "TSBYTE",
            TypeCode::Logical => "TLOGICAL",
            TypeCode::String => "TSTRING",
            TypeCode::UShort => "TUSHORT",
            TypeCode::Short => "TSHORT",
            TypeCode::UInt => "TUINT",
            TypeCode::Int => "TINT",
            TypeCode::ULong => "TULONG",
            TypeCode::Long => "TLONG",
            TypeCode::Float => "TFLOAT",
            TypeCode::ULongLong => "TULONGLONG",
            TypeCode::LongLong => "TLONGLONG",
            TypeCode::Double => "TDOUBLE",
            TypeCode::Complex => "TCOMPLEX",
            TypeCode::DblComplex => "TDBLCOMPLEX",
        };
        write!(f, "{}({})", name, i32::from(*self))
    }
}

/// The bit depth of image pixels, as stored in the `BITPIX` keyword.
///
/// The unsigned and signed-byte depths are the non-standard codes recognized by CFITSIO, which
/// maps them to offset integers on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum Bitpix {
    /// `BYTE_IMG`
    U8 = 8,
    /// `SBYTE_IMG`
    I8 = 10,
    /// `SHORT_IMG`
    I16 = 16,
    /// `USHORT_IMG`
    U16 = 20,
    /// `LONG_IMG`
    I32 = 32,
    /// `ULONG_IMG`
    U32 = 40,
    /// `LONGLONG_IMG`
    I64 = 64,
    /// `ULONGLONG_IMG`
    U64 = 80,
    /// `FLOAT_IMG`
    F32 = -32,
    /// `DOUBLE_IMG`
    F64 = -64,
}

impl Bitpix {
    /// The pixel value type of this bit depth.
    pub const fn value_type(self) -> ValueType {
        match self {
            Bitpix::U8 => ValueType::U8,
            Bitpix::I8 => ValueType::I8,
            Bitpix::I16 => ValueType::I16,
            Bitpix::U16 => ValueType::U16,
            Bitpix::I32 => ValueType::I32,
            Bitpix::U32 => ValueType::U32,
            Bitpix::I64 => ValueType::I64,
            Bitpix::U64 => ValueType::U64,
            Bitpix::F32 => ValueType::F32,
            Bitpix::F64 => ValueType::F64,
        }
    }

    /// The width in bytes of one pixel.
    pub const fn byte_width(self) -> usize {
        self.value_type().byte_width()
    }

    /// Parses a raw `BITPIX` value.
    pub fn from_raw(bitpix: i32) -> FitsResult<Self> {
        Self::try_from(bitpix).map_err(|_| fits_err!(UnsupportedType: "unknown BITPIX {}", bitpix))
    }
}

impl TryFrom<ValueType> for Bitpix {
    type Error = FitsError;

    fn try_from(value: ValueType) -> Result<Self, Self::Error> {
        value.bitpix()
    }
}

impl Display for Bitpix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", i32::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TypeCode::Bit, 1)]
    #[case(TypeCode::Logical, 14)]
    #[case(TypeCode::String, 16)]
    #[case(TypeCode::Int, 31)]
    #[case(TypeCode::LongLong, 81)]
    #[case(TypeCode::DblComplex, 163)]
    fn raw_codes(#[case] code: TypeCode, #[case] raw: i32) {
        assert_eq!(i32::from(code), raw);
        assert_eq!(TypeCode::from_raw(raw).unwrap(), code);
    }

    #[rstest]
    #[case(8, ValueType::U8)]
    #[case(10, ValueType::I8)]
    #[case(20, ValueType::U16)]
    #[case(-32, ValueType::F32)]
    #[case(-64, ValueType::F64)]
    #[case(80, ValueType::U64)]
    fn bitpix_value_types(#[case] raw: i32, #[case] vt: ValueType) {
        let bitpix = Bitpix::from_raw(raw).unwrap();
        assert_eq!(bitpix.value_type(), vt);
        assert_eq!(Bitpix::try_from(vt).unwrap(), bitpix);
    }

    #[test]
    fn unknown_codes() {
        assert!(Bitpix::from_raw(12).is_err());
        assert!(TypeCode::from_raw(0).is_err());
        assert!(TypeCode::Bit.value_type().is_err());
    }

    #[test]
    fn long_maps_to_64_bits() {
        assert_eq!(TypeCode::Long.value_type().unwrap(), ValueType::I64);
        assert_eq!(TypeCode::ULong.value_type().unwrap(), ValueType::U64);
        assert_eq!(TypeCode::Long.to_string(), "TLONG(41)");
    }
}
