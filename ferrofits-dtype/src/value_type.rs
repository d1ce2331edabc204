use std::fmt::{Display, Formatter};

use ferrofits_error::{FitsResult, fits_bail};

use crate::{Bitpix, TypeCode};

/// The value types which can be stored in header records, image pixels or table cells.
///
/// This is the run-time mirror of the [`NativeValue`](crate::NativeValue) trait family: each
/// variant corresponds to exactly one native Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `Complex<f32>`
    C32,
    /// `Complex<f64>`
    C64,
    /// `String`
    Str,
}

impl ValueType {
    /// Every value type, in declaration order.
    pub const ALL: [ValueType; 14] = [
        ValueType::Bool,
        ValueType::I8,
        ValueType::U8,
        ValueType::I16,
        ValueType::U16,
        ValueType::I32,
        ValueType::U32,
        ValueType::I64,
        ValueType::U64,
        ValueType::F32,
        ValueType::F64,
        ValueType::C32,
        ValueType::C64,
        ValueType::Str,
    ];

    /// Returns `true` iff this value type is an integer
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Returns `true` iff this value type is a signed integer
    pub const fn is_signed_int(self) -> bool {
        matches!(
            self,
            ValueType::I8 | ValueType::I16 | ValueType::I32 | ValueType::I64
        )
    }

    /// Returns `true` iff this value type is an unsigned integer
    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64
        )
    }

    /// Returns `true` iff this value type is a real floating-point number
    pub const fn is_float(self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }

    /// Returns `true` iff this value type is a complex number
    pub const fn is_complex(self) -> bool {
        matches!(self, ValueType::C32 | ValueType::C64)
    }

    /// Returns `true` iff this value type is a number, real or complex
    pub const fn is_numeric(self) -> bool {
        self.is_int() || self.is_float() || self.is_complex()
    }

    /// Returns `true` iff this value type can be stored as image pixels
    pub const fn is_pixel(self) -> bool {
        self.is_int() || self.is_float()
    }

    /// The width in bytes of one element on the wire.
    ///
    /// Strings are counted one byte per character.
    pub const fn byte_width(self) -> usize {
        match self {
            ValueType::Bool | ValueType::I8 | ValueType::U8 | ValueType::Str => 1,
            ValueType::I16 | ValueType::U16 => 2,
            ValueType::I32 | ValueType::U32 | ValueType::F32 => 4,
            ValueType::I64 | ValueType::U64 | ValueType::F64 | ValueType::C32 => 8,
            ValueType::C64 => 16,
        }
    }

    /// The datatype code of this value type.
    ///
    /// Records, pixels and cells of a given value type share the same code.
    pub const fn type_code(self) -> TypeCode {
        match self {
            ValueType::Bool => TypeCode::Logical,
            ValueType::I8 => TypeCode::SByte,
            ValueType::U8 => TypeCode::Byte,
            ValueType::I16 => TypeCode::Short,
            ValueType::U16 => TypeCode::UShort,
            ValueType::I32 => TypeCode::Int,
            ValueType::U32 => TypeCode::UInt,
            ValueType::I64 => TypeCode::LongLong,
            ValueType::U64 => TypeCode::ULongLong,
            ValueType::F32 => TypeCode::Float,
            ValueType::F64 => TypeCode::Double,
            ValueType::C32 => TypeCode::Complex,
            ValueType::C64 => TypeCode::DblComplex,
            ValueType::Str => TypeCode::String,
        }
    }

    /// The code used for header records. Every value type has one.
    pub const fn record_code(self) -> TypeCode {
        self.type_code()
    }

    /// The code used for table columns. Every value type has one.
    pub const fn column_code(self) -> TypeCode {
        self.type_code()
    }

    /// The code used for image pixels, only defined for real numbers.
    pub fn pixel_code(self) -> FitsResult<TypeCode> {
        if !self.is_pixel() {
            fits_bail!(UnsupportedType: "{} cannot be used as an image pixel type", self);
        }
        Ok(self.type_code())
    }

    /// The image bit depth, only defined for real numbers.
    pub fn bitpix(self) -> FitsResult<Bitpix> {
        Ok(match self {
            ValueType::I8 => Bitpix::I8,
            ValueType::U8 => Bitpix::U8,
            ValueType::I16 => Bitpix::I16,
            ValueType::U16 => Bitpix::U16,
            ValueType::I32 => Bitpix::I32,
            ValueType::U32 => Bitpix::U32,
            ValueType::I64 => Bitpix::I64,
            ValueType::U64 => Bitpix::U64,
            ValueType::F32 => Bitpix::F32,
            ValueType::F64 => Bitpix::F64,
            _ => fits_bail!(UnsupportedType: "{} has no image bit depth", self),
        })
    }

    /// The binary table format letter.
    pub const fn tform_char(self) -> char {
        match self {
            ValueType::Bool => 'L',
            ValueType::I8 => 'S',
            ValueType::U8 => 'B',
            ValueType::I16 => 'I',
            ValueType::U16 => 'U',
            ValueType::I32 => 'J',
            ValueType::U32 => 'V',
            ValueType::I64 => 'K',
            ValueType::U64 => 'W',
            ValueType::F32 => 'E',
            ValueType::F64 => 'D',
            ValueType::C32 => 'C',
            ValueType::C64 => 'M',
            ValueType::Str => 'A',
        }
    }

    /// The value type stored under a binary table format letter.
    pub fn from_tform_char(letter: char) -> FitsResult<Self> {
        Ok(match letter {
            'L' => ValueType::Bool,
            'S' => ValueType::I8,
            'B' => ValueType::U8,
            'I' => ValueType::I16,
            'U' => ValueType::U16,
            'J' => ValueType::I32,
            'V' => ValueType::U32,
            'K' => ValueType::I64,
            'W' => ValueType::U64,
            'E' => ValueType::F32,
            'D' => ValueType::F64,
            'C' => ValueType::C32,
            'M' => ValueType::C64,
            'A' => ValueType::Str,
            _ => fits_bail!(UnsupportedType: "unknown column format letter '{}'", letter),
        })
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::I8 => write!(f, "i8"),
            Self::U8 => write!(f, "u8"),
            Self::I16 => write!(f, "i16"),
            Self::U16 => write!(f, "u16"),
            Self::I32 => write!(f, "i32"),
            Self::U32 => write!(f, "u32"),
            Self::I64 => write!(f, "i64"),
            Self::U64 => write!(f, "u64"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::C32 => write!(f, "c32"),
            Self::C64 => write!(f, "c64"),
            Self::Str => write!(f, "string"),
        }
    }
}

/// Dispatches on a [`ValueType`], binding the matching native type to the given identifier.
///
/// ```
/// use ferrofits_dtype::{ValueType, match_each_value_type};
///
/// let width = match_each_value_type!(ValueType::I16, |T| { std::mem::size_of::<T>() });
/// assert_eq!(width, 2);
/// ```
#[macro_export]
macro_rules! match_each_value_type {
    ($self:expr, | $tname:ident | $body:block) => {{
        use $crate::ValueType;
        match $self {
            ValueType::Bool => {
                type $tname = bool;
                $body
            }
            ValueType::I8 => {
                type $tname = i8;
                $body
            }
            ValueType::U8 => {
                type $tname = u8;
                $body
            }
            ValueType::I16 => {
                type $tname = i16;
                $body
            }
            ValueType::U16 => {
                type $tname = u16;
                $body
            }
            ValueType::I32 => {
                type $tname = i32;
                $body
            }
            ValueType::U32 => {
                type $tname = u32;
                $body
            }
            ValueType::I64 => {
                type $tname = i64;
                $body
            }
            ValueType::U64 => {
                type $tname = u64;
                $body
            }
            ValueType::F32 => {
                type $tname = f32;
                $body
            }
            ValueType::F64 => {
                type $tname = f64;
                $body
            }
            ValueType::C32 => {
                type $tname = $crate::Complex32;
                $body
            }
            ValueType::C64 => {
                type $tname = $crate::Complex64;
                $body
            }
            ValueType::Str => {
                type $tname = String;
                $body
            }
        }
    }};
}

/// Dispatches on a [`ValueType`] which is known to be a pixel type (integer or real).
///
/// Panics when given a boolean, complex or string value type: check
/// [`ValueType::pixel_code`] first.
#[macro_export]
macro_rules! match_each_pixel_type {
    ($self:expr, | $tname:ident | $body:block) => {{
        use $crate::ValueType;
        match $self {
            ValueType::I8 => {
                type $tname = i8;
                $body
            }
            ValueType::U8 => {
                type $tname = u8;
                $body
            }
            ValueType::I16 => {
                type $tname = i16;
                $body
            }
            ValueType::U16 => {
                type $tname = u16;
                $body
            }
            ValueType::I32 => {
                type $tname = i32;
                $body
            }
            ValueType::U32 => {
                type $tname = u32;
                $body
            }
            ValueType::I64 => {
                type $tname = i64;
                $body
            }
            ValueType::U64 => {
                type $tname = u64;
                $body
            }
            ValueType::F32 => {
                type $tname = f32;
                $body
            }
            ValueType::F64 => {
                type $tname = f64;
                $body
            }
            other => unreachable!("{} is not a pixel type", other),
        }
    }};
}
