use std::ops::Range;

use num_complex::{Complex32, Complex64};

use crate::{TypeCode, ValueType};

macro_rules! values_enum {
    ($(#[$meta:meta])* $name:ident, $($ref:tt)+) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $name<'a> {
            /// Logical values
            Bool($($ref)+ [bool]),
            /// Signed bytes
            I8($($ref)+ [i8]),
            /// Unsigned bytes
            U8($($ref)+ [u8]),
            /// 16-bit signed integers
            I16($($ref)+ [i16]),
            /// 16-bit unsigned integers
            U16($($ref)+ [u16]),
            /// 32-bit signed integers
            I32($($ref)+ [i32]),
            /// 32-bit unsigned integers
            U32($($ref)+ [u32]),
            /// 64-bit signed integers
            I64($($ref)+ [i64]),
            /// 64-bit unsigned integers
            U64($($ref)+ [u64]),
            /// Single-precision reals
            F32($($ref)+ [f32]),
            /// Double-precision reals
            F64($($ref)+ [f64]),
            /// Single-precision complex numbers
            C32($($ref)+ [Complex32]),
            /// Double-precision complex numbers
            C64($($ref)+ [Complex64]),
            /// Strings, one per cell
            Str($($ref)+ [String]),
        }

        impl $name<'_> {
            /// The value type of the elements.
            pub fn value_type(&self) -> ValueType {
                match self {
                    Self::Bool(_) => ValueType::Bool,
                    Self::I8(_) => ValueType::I8,
                    Self::U8(_) => ValueType::U8,
                    Self::I16(_) => ValueType::I16,
                    Self::U16(_) => ValueType::U16,
                    Self::I32(_) => ValueType::I32,
                    Self::U32(_) => ValueType::U32,
                    Self::I64(_) => ValueType::I64,
                    Self::U64(_) => ValueType::U64,
                    Self::F32(_) => ValueType::F32,
                    Self::F64(_) => ValueType::F64,
                    Self::C32(_) => ValueType::C32,
                    Self::C64(_) => ValueType::C64,
                    Self::Str(_) => ValueType::Str,
                }
            }

            /// The datatype code announced to the transport.
            pub fn type_code(&self) -> TypeCode {
                self.value_type().type_code()
            }

            /// The number of elements.
            pub fn len(&self) -> usize {
                match self {
                    Self::Bool(v) => v.len(),
                    Self::I8(v) => v.len(),
                    Self::U8(v) => v.len(),
                    Self::I16(v) => v.len(),
                    Self::U16(v) => v.len(),
                    Self::I32(v) => v.len(),
                    Self::U32(v) => v.len(),
                    Self::I64(v) => v.len(),
                    Self::U64(v) => v.len(),
                    Self::F32(v) => v.len(),
                    Self::F64(v) => v.len(),
                    Self::C32(v) => v.len(),
                    Self::C64(v) => v.len(),
                    Self::Str(v) => v.len(),
                }
            }

            /// Returns `true` if there are no elements.
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }
    };
}

values_enum!(
    /// A borrowed, typed slice of values on its way to the transport.
    ///
    /// The variant selects the datatype code of the transfer.
    Values,
    &'a
);

values_enum!(
    /// A borrowed, typed, mutable slice of values to be filled by the transport.
    ///
    /// The variant selects the datatype code of the transfer.
    ValuesMut,
    &'a mut
);

impl Clone for Values<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for Values<'_> {}

macro_rules! map_variants {
    ($enum:ident, $self:expr, |$v:ident| $body:expr) => {
        match $self {
            $enum::Bool($v) => $enum::Bool($body),
            $enum::I8($v) => $enum::I8($body),
            $enum::U8($v) => $enum::U8($body),
            $enum::I16($v) => $enum::I16($body),
            $enum::U16($v) => $enum::U16($body),
            $enum::I32($v) => $enum::I32($body),
            $enum::U32($v) => $enum::U32($body),
            $enum::I64($v) => $enum::I64($body),
            $enum::U64($v) => $enum::U64($body),
            $enum::F32($v) => $enum::F32($body),
            $enum::F64($v) => $enum::F64($body),
            $enum::C32($v) => $enum::C32($body),
            $enum::C64($v) => $enum::C64($body),
            $enum::Str($v) => $enum::Str($body),
        }
    };
}

impl<'a> Values<'a> {
    /// A sub-range of the values.
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn slice(self, range: Range<usize>) -> Values<'a> {
        map_variants!(Values, self, |v| &v[range])
    }
}

impl ValuesMut<'_> {
    /// A mutable sub-range of the values.
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn slice_mut(&mut self, range: Range<usize>) -> ValuesMut<'_> {
        map_variants!(ValuesMut, self, |v| &mut v[range])
    }

    /// An immutable view of the same values.
    pub fn as_values(&self) -> Values<'_> {
        match self {
            Self::Bool(v) => Values::Bool(v),
            Self::I8(v) => Values::I8(v),
            Self::U8(v) => Values::U8(v),
            Self::I16(v) => Values::I16(v),
            Self::U16(v) => Values::U16(v),
            Self::I32(v) => Values::I32(v),
            Self::U32(v) => Values::U32(v),
            Self::I64(v) => Values::I64(v),
            Self::U64(v) => Values::U64(v),
            Self::F32(v) => Values::F32(v),
            Self::F64(v) => Values::F64(v),
            Self::C32(v) => Values::C32(v),
            Self::C64(v) => Values::C64(v),
            Self::Str(v) => Values::Str(v),
        }
    }
}
