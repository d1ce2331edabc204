use std::fmt::Debug;

use num_complex::{Complex32, Complex64};

use crate::{AnyValue, Bitpix, TForm, TypeCode, ValueType, Values, ValuesMut};

mod private {
    use num_complex::{Complex32, Complex64};

    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i8 {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for u16 {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for i64 {}
    impl Sealed for u64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for Complex32 {}
    impl Sealed for Complex64 {}
    impl Sealed for String {}
}

/// A native Rust type which has a [`ValueType`].
///
/// This trait is sealed: the set of value types is closed.
pub trait NativeValue:
    Clone + Debug + Default + PartialEq + Send + Sync + 'static + private::Sealed
{
    /// The run-time value type.
    const VALUE_TYPE: ValueType;

    /// Views a slice as transport values.
    fn as_values(slice: &[Self]) -> Values<'_>;

    /// Views a mutable slice as transport values to be filled.
    fn as_values_mut(slice: &mut [Self]) -> ValuesMut<'_>;

    /// Wraps a single value.
    fn into_any(self) -> AnyValue;
}

/// A type which can be the value of a header record.
pub trait RecordType: NativeValue + TryFrom<AnyValue, Error = ferrofits_error::FitsError> {
    /// The datatype code of records holding this type.
    const RECORD_CODE: TypeCode;
}

/// A type which can be the pixel type of an image.
pub trait PixelType: NativeValue + Copy {
    /// The datatype code of pixels of this type.
    const PIXEL_CODE: TypeCode;
    /// The image bit depth.
    const BITPIX: Bitpix;
}

/// A type which can be stored in a table column.
///
/// Vectors, arrays and references forward to their element type: a column of vectors is
/// wire-identical to a scalar column whose repeat count is the vector length.
pub trait ColumnType {
    /// The scalar element type.
    type Element: NativeValue;
    /// The datatype code of cells of this column type.
    const COLUMN_CODE: TypeCode;
    /// The format letter of this column type.
    const TFORM_CHAR: char;

    /// The format for the given repeat count.
    fn tform(repeat: i64) -> ferrofits_error::FitsResult<TForm> {
        TForm::new(repeat, <Self::Element as NativeValue>::VALUE_TYPE)
    }
}

macro_rules! native_value {
    ($T:ty, $variant:ident) => {
        impl NativeValue for $T {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn as_values(slice: &[Self]) -> Values<'_> {
                Values::$variant(slice)
            }

            fn as_values_mut(slice: &mut [Self]) -> ValuesMut<'_> {
                ValuesMut::$variant(slice)
            }

            fn into_any(self) -> AnyValue {
                AnyValue::$variant(self)
            }
        }

        impl RecordType for $T {
            const RECORD_CODE: TypeCode = ValueType::$variant.record_code();
        }

        impl ColumnType for $T {
            type Element = $T;
            const COLUMN_CODE: TypeCode = ValueType::$variant.column_code();
            const TFORM_CHAR: char = ValueType::$variant.tform_char();
        }
    };
}

macro_rules! pixel_type {
    ($T:ty, $variant:ident) => {
        impl PixelType for $T {
            const PIXEL_CODE: TypeCode = ValueType::$variant.type_code();
            const BITPIX: Bitpix = Bitpix::$variant;
        }
    };
}

native_value!(bool, Bool);
native_value!(i8, I8);
native_value!(u8, U8);
native_value!(i16, I16);
native_value!(u16, U16);
native_value!(i32, I32);
native_value!(u32, U32);
native_value!(i64, I64);
native_value!(u64, U64);
native_value!(f32, F32);
native_value!(f64, F64);
native_value!(Complex32, C32);
native_value!(Complex64, C64);
native_value!(String, Str);

pixel_type!(i8, I8);
pixel_type!(u8, U8);
pixel_type!(i16, I16);
pixel_type!(u16, U16);
pixel_type!(i32, I32);
pixel_type!(u32, U32);
pixel_type!(i64, I64);
pixel_type!(u64, U64);
pixel_type!(f32, F32);
pixel_type!(f64, F64);

impl<T: ColumnType> ColumnType for Vec<T> {
    type Element = T::Element;
    const COLUMN_CODE: TypeCode = T::COLUMN_CODE;
    const TFORM_CHAR: char = T::TFORM_CHAR;
}

impl<T: ColumnType, const N: usize> ColumnType for [T; N] {
    type Element = T::Element;
    const COLUMN_CODE: TypeCode = T::COLUMN_CODE;
    const TFORM_CHAR: char = T::TFORM_CHAR;
}

impl<T: ColumnType + ?Sized> ColumnType for &T {
    type Element = T::Element;
    const COLUMN_CODE: TypeCode = T::COLUMN_CODE;
    const TFORM_CHAR: char = T::TFORM_CHAR;
}

/// The datatype code of header records of type `T`.
pub const fn header_code<T: RecordType>() -> TypeCode {
    T::RECORD_CODE
}

/// The datatype code of image pixels of type `T`.
pub const fn pixel_code<T: PixelType>() -> TypeCode {
    T::PIXEL_CODE
}

/// The image bit depth of pixels of type `T`.
pub const fn bit_depth<T: PixelType>() -> Bitpix {
    T::BITPIX
}

/// The format letter of columns of type `T`.
pub const fn column_type_char<T: ColumnType>() -> char {
    T::TFORM_CHAR
}

/// The full column format of columns of type `T`, e.g. `"3E"`.
///
/// Fails like [`TForm::new`] if `repeat` is negative.
pub fn column_repeat_format<T: ColumnType>(repeat: i64) -> ferrofits_error::FitsResult<String> {
    Ok(T::tform(repeat)?.to_string())
}
