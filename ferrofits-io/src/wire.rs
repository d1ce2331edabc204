//! Big-endian encoding of values in their stored type, with conversions from and to the
//! transferred type.

use ferrofits_dtype::{AnyValue, Complex32, Complex64, NativeValue, RecordType, ValueType, Values, ValuesMut};
use ferrofits_error::FitsError;

use crate::{BAD_DATATYPE, NUM_OVERFLOW, Status};

/// A fixed-width value as stored in a data unit.
trait WireValue: RecordType {
    const WIDTH: usize;

    fn put(&self, out: &mut [u8]);

    fn get(bytes: &[u8]) -> Self;
}

macro_rules! wire_number {
    ($T:ty) => {
        impl WireValue for $T {
            const WIDTH: usize = size_of::<$T>();

            fn put(&self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_be_bytes());
            }

            fn get(bytes: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$T>()];
                buf.copy_from_slice(bytes);
                <$T>::from_be_bytes(buf)
            }
        }
    };
}

wire_number!(i8);
wire_number!(u8);
wire_number!(i16);
wire_number!(u16);
wire_number!(i32);
wire_number!(u32);
wire_number!(i64);
wire_number!(u64);
wire_number!(f32);
wire_number!(f64);

impl WireValue for bool {
    const WIDTH: usize = 1;

    fn put(&self, out: &mut [u8]) {
        out[0] = if *self { b'T' } else { b'F' };
    }

    fn get(bytes: &[u8]) -> Self {
        bytes[0] == b'T'
    }
}

macro_rules! wire_complex {
    ($T:ty, $R:ty) => {
        impl WireValue for $T {
            const WIDTH: usize = 2 * size_of::<$R>();

            fn put(&self, out: &mut [u8]) {
                let (re, im) = out.split_at_mut(size_of::<$R>());
                self.re.put(re);
                self.im.put(im);
            }

            fn get(bytes: &[u8]) -> Self {
                let (re, im) = bytes.split_at(size_of::<$R>());
                <$T>::new(<$R>::get(re), <$R>::get(im))
            }
        }
    };
}

wire_complex!(Complex32, f32);
wire_complex!(Complex64, f64);

/// Dispatches on a stored value type other than strings.
macro_rules! match_each_fixed_type {
    ($vt:expr, |$W:ident| $body:block, $strings:expr) => {
        match $vt {
            ValueType::Bool => {
                type $W = bool;
                $body
            }
            ValueType::I8 => {
                type $W = i8;
                $body
            }
            ValueType::U8 => {
                type $W = u8;
                $body
            }
            ValueType::I16 => {
                type $W = i16;
                $body
            }
            ValueType::U16 => {
                type $W = u16;
                $body
            }
            ValueType::I32 => {
                type $W = i32;
                $body
            }
            ValueType::U32 => {
                type $W = u32;
                $body
            }
            ValueType::I64 => {
                type $W = i64;
                $body
            }
            ValueType::U64 => {
                type $W = u64;
                $body
            }
            ValueType::F32 => {
                type $W = f32;
                $body
            }
            ValueType::F64 => {
                type $W = f64;
                $body
            }
            ValueType::C32 => {
                type $W = Complex32;
                $body
            }
            ValueType::C64 => {
                type $W = Complex64;
                $body
            }
            ValueType::Str => $strings,
        }
    };
}

fn convert<T: RecordType>(value: AnyValue) -> Result<T, Status> {
    T::try_from(value).map_err(|err| match err.root() {
        FitsError::UnsupportedType(msg, _) => Status::new(BAD_DATATYPE, msg.to_string()),
        FitsError::InvalidArgument(msg, _) => Status::new(NUM_OVERFLOW, msg.to_string()),
        other => Status::new(BAD_DATATYPE, other.to_string()),
    })
}

fn mismatch(from: ValueType, to: ValueType) -> Status {
    Status::new(
        BAD_DATATYPE,
        format!("cannot convert {from} values to stored {to} values"),
    )
}

/// The number of bytes taken by `count` values of the stored type, strings being `width`
/// bytes wide.
pub(crate) fn encoded_len(stored: ValueType, width: usize, count: usize) -> usize {
    if stored == ValueType::Str {
        width * count
    } else {
        stored.byte_width() * count
    }
}

/// Encodes `values` as `stored` values into `out`.
///
/// Strings are truncated or space-padded to `width` bytes.
pub(crate) fn encode(
    values: Values<'_>,
    stored: ValueType,
    width: usize,
    out: &mut [u8],
) -> Result<(), Status> {
    match values {
        Values::Bool(src) => encode_fixed(src, stored, out),
        Values::I8(src) => encode_fixed(src, stored, out),
        Values::U8(src) => encode_fixed(src, stored, out),
        Values::I16(src) => encode_fixed(src, stored, out),
        Values::U16(src) => encode_fixed(src, stored, out),
        Values::I32(src) => encode_fixed(src, stored, out),
        Values::U32(src) => encode_fixed(src, stored, out),
        Values::I64(src) => encode_fixed(src, stored, out),
        Values::U64(src) => encode_fixed(src, stored, out),
        Values::F32(src) => encode_fixed(src, stored, out),
        Values::F64(src) => encode_fixed(src, stored, out),
        Values::C32(src) => encode_fixed(src, stored, out),
        Values::C64(src) => encode_fixed(src, stored, out),
        Values::Str(src) => {
            if stored != ValueType::Str {
                return Err(mismatch(ValueType::Str, stored));
            }
            if width == 0 {
                return Ok(());
            }
            for (value, field) in src.iter().zip(out.chunks_exact_mut(width)) {
                let bytes = value.as_bytes();
                let len = bytes.len().min(width);
                field[..len].copy_from_slice(&bytes[..len]);
                field[len..].fill(b' ');
            }
            Ok(())
        }
    }
}

fn encode_fixed<S: NativeValue>(src: &[S], stored: ValueType, out: &mut [u8]) -> Result<(), Status> {
    match_each_fixed_type!(stored, |W| {
        for (value, field) in src.iter().zip(out.chunks_exact_mut(W::WIDTH)) {
            convert::<W>(value.clone().into_any())?.put(field);
        }
        Ok(())
    }, Err(mismatch(S::VALUE_TYPE, stored)))
}

/// Decodes `stored` values from `bytes` into `values`.
///
/// Trailing spaces and NUL bytes of strings are dropped.
pub(crate) fn decode(
    bytes: &[u8],
    stored: ValueType,
    width: usize,
    values: ValuesMut<'_>,
) -> Result<(), Status> {
    match values {
        ValuesMut::Bool(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::I8(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::U8(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::I16(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::U16(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::I32(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::U32(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::I64(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::U64(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::F32(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::F64(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::C32(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::C64(dst) => decode_fixed(bytes, stored, dst),
        ValuesMut::Str(dst) => {
            if stored != ValueType::Str {
                return Err(mismatch(stored, ValueType::Str));
            }
            if width == 0 {
                dst.iter_mut().for_each(String::clear);
                return Ok(());
            }
            for (field, value) in bytes.chunks_exact(width).zip(dst.iter_mut()) {
                let end = field
                    .iter()
                    .rposition(|&b| b != b' ' && b != 0)
                    .map_or(0, |i| i + 1);
                *value = String::from_utf8_lossy(&field[..end]).into_owned();
            }
            Ok(())
        }
    }
}

fn decode_fixed<D: RecordType>(bytes: &[u8], stored: ValueType, dst: &mut [D]) -> Result<(), Status> {
    match_each_fixed_type!(stored, |W| {
        for (field, value) in bytes.chunks_exact(W::WIDTH).zip(dst.iter_mut()) {
            *value = convert::<D>(W::get(field).into_any())?;
        }
        Ok(())
    }, Err(mismatch(stored, D::VALUE_TYPE)))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn integers_are_big_endian() {
        let mut out = [0u8; 4];
        encode(Values::I16(&[0x0102, -2]), ValueType::I16, 0, &mut out).unwrap();
        assert_eq!(out, [1, 2, 0xff, 0xfe]);
    }

    #[test]
    fn logicals_are_ascii() {
        let mut out = [0u8; 2];
        encode(Values::Bool(&[true, false]), ValueType::Bool, 0, &mut out).unwrap();
        assert_eq!(&out, b"TF");
        let mut back = [false; 2];
        decode(&out, ValueType::Bool, 0, ValuesMut::Bool(&mut back)).unwrap();
        assert_eq!(back, [true, false]);
    }

    #[test]
    fn conversion_on_write_and_read() {
        let mut out = [0u8; 16];
        encode(Values::I32(&[3, -7]), ValueType::F64, 0, &mut out).unwrap();
        let mut floats = [0f64; 2];
        decode(&out, ValueType::F64, 0, ValuesMut::F64(&mut floats)).unwrap();
        assert_eq!(floats, [3.0, -7.0]);
        let mut bytes = [0i8; 2];
        decode(&out, ValueType::F64, 0, ValuesMut::I8(&mut bytes)).unwrap();
        assert_eq!(bytes, [3, -7]);
    }

    #[rstest]
    #[case(Values::I32(&[300]), ValueType::U8, NUM_OVERFLOW)]
    #[case(Values::I16(&[-1]), ValueType::U16, NUM_OVERFLOW)]
    #[case(Values::I32(&[1]), ValueType::Bool, BAD_DATATYPE)]
    #[case(Values::I32(&[1]), ValueType::Str, BAD_DATATYPE)]
    #[case(Values::C64(&[Complex64::new(1.0, 2.0)]), ValueType::F64, BAD_DATATYPE)]
    fn failed_conversions(#[case] values: Values<'_>, #[case] stored: ValueType, #[case] code: i32) {
        let mut out = [0u8; 16];
        let status = encode(values, stored, 4, &mut out).unwrap_err();
        assert_eq!(status.code, code);
    }

    #[test]
    fn complex_numbers() {
        let mut out = [0u8; 8];
        encode(Values::C32(&[Complex32::new(1.5, -2.0)]), ValueType::C32, 0, &mut out).unwrap();
        assert_eq!(&out[..4], &1.5f32.to_be_bytes());
        let mut back = [Complex64::default()];
        decode(&out, ValueType::C32, 0, ValuesMut::C64(&mut back)).unwrap();
        assert_eq!(back[0], Complex64::new(1.5, -2.0));
    }

    #[test]
    fn strings_are_padded_and_trimmed() {
        let strings = ["abc".to_string(), "toolong".to_string()];
        let mut out = [0u8; 10];
        encode(Values::Str(&strings), ValueType::Str, 5, &mut out).unwrap();
        assert_eq!(&out, b"abc  toolo");
        let mut back = vec![String::new(); 2];
        decode(&out, ValueType::Str, 5, ValuesMut::Str(&mut back)).unwrap();
        assert_eq!(back, ["abc", "toolo"]);
        assert_eq!(encoded_len(ValueType::Str, 5, 2), 10);
        assert_eq!(encoded_len(ValueType::C64, 5, 2), 32);
    }
}
