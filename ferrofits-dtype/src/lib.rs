#![deny(missing_docs)]

//! The type registry of Ferrofits.
//!
//! Every value that crosses the transport boundary has one of fourteen [`ValueType`]s. This crate
//! maps each of them to the codes fixed by the container standard:
//! - a datatype code ([`TypeCode`]) for header records, image pixels and table cells,
//! - a bit depth ([`Bitpix`]) for image pixels, which only exists for real numbers,
//! - a format letter and repeat count ([`TForm`]) for table columns.
//!
//! The mapping exists twice. At compile time, the [`RecordType`], [`PixelType`] and
//! [`ColumnType`] traits are implemented only for supported (type, role) pairs, so that e.g.
//! reading an image of `bool`s does not compile. At run time, [`ValueType`] offers the same
//! mapping and reports unsupported pairs with [`FitsError::UnsupportedType`](ferrofits_error::FitsError::UnsupportedType).

pub use any::*;
pub use code::*;
pub use native::*;
pub use num_complex::{Complex, Complex32, Complex64};
pub use tform::*;
pub use value_type::*;
pub use values::*;

mod any;
mod code;
mod native;
mod tform;
mod value_type;
mod values;
