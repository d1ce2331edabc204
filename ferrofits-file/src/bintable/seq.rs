//! Heterogeneous sequences of columns, read or written in a single pass.

use ferrofits_array::{Column, ColumnInfo, VecColumn};
use ferrofits_dtype::{NativeValue, ValueType, Values, ValuesMut};
use ferrofits_error::{FitsResult, fits_err};

/// A borrowed column, with its element type erased.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    /// The metadata.
    pub info: &'a ColumnInfo,
    /// The values, row after row.
    pub values: Values<'a>,
    /// The number of rows.
    pub row_count: i64,
}

impl<'a> ColumnView<'a> {
    /// Views a typed column.
    pub fn new<T: NativeValue, D: AsRef<[T]>>(column: &'a Column<T, D>) -> Self {
        Self {
            info: column.info(),
            values: column.as_values(),
            row_count: column.row_count(),
        }
    }

    /// The element type.
    pub fn value_type(&self) -> ValueType {
        self.values.value_type()
    }
}

/// Columns which can be written together with
/// [`BintableColumns::write_seq`](crate::BintableColumns::write_seq).
///
/// Implemented by columns, slices and vectors of columns, references to them, and tuples of up to
/// six of any of these, e.g. `(&ra, &dec, &fluxes[..])`.
pub trait ColumnRefs {
    /// The columns, in order.
    fn views(&self) -> Vec<ColumnView<'_>>;
}

impl<T: NativeValue, D: AsRef<[T]>> ColumnRefs for Column<T, D> {
    fn views(&self) -> Vec<ColumnView<'_>> {
        vec![ColumnView::new(self)]
    }
}

impl<T: NativeValue, D: AsRef<[T]>> ColumnRefs for [Column<T, D>] {
    fn views(&self) -> Vec<ColumnView<'_>> {
        self.iter().map(ColumnView::new).collect()
    }
}

impl<T: NativeValue, D: AsRef<[T]>> ColumnRefs for Vec<Column<T, D>> {
    fn views(&self) -> Vec<ColumnView<'_>> {
        self.as_slice().views()
    }
}

impl<R: ColumnRefs + ?Sized> ColumnRefs for &R {
    fn views(&self) -> Vec<ColumnView<'_>> {
        (**self).views()
    }
}

/// Element types of columns which can be read together with
/// [`BintableColumns::read_seq`](crate::BintableColumns::read_seq).
///
/// Implemented by tuples of up to six [`NativeValue`]s, e.g. `(i32, f64, String)`.
pub trait ColumnTypes {
    /// The owned columns, e.g. `(VecColumn<i32>, VecColumn<f64>, VecColumn<String>)`.
    type Columns;

    /// The element types, in order.
    fn value_types() -> Vec<ValueType>;

    /// Allocates columns of `row_count` rows.
    fn allocate(infos: Vec<ColumnInfo>, row_count: i64) -> FitsResult<Self::Columns>;

    /// The buffers of the columns, in order.
    fn buffers(columns: &mut Self::Columns) -> Vec<ValuesMut<'_>>;
}

fn next_info(infos: &mut impl Iterator<Item = ColumnInfo>) -> FitsResult<ColumnInfo> {
    infos
        .next()
        .ok_or_else(|| fits_err!("not enough column metadata for the sequence"))
}

macro_rules! column_seq {
    ($($T:ident $i:tt),+) => {
        impl<$($T: ColumnRefs),+> ColumnRefs for ($($T,)+) {
            fn views(&self) -> Vec<ColumnView<'_>> {
                let mut views = Vec::new();
                $(views.extend(self.$i.views());)+
                views
            }
        }

        impl<$($T: NativeValue),+> ColumnTypes for ($($T,)+) {
            type Columns = ($(VecColumn<$T>,)+);

            fn value_types() -> Vec<ValueType> {
                vec![$($T::VALUE_TYPE),+]
            }

            fn allocate(infos: Vec<ColumnInfo>, row_count: i64) -> FitsResult<Self::Columns> {
                let mut infos = infos.into_iter();
                Ok(($(VecColumn::<$T>::new(next_info(&mut infos)?, row_count)?,)+))
            }

            fn buffers(columns: &mut Self::Columns) -> Vec<ValuesMut<'_>> {
                vec![$(columns.$i.as_values_mut()),+]
            }
        }
    };
}

column_seq!(A 0);
column_seq!(A 0, B 1);
column_seq!(A 0, B 1, C 2);
column_seq!(A 0, B 1, C 2, D 3);
column_seq!(A 0, B 1, C 2, D 3, E 4);
column_seq!(A 0, B 1, C 2, D 3, E 4, F 5);
