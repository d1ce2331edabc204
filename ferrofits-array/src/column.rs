use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use ferrofits_dtype::{NativeValue, TForm, ValueType, Values, ValuesMut};
use ferrofits_error::{FitsResult, fits_bail, fits_err};

use crate::{Position, PtrRaster, PtrRasterMut, Segment, Storage, pos, to_usize};

/// The metadata of a table column: name, unit and shape of the field of each row.
///
/// A shape `[1]` is a scalar column, `[k]` a vector column, and a shape with two or more axes a
/// column of N-dimensional fields. The repeat count is the number of elements per field, i.e.
/// the product of the shape components.
///
/// String columns are special: `shape[0]` is the maximum width of the strings in bytes, and each
/// row holds exactly one string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnInfo {
    /// The column name, `TTYPEn`.
    pub name: String,
    /// The column unit, `TUNITn`, possibly empty.
    pub unit: String,
    /// The shape of each field.
    pub shape: Position,
}

impl ColumnInfo {
    /// Creates the metadata of a scalar (`repeat = 1`) or vector column.
    pub fn new(name: impl Into<String>, unit: impl Into<String>, repeat: i64) -> Self {
        Self::with_shape(name, unit, pos![repeat])
    }

    /// Creates the metadata of a column of N-dimensional fields.
    pub fn with_shape(name: impl Into<String>, unit: impl Into<String>, shape: Position) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            shape,
        }
    }

    /// The number of elements per field on the wire (characters for strings).
    pub fn repeat_count(&self) -> i64 {
        self.shape.shape_size()
    }

    /// The number of elements per row in memory: one for strings, the repeat count otherwise.
    pub fn element_count(&self, value_type: ValueType) -> i64 {
        if value_type == ValueType::Str {
            1
        } else {
            self.repeat_count()
        }
    }

    /// The column format for values of the given type.
    pub fn tform(&self, value_type: ValueType) -> FitsResult<TForm> {
        TForm::new(self.repeat_count(), value_type)
    }

    /// The shape of a field in memory: the column shape, or `[1]` for strings.
    pub fn field_shape(&self, value_type: ValueType) -> Position {
        if value_type == ValueType::Str {
            pos![1]
        } else {
            self.shape.clone()
        }
    }
}

/// A table column: metadata plus the values of a number of rows, row after row.
///
/// The storage `D` is either owned ([`VecColumn`]), an immutable borrow ([`PtrColumn`]) or a
/// mutable borrow ([`PtrColumnMut`]). It holds `row_count * info.element_count()` values.
pub struct Column<T, D = Vec<T>> {
    info: ColumnInfo,
    row_count: i64,
    per_row: usize,
    data: D,
    _type: PhantomData<T>,
}

/// The number of values held by `row_count` rows.
fn value_count(info: &ColumnInfo, value_type: ValueType, row_count: i64) -> FitsResult<usize> {
    let per_row = info.element_count(value_type);
    let len = row_count.checked_mul(per_row).ok_or_else(|| {
        fits_err!("{} rows of {} values overflow in column {}", row_count, per_row, info.name)
    })?;
    to_usize(len)
}

/// A column which owns its data.
pub type VecColumn<T> = Column<T, Vec<T>>;

/// A column which borrows immutable data.
pub type PtrColumn<'a, T> = Column<T, &'a [T]>;

/// A column which borrows mutable data.
pub type PtrColumnMut<'a, T> = Column<T, &'a mut [T]>;

impl<T: NativeValue> VecColumn<T> {
    /// Creates a column of `row_count` rows filled with default values.
    pub fn new(info: ColumnInfo, row_count: i64) -> FitsResult<Self> {
        let len = value_count(&info, T::VALUE_TYPE, row_count)?;
        Self::try_new(info, row_count, vec![T::default(); len])
    }

    /// Creates a column from its values, deducing the row count.
    pub fn from_vec(info: ColumnInfo, data: Vec<T>) -> FitsResult<Self> {
        let per_row = info.element_count(T::VALUE_TYPE);
        let len = i64::try_from(data.len()).map_err(|_| fits_err!("too many values"))?;
        let row_count = match per_row {
            0 if len == 0 => 0,
            0 => fits_bail!(ShapeMismatch: "column {} has empty fields but {} values", info.name, len),
            n if len % n != 0 => fits_bail!(
                ShapeMismatch: "{} values cannot be split into rows of {}",
                len,
                n
            ),
            n => len / n,
        };
        Self::try_new(info, row_count, data)
    }

    /// Creates a column from a sequence of rows, each holding one field.
    ///
    /// This is how columns of vectors are built, e.g. from a `Vec<Vec<f64>>`.
    pub fn from_rows<R: AsRef<[T]>>(info: ColumnInfo, rows: impl IntoIterator<Item = R>) -> FitsResult<Self> {
        let per_row = to_usize(info.element_count(T::VALUE_TYPE))?;
        let mut data = Vec::new();
        let mut row_count = 0;
        for row in rows {
            let row = row.as_ref();
            if row.len() != per_row {
                fits_bail!(
                    ShapeMismatch: "row {} of column {} has {} elements instead of {}",
                    row_count,
                    info.name,
                    row.len(),
                    per_row
                );
            }
            data.extend_from_slice(row);
            row_count += 1;
        }
        Self::try_new(info, row_count, data)
    }

    /// Moves the values out.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: NativeValue, D: AsRef<[T]>> Column<T, D> {
    /// Creates a column from its metadata, row count and values.
    pub fn try_new(info: ColumnInfo, row_count: i64, data: D) -> FitsResult<Self> {
        if row_count < 0 {
            fits_bail!("negative row count {}", row_count);
        }
        let per_row = to_usize(info.element_count(T::VALUE_TYPE))?;
        let expected = to_usize(row_count)? * per_row;
        if data.as_ref().len() != expected {
            fits_bail!(
                ShapeMismatch: "column {} of {} rows and shape {} requires {} values, got {}",
                info.name,
                row_count,
                info.shape,
                expected,
                data.as_ref().len()
            );
        }
        Ok(Self {
            info,
            row_count,
            per_row,
            data,
            _type: PhantomData,
        })
    }

    /// The metadata.
    pub fn info(&self) -> &ColumnInfo {
        &self.info
    }

    /// The number of rows.
    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    /// The number of values per row.
    pub fn elements_per_row(&self) -> usize {
        self.per_row
    }

    /// The total number of values.
    pub fn element_count(&self) -> usize {
        self.data.as_ref().len()
    }

    /// The values, row after row.
    pub fn data(&self) -> &[T] {
        self.data.as_ref()
    }

    /// The values as a transport buffer.
    pub fn as_values(&self) -> Values<'_> {
        T::as_values(self.data())
    }

    fn resolve_row(&self, row: i64) -> FitsResult<usize> {
        let resolved = if row < 0 { row + self.row_count } else { row };
        if resolved < 0 || resolved >= self.row_count {
            fits_bail!(
                OutOfBounds: "row {} of column {} with {} rows",
                row,
                self.info.name,
                self.row_count
            );
        }
        to_usize(resolved)
    }

    fn offset(&self, row: i64, repeat: i64) -> FitsResult<usize> {
        let row = self.resolve_row(row)?;
        let per_row = self.elements_per_row();
        let count = i64::try_from(per_row).map_err(|_| fits_err!("too many values per row"))?;
        let resolved = if repeat < 0 { repeat + count } else { repeat };
        if resolved < 0 || resolved >= count {
            fits_bail!(
                OutOfBounds: "element {} of column {} with {} elements per row",
                repeat,
                self.info.name,
                count
            );
        }
        Ok(row * per_row + to_usize(resolved)?)
    }

    /// The element `repeat` of row `row`, bounds-checked.
    ///
    /// Negative indices count from the end, e.g. `at(-1, 0)` is the first element of the last row.
    pub fn at(&self, row: i64, repeat: i64) -> FitsResult<&T> {
        let offset = self.offset(row, repeat)?;
        Ok(&self.data()[offset])
    }

    /// The field of a row, as a raster of the column shape.
    pub fn field(&self, row: i64) -> FitsResult<PtrRaster<'_, T>> {
        let row = self.resolve_row(row)?;
        let per_row = self.elements_per_row();
        let shape = self.info.field_shape(T::VALUE_TYPE);
        PtrRaster::try_new(shape, &self.data()[row * per_row..(row + 1) * per_row])
    }

    /// Iterates over the rows, each as a slice of its values.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        let per_row = self.per_row;
        (0..self.data().len().checked_div(per_row).unwrap_or(0))
            .map(move |row| &self.data()[row * per_row..(row + 1) * per_row])
    }

    /// A borrowed view of a range of rows.
    pub fn segment(&self, rows: Segment) -> FitsResult<PtrColumn<'_, T>> {
        if rows.front < 0 || rows.back >= self.row_count || rows.size() < 0 {
            fits_bail!(
                OutOfBounds: "rows {} of column {} with {} rows",
                rows,
                self.info.name,
                self.row_count
            );
        }
        let per_row = self.elements_per_row();
        let front = to_usize(rows.front)? * per_row;
        let len = to_usize(rows.size())? * per_row;
        Column::try_new(self.info.clone(), rows.size(), &self.data()[front..front + len])
    }

    /// Copies the column into an owned one.
    pub fn to_owned_column(&self) -> VecColumn<T> {
        Column {
            info: self.info.clone(),
            row_count: self.row_count,
            per_row: self.per_row,
            data: self.data().to_vec(),
            _type: PhantomData,
        }
    }

    /// Renames the column.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.info.name = name.into();
    }

    /// Changes the shape of the fields, keeping the number of elements per row.
    pub fn reshape_entries(&mut self, shape: Position) -> FitsResult<()> {
        let reshaped = ColumnInfo::with_shape(self.info.name.clone(), self.info.unit.clone(), shape);
        if reshaped.element_count(T::VALUE_TYPE) != self.info.element_count(T::VALUE_TYPE) {
            fits_bail!(
                ShapeMismatch: "cannot reshape fields of column {} from {} to {}",
                self.info.name,
                self.info.shape,
                reshaped.shape
            );
        }
        self.info = reshaped;
        Ok(())
    }
}

impl<T: NativeValue, D: AsRef<[T]> + AsMut<[T]>> Column<T, D> {
    /// The values, mutably.
    pub fn data_mut(&mut self) -> &mut [T] {
        self.data.as_mut()
    }

    /// The values as a transport buffer to be filled.
    pub fn as_values_mut(&mut self) -> ValuesMut<'_> {
        T::as_values_mut(self.data.as_mut())
    }

    /// The element `repeat` of row `row`, bounds-checked, mutably.
    pub fn at_mut(&mut self, row: i64, repeat: i64) -> FitsResult<&mut T> {
        let offset = self.offset(row, repeat)?;
        Ok(&mut self.data_mut()[offset])
    }

    /// The field of a row, as a mutable raster of the column shape.
    pub fn field_mut(&mut self, row: i64) -> FitsResult<PtrRasterMut<'_, T>> {
        let row = self.resolve_row(row)?;
        let per_row = self.elements_per_row();
        let shape = self.info.field_shape(T::VALUE_TYPE);
        PtrRasterMut::try_new(shape, &mut self.data_mut()[row * per_row..(row + 1) * per_row])
    }
}

impl<T: NativeValue, D: Storage<T>> Column<T, D> {
    /// Changes the number of rows. Owned columns reallocate, borrowed columns cannot change.
    pub fn resize_rows(&mut self, row_count: i64) -> FitsResult<()> {
        let len = value_count(&self.info, T::VALUE_TYPE, row_count)?;
        self.data.resize(len)?;
        self.row_count = row_count;
        Ok(())
    }
}

impl<T: PartialEq, D: AsRef<[T]>, E: AsRef<[T]>> PartialEq<Column<T, E>> for Column<T, D> {
    fn eq(&self, other: &Column<T, E>) -> bool {
        self.info == other.info && self.row_count == other.row_count && self.data.as_ref() == other.data.as_ref()
    }
}

impl<T: Clone, D: Clone> Clone for Column<T, D> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            row_count: self.row_count,
            per_row: self.per_row,
            data: self.data.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: Debug, D: AsRef<[T]>> Debug for Column<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("info", &self.info)
            .field("row_count", &self.row_count)
            .field("data", &self.data.as_ref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn vector_column() -> VecColumn<i32> {
        VecColumn::from_vec(ColumnInfo::new("V", "m", 3), (0..12).collect()).unwrap()
    }

    #[test]
    fn row_count_is_deduced() {
        let column = vector_column();
        assert_eq!(column.row_count(), 4);
        assert_eq!(column.elements_per_row(), 3);
        assert!(VecColumn::from_vec(ColumnInfo::new("V", "", 5), vec![1u8; 12]).is_err());
    }

    #[test]
    fn oversized_columns_are_rejected() {
        let err = VecColumn::<u8>::new(ColumnInfo::new("V", "", 4), i64::MAX).unwrap_err();
        assert!(matches!(err, ferrofits_error::FitsError::InvalidArgument(..)));
        let mut column = vector_column();
        assert!(column.resize_rows(i64::MAX / 2).is_err());
        assert_eq!(column.row_count(), 4);
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 2, 5)]
    #[case(-1, 0, 9)]
    #[case(-1, -1, 11)]
    #[case(-4, 1, 1)]
    fn negative_indices(#[case] row: i64, #[case] repeat: i64, #[case] expected: i32) {
        assert_eq!(*vector_column().at(row, repeat).unwrap(), expected);
    }

    #[test]
    fn out_of_bounds() {
        let column = vector_column();
        assert!(column.at(-5, 0).unwrap_err().is_out_of_bounds());
        assert!(column.at(4, 0).unwrap_err().is_out_of_bounds());
        assert!(column.at(0, 3).unwrap_err().is_out_of_bounds());
        assert_eq!(column.at(-1, 0).unwrap(), column.at(3, 0).unwrap());
    }

    #[test]
    fn string_columns_hold_one_value_per_row() {
        let info = ColumnInfo::new("NAME", "", 8);
        let column = VecColumn::from_vec(info, vec!["a".to_string(), "bcd".to_string()]).unwrap();
        assert_eq!(column.row_count(), 2);
        assert_eq!(column.info().repeat_count(), 8);
        assert_eq!(column.at(1, 0).unwrap(), "bcd");
        assert_eq!(column.field(0).unwrap().shape(), &pos![1]);
    }

    #[test]
    fn field_edits_in_place() {
        let info = ColumnInfo::with_shape("IMG", "", pos![5, 6]);
        let mut column = VecColumn::<f32>::new(info, 3).unwrap();
        column.data_mut().iter_mut().for_each(|v| *v = 1.0);
        {
            let mut field = column.field_mut(1).unwrap();
            *field.at_mut(&pos![2, 3]).unwrap() = 0.0;
        }
        assert_eq!(*column.field(1).unwrap().at(&pos![2, 3]).unwrap(), 0.0);
        assert_eq!(column.data().iter().filter(|&&v| v == 0.0).count(), 1);
        assert_eq!(column.data()[30 + 2 + 5 * 3], 0.0);
    }

    #[test]
    fn from_rows_and_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let column = VecColumn::from_rows(ColumnInfo::new("V", "", 2), &rows).unwrap();
        assert_eq!(column.rows().map(<[f64]>::to_vec).collect::<Vec<_>>(), rows);
        assert!(VecColumn::from_rows(ColumnInfo::new("V", "", 3), &rows).is_err());
    }

    #[test]
    fn segment_view() {
        let column = vector_column();
        let segment = column.segment(Segment::new(1, 2)).unwrap();
        assert_eq!(segment.row_count(), 2);
        assert_eq!(segment.data(), &[3, 4, 5, 6, 7, 8]);
        assert!(column.segment(Segment::new(2, 4)).is_err());
    }

    #[test]
    fn reshape_and_rename() {
        let mut column = vector_column();
        column.rename("W");
        assert_eq!(column.info().name, "W");
        assert!(column.reshape_entries(pos![4]).is_err());
        let mut column = VecColumn::<i16>::new(ColumnInfo::new("A", "", 6), 2).unwrap();
        column.reshape_entries(pos![3, 2]).unwrap();
        assert_eq!(column.field(0).unwrap().shape(), &pos![3, 2]);
    }

    #[test]
    fn borrowed_columns_cannot_grow() {
        let data = [1u8, 2, 3];
        let mut column = PtrColumn::try_new(ColumnInfo::new("B", "", 1), 3, &data[..]).unwrap();
        assert!(column.resize_rows(4).unwrap_err().is_shape_mismatch());
        let mut owned = column.to_owned_column();
        owned.resize_rows(4).unwrap();
        assert_eq!(owned.data(), &[1, 2, 3, 0]);
    }
}
