//! Binary table columns: metadata, insertion, removal, and chunked reads and writes.

pub use seq::*;

mod seq;

use std::fmt::{Display, Formatter};

use ferrofits_array::{Column, ColumnInfo, Position, Segment, VecColumn, to_usize};
use ferrofits_dtype::{ColumnType, NativeValue, ValueType, Values, ValuesMut};
use ferrofits_error::{FitsResult, fits_bail, fits_err};
use ferrofits_io::{ColumnDescriptor, StatusContext, Transport};
use itertools::Itertools;

use crate::mapping::{FileMemSegments, RowChunks};

/// Identifies a column by index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// A 0-based index; negative indices count from the end, `-1` being the last column.
    Index(i64),
    /// A name, which must match exactly one column.
    Name(String),
}

impl From<i64> for ColumnKey {
    fn from(index: i64) -> Self {
        ColumnKey::Index(index)
    }
}

impl From<i32> for ColumnKey {
    fn from(index: i32) -> Self {
        ColumnKey::Index(i64::from(index))
    }
}

impl From<&str> for ColumnKey {
    fn from(name: &str) -> Self {
        ColumnKey::Name(name.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(name: String) -> Self {
        ColumnKey::Name(name)
    }
}

impl From<&ColumnKey> for ColumnKey {
    fn from(key: &ColumnKey) -> Self {
        key.clone()
    }
}

impl Display for ColumnKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKey::Index(index) => write!(f, "#{index}"),
            ColumnKey::Name(name) => write!(f, "{name}"),
        }
    }
}

/// The transfer of one column: transport column number, values per row, and buffer.
struct Transfer<V> {
    number: usize,
    per_row: usize,
    values: V,
}

/// A handle to the columns of the binary table of the current HDU.
///
/// Indices are 0-based. Reads and writes are split into chunks of at most
/// [`read_buffer_row_count`](Self::read_buffer_row_count) rows; within a chunk, one transport
/// call is made per column. A failing chunk stops the transfer, leaving previous chunks written.
pub struct BintableColumns<'a, H: Transport> {
    transport: &'a mut H,
}

impl<'a, H: Transport> BintableColumns<'a, H> {
    /// Creates a handle to the table of the current HDU.
    pub fn new(transport: &'a mut H) -> Self {
        Self { transport }
    }

    /// The number of columns.
    pub fn read_column_count(&self) -> FitsResult<i64> {
        let count = self
            .transport
            .column_count()
            .context("cannot count columns")?;
        i64::try_from(count).map_err(|_| fits_err!("too many columns: {}", count))
    }

    /// The number of rows.
    pub fn read_row_count(&self) -> FitsResult<i64> {
        self.transport.row_count().context("cannot count rows")
    }

    /// The number of rows transferred per chunk.
    pub fn read_buffer_row_count(&self) -> FitsResult<i64> {
        self.transport
            .buffer_row_count()
            .context("cannot read buffer size")
    }

    fn descriptor(&self, index: i64) -> FitsResult<ColumnDescriptor> {
        self.transport
            .column_descriptor(to_usize(index)? + 1)
            .with_context(|| format!("cannot read description of column {index}"))
    }

    /// Returns `true` if exactly one column has this name.
    pub fn has(&self, name: &str) -> FitsResult<bool> {
        Ok(self.read_all_names()?.iter().filter(|n| *n == name).count() == 1)
    }

    /// The index of the column with this name.
    ///
    /// Fails with [`FitsError::NotFound`](ferrofits_error::FitsError::NotFound) if no column
    /// has this name, and with [`FitsError::Ambiguous`](ferrofits_error::FitsError::Ambiguous)
    /// if several do.
    pub fn read_index(&self, name: &str) -> FitsResult<i64> {
        Self::index_in(&self.read_all_names()?, name)
    }

    fn index_in(names: &[String], name: &str) -> FitsResult<i64> {
        let matches = names.iter().positions(|n| n == name).collect::<Vec<_>>();
        match matches.as_slice() {
            [] => fits_bail!(NotFound: "column {}", name),
            [index] => i64::try_from(*index).map_err(|_| fits_err!("column index overflow")),
            _ => fits_bail!(
                Ambiguous: "{} columns are named {}",
                matches.len(),
                name
            ),
        }
    }

    /// The indices of the columns with these names.
    pub fn read_indices(&self, names: &[&str]) -> FitsResult<Vec<i64>> {
        let all = self.read_all_names()?;
        names.iter().map(|name| Self::index_in(&all, name)).collect()
    }

    fn resolve_index(&self, key: &ColumnKey) -> FitsResult<i64> {
        match key {
            ColumnKey::Name(name) => self.read_index(name),
            ColumnKey::Index(index) => {
                let count = self.read_column_count()?;
                let resolved = if *index < 0 { index + count } else { *index };
                if resolved < 0 || resolved >= count {
                    fits_bail!(
                        OutOfBounds: "column index {} in a table of {} columns",
                        index,
                        count
                    );
                }
                Ok(resolved)
            }
        }
    }

    /// The name of a column.
    pub fn read_name(&self, index: i64) -> FitsResult<String> {
        let index = self.resolve_index(&ColumnKey::Index(index))?;
        Ok(self.descriptor(index)?.name)
    }

    /// The names of all the columns, in order.
    pub fn read_all_names(&self) -> FitsResult<Vec<String>> {
        (0..self.read_column_count()?)
            .map(|index| Ok(self.descriptor(index)?.name))
            .collect()
    }

    /// The metadata of a column.
    pub fn read_info(&self, key: impl Into<ColumnKey>) -> FitsResult<ColumnInfo> {
        let index = self.resolve_index(&key.into())?;
        let descriptor = self.descriptor(index)?;
        Ok(ColumnInfo::with_shape(
            descriptor.name,
            descriptor.unit,
            Position::from(descriptor.shape),
        ))
    }

    fn check_writable(&self) -> FitsResult<()> {
        let mode = self.transport.mode();
        if !mode.is_writable() {
            fits_bail!(ReadOnly: "cannot modify columns of a {} table", mode);
        }
        Ok(())
    }

    /// Renames a column.
    pub fn rename(&mut self, key: impl Into<ColumnKey>, name: &str) -> FitsResult<()> {
        self.check_writable()?;
        let index = self.resolve_index(&key.into())?;
        self.transport
            .rename_column(to_usize(index)? + 1, name)
            .with_context(|| format!("cannot rename column {index} to {name}"))
    }

    /// Inserts an empty column of `T`s at `index`, `-1` appending it.
    pub fn init<T: ColumnType>(&mut self, info: &ColumnInfo, index: i64) -> FitsResult<()> {
        self.init_typed(info, <T::Element as NativeValue>::VALUE_TYPE, index)
    }

    /// Inserts an empty column of the given element type at `index`, `-1` appending it.
    pub fn init_typed(
        &mut self,
        info: &ColumnInfo,
        value_type: ValueType,
        index: i64,
    ) -> FitsResult<()> {
        self.check_writable()?;
        let count = self.read_column_count()?;
        let index = if index == -1 { count } else { index };
        if index < 0 || index > count {
            fits_bail!(
                OutOfBounds: "cannot insert column {} at index {} in a table of {} columns",
                info.name,
                index,
                count
            );
        }
        let mut descriptor = ColumnDescriptor::new(
            info.name.clone(),
            info.unit.clone(),
            info.tform(value_type)?,
        );
        descriptor.shape = info.shape.to_vec();
        log::debug!(
            "inserting column {} of format {} at index {}",
            info.name,
            descriptor.tform,
            index
        );
        self.transport
            .insert_column(to_usize(index)? + 1, &descriptor)
            .with_context(|| format!("cannot insert column {}", info.name))
    }

    /// Inserts several empty columns, starting at `index`, `-1` appending them.
    pub fn init_seq(&mut self, infos: &[(ColumnInfo, ValueType)], index: i64) -> FitsResult<()> {
        let first = if index == -1 {
            self.read_column_count()?
        } else {
            index
        };
        for (offset, (info, value_type)) in (0..).zip(infos) {
            self.init_typed(info, *value_type, first + offset)?;
        }
        Ok(())
    }

    /// Removes a column.
    pub fn remove(&mut self, key: impl Into<ColumnKey>) -> FitsResult<()> {
        self.check_writable()?;
        let index = self.resolve_index(&key.into())?;
        log::debug!("removing column {}", index);
        self.transport
            .delete_column(to_usize(index)? + 1)
            .with_context(|| format!("cannot remove column {index}"))
    }

    /// Removes several columns, from the last one to the first one.
    pub fn remove_seq<K: Into<ColumnKey> + Clone>(&mut self, keys: &[K]) -> FitsResult<()> {
        self.check_writable()?;
        let indices = keys
            .iter()
            .map(|key| self.resolve_index(&key.clone().into()))
            .collect::<FitsResult<Vec<_>>>()?;
        for index in indices.into_iter().sorted_unstable_by(|a, b| b.cmp(a)).dedup() {
            self.remove(index)?;
        }
        Ok(())
    }

    /// Checks that values of `value_type` can be exchanged with a column, and returns the
    /// transport column number.
    fn check_column(
        &self,
        index: i64,
        info: &ColumnInfo,
        value_type: ValueType,
    ) -> FitsResult<usize> {
        let descriptor = self.descriptor(index)?;
        let stored = descriptor.value_type();
        if (stored == ValueType::Str) != (value_type == ValueType::Str) {
            fits_bail!(
                UnsupportedType: "column {} of {} cannot be exchanged as {}",
                descriptor.name,
                stored,
                value_type
            );
        }
        if info.element_count(value_type) != descriptor.elements_per_row() {
            fits_bail!(
                ShapeMismatch: "column {} has {} elements per row, not {}",
                descriptor.name,
                descriptor.elements_per_row(),
                info.element_count(value_type)
            );
        }
        to_usize(index).map(|index| index + 1)
    }

    /// Checks that every string fits in the width of its column.
    fn check_widths(&self, number: usize, values: Values<'_>) -> FitsResult<()> {
        let Values::Str(strings) = values else {
            return Ok(());
        };
        let descriptor = self
            .transport
            .column_descriptor(number)
            .with_context(|| format!("cannot read description of column {}", number - 1))?;
        let width = to_usize(descriptor.tform.repeat())?;
        if let Some(string) = strings.iter().find(|s| s.len() > width) {
            fits_bail!(
                "string of {} characters does not fit in column {} of width {}",
                string.len(),
                descriptor.name,
                width
            );
        }
        Ok(())
    }

    fn read_chunks(
        &self,
        file: Segment,
        memory_front: i64,
        transfers: &mut [Transfer<ValuesMut<'_>>],
    ) -> FitsResult<()> {
        if file.size() <= 0 {
            return Ok(());
        }
        let hint = self.read_buffer_row_count()?;
        log::debug!(
            "reading {} columns over rows {} in chunks of {} rows",
            transfers.len(),
            file,
            hint
        );
        for chunk in RowChunks::new(file, hint)? {
            let front = to_usize(chunk.front - file.front + memory_front)?;
            let rows = to_usize(chunk.size())?;
            for transfer in transfers.iter_mut().filter(|t| t.per_row > 0) {
                let range = front * transfer.per_row..(front + rows) * transfer.per_row;
                self.transport
                    .read_cells(transfer.number, chunk.front + 1, transfer.values.slice_mut(range))
                    .with_context(|| {
                        format!("cannot read rows {} of column {}", chunk, transfer.number - 1)
                    })?;
            }
        }
        Ok(())
    }

    fn write_chunks(
        &mut self,
        file: Segment,
        memory_front: i64,
        transfers: &[Transfer<Values<'_>>],
    ) -> FitsResult<()> {
        if file.size() <= 0 {
            return Ok(());
        }
        let hint = self.read_buffer_row_count()?;
        log::debug!(
            "writing {} columns over rows {} in chunks of {} rows",
            transfers.len(),
            file,
            hint
        );
        for chunk in RowChunks::new(file, hint)? {
            let front = to_usize(chunk.front - file.front + memory_front)?;
            let rows = to_usize(chunk.size())?;
            for transfer in transfers.iter().filter(|t| t.per_row > 0) {
                let range = front * transfer.per_row..(front + rows) * transfer.per_row;
                self.transport
                    .write_cells(transfer.number, chunk.front + 1, transfer.values.slice(range))
                    .with_context(|| {
                        format!("cannot write rows {} of column {}", chunk, transfer.number - 1)
                    })?;
            }
        }
        Ok(())
    }

    /// Resolves a row mapping for a read and checks both sides are in bounds.
    fn resolve_read(
        &self,
        mut segments: FileMemSegments,
        memory_rows: i64,
    ) -> FitsResult<FileMemSegments> {
        let table_rows = self.read_row_count()?;
        segments.resolve(table_rows - 1, memory_rows - 1)?;
        let (file, memory) = (segments.file(), segments.memory());
        if file.size() != memory.size() {
            fits_bail!(ShapeMismatch: "rows {} cannot be read into rows {}", file, memory);
        }
        if file.size() > 0 && (file.front < 0 || file.back >= table_rows) {
            fits_bail!(OutOfBounds: "rows {} in a table of {} rows", file, table_rows);
        }
        if memory.size() > 0 && (memory.front < 0 || memory.back >= memory_rows) {
            fits_bail!(OutOfBounds: "rows {} in a column of {} rows", memory, memory_rows);
        }
        Ok(segments)
    }

    /// Resolves a row mapping for a write; the table may grow but not leave gaps.
    fn resolve_write(
        &self,
        mut segments: FileMemSegments,
        memory_rows: i64,
    ) -> FitsResult<FileMemSegments> {
        let table_rows = self.read_row_count()?;
        segments.resolve(table_rows - 1, memory_rows - 1)?;
        let (file, memory) = (segments.file(), segments.memory());
        if file.size() != memory.size() {
            fits_bail!(ShapeMismatch: "rows {} cannot be written to rows {}", memory, file);
        }
        if file.size() > 0 && (file.front < 0 || file.front > table_rows) {
            fits_bail!(OutOfBounds: "rows {} in a table of {} rows", file, table_rows);
        }
        if memory.size() > 0 && (memory.front < 0 || memory.back >= memory_rows) {
            fits_bail!(OutOfBounds: "rows {} in a column of {} rows", memory, memory_rows);
        }
        Ok(segments)
    }

    /// Reads a whole column.
    pub fn read<T: NativeValue>(&self, key: impl Into<ColumnKey>) -> FitsResult<VecColumn<T>> {
        self.read_segment(Segment::whole(), key)
    }

    /// Reads a range of rows of a column, a `-1` back bound meaning the last row.
    pub fn read_segment<T: NativeValue>(
        &self,
        rows: Segment,
        key: impl Into<ColumnKey>,
    ) -> FitsResult<VecColumn<T>> {
        let index = self.resolve_index(&key.into())?;
        let info = self.read_info(index)?;
        let rows = if rows.is_max() {
            Segment::new(rows.front, self.read_row_count()? - 1)
        } else {
            rows
        };
        let mut column = VecColumn::<T>::new(info, rows.size().max(0))?;
        self.read_indexed(index, FileMemSegments::from_file_segment(rows, 0), &mut column)?;
        Ok(column)
    }

    fn read_indexed<T: NativeValue, D: AsRef<[T]> + AsMut<[T]>>(
        &self,
        index: i64,
        segments: FileMemSegments,
        column: &mut Column<T, D>,
    ) -> FitsResult<()> {
        let segments = self.resolve_read(segments, column.row_count())?;
        let number = self.check_column(index, column.info(), T::VALUE_TYPE)?;
        let per_row = column.elements_per_row();
        let mut transfers = [Transfer {
            number,
            per_row,
            values: column.as_values_mut(),
        }];
        self.read_chunks(segments.file(), segments.memory().front, &mut transfers)
    }

    /// Reads the first rows of the column named like `column`, as many as it holds.
    pub fn read_to<T: NativeValue, D: AsRef<[T]> + AsMut<[T]>>(
        &self,
        column: &mut Column<T, D>,
    ) -> FitsResult<()> {
        self.read_segment_to(FileMemSegments::from_memory_segment(0, Segment::whole()), column)
    }

    /// Reads rows of the column named like `column` into rows of `column`.
    pub fn read_segment_to<T: NativeValue, D: AsRef<[T]> + AsMut<[T]>>(
        &self,
        segments: FileMemSegments,
        column: &mut Column<T, D>,
    ) -> FitsResult<()> {
        let index = self.read_index(&column.info().name)?;
        self.read_indexed(index, segments, column)
    }

    /// Reads several whole columns of different types in a single pass.
    ///
    /// ```
    /// use ferrofits_array::{ColumnInfo, VecColumn};
    /// use ferrofits_file::BintableColumns;
    /// use ferrofits_io::MemOpenOptions;
    ///
    /// let mut fits = MemOpenOptions::create().build().unwrap();
    /// fits.append_bintable(&[]).unwrap();
    /// let mut columns = BintableColumns::new(&mut fits);
    /// let ids = VecColumn::from_vec(ColumnInfo::new("ID", "", 1), vec![1i32, 2, 3]).unwrap();
    /// let names = VecColumn::from_vec(
    ///     ColumnInfo::new("NAME", "", 6),
    ///     vec!["one".to_string(), "two".to_string(), "three".to_string()],
    /// )
    /// .unwrap();
    /// columns.append(&ids).unwrap();
    /// columns.append(&names).unwrap();
    ///
    /// let (ids, names) = columns
    ///     .read_seq::<(i64, String)>(&["ID".into(), "NAME".into()])
    ///     .unwrap();
    /// assert_eq!(ids.data(), [1, 2, 3]);
    /// assert_eq!(names.at(-1, 0).unwrap(), "three");
    /// ```
    pub fn read_seq<S: ColumnTypes>(&self, keys: &[ColumnKey]) -> FitsResult<S::Columns> {
        let value_types = S::value_types();
        if keys.len() != value_types.len() {
            fits_bail!(
                "{} keys given for a sequence of {} columns",
                keys.len(),
                value_types.len()
            );
        }
        let (indices, infos) = self.read_seq_infos(keys)?;
        let rows = self.read_row_count()?;
        let mut columns = S::allocate(infos.clone(), rows)?;
        let mut transfers = Vec::with_capacity(keys.len());
        for ((index, info), values) in indices.iter().zip(&infos).zip(S::buffers(&mut columns)) {
            let value_type = values.value_type();
            transfers.push(Transfer {
                number: self.check_column(*index, info, value_type)?,
                per_row: to_usize(info.element_count(value_type))?,
                values,
            });
        }
        self.read_chunks(Segment::new(0, rows - 1), 0, &mut transfers)?;
        Ok(columns)
    }

    /// Reads several whole columns of the same type in a single pass.
    pub fn read_seq_vec<T: NativeValue>(&self, keys: &[ColumnKey]) -> FitsResult<Vec<VecColumn<T>>> {
        let (indices, infos) = self.read_seq_infos(keys)?;
        let rows = self.read_row_count()?;
        let mut columns = infos
            .into_iter()
            .map(|info| VecColumn::<T>::new(info, rows))
            .collect::<FitsResult<Vec<_>>>()?;
        let mut transfers = Vec::with_capacity(columns.len());
        for (index, column) in indices.iter().zip(columns.iter_mut()) {
            transfers.push(Transfer {
                number: self.check_column(*index, column.info(), T::VALUE_TYPE)?,
                per_row: column.elements_per_row(),
                values: column.as_values_mut(),
            });
        }
        self.read_chunks(Segment::new(0, rows - 1), 0, &mut transfers)?;
        Ok(columns)
    }

    fn read_seq_infos(&self, keys: &[ColumnKey]) -> FitsResult<(Vec<i64>, Vec<ColumnInfo>)> {
        let indices = keys
            .iter()
            .map(|key| self.resolve_index(key))
            .collect::<FitsResult<Vec<_>>>()?;
        let infos = indices
            .iter()
            .map(|&index| self.read_info(index))
            .collect::<FitsResult<Vec<_>>>()?;
        Ok((indices, infos))
    }

    /// Writes a column into the column of the same name, from the first row.
    ///
    /// The table grows if the column has more rows.
    pub fn write<T: NativeValue, D: AsRef<[T]>>(&mut self, column: &Column<T, D>) -> FitsResult<()> {
        self.write_segment(FileMemSegments::from_memory_segment(0, Segment::whole()), column)
    }

    /// Writes rows of a column into rows of the column of the same name.
    pub fn write_segment<T: NativeValue, D: AsRef<[T]>>(
        &mut self,
        segments: FileMemSegments,
        column: &Column<T, D>,
    ) -> FitsResult<()> {
        let index = self.read_index(&column.info().name)?;
        self.write_indexed(index, segments, column)
    }

    fn write_indexed<T: NativeValue, D: AsRef<[T]>>(
        &mut self,
        index: i64,
        segments: FileMemSegments,
        column: &Column<T, D>,
    ) -> FitsResult<()> {
        self.check_writable()?;
        let segments = self.resolve_write(segments, column.row_count())?;
        let number = self.check_column(index, column.info(), T::VALUE_TYPE)?;
        self.check_widths(number, column.as_values())?;
        let transfers = [Transfer {
            number,
            per_row: column.elements_per_row(),
            values: column.as_values(),
        }];
        self.write_chunks(segments.file(), segments.memory().front, &transfers)
    }

    /// Writes several columns, of possibly different types, in a single pass.
    ///
    /// All the columns must have the same number of rows.
    pub fn write_seq<S: ColumnRefs + ?Sized>(&mut self, columns: &S) -> FitsResult<()> {
        self.check_writable()?;
        let views = columns.views();
        let Some(rows) = views.first().map(|view| view.row_count) else {
            return Ok(());
        };
        if let Some(view) = views.iter().find(|view| view.row_count != rows) {
            fits_bail!(
                ShapeMismatch: "column {} has {} rows instead of {}",
                view.info.name,
                view.row_count,
                rows
            );
        }
        let names = self.read_all_names()?;
        let mut transfers = Vec::with_capacity(views.len());
        for view in &views {
            let index = Self::index_in(&names, &view.info.name)?;
            let number = self.check_column(index, view.info, view.value_type())?;
            self.check_widths(number, view.values)?;
            transfers.push(Transfer {
                number,
                per_row: to_usize(view.info.element_count(view.value_type()))?,
                values: view.values,
            });
        }
        let segments = self.resolve_write(FileMemSegments::from_memory_segment(0, Segment::whole()), rows)?;
        self.write_chunks(segments.file(), segments.memory().front, &transfers)
    }

    /// Inserts a column at `index` and writes its values, `-1` appending it.
    pub fn insert<T: NativeValue, D: AsRef<[T]>>(
        &mut self,
        index: i64,
        column: &Column<T, D>,
    ) -> FitsResult<()> {
        let count = self.read_column_count()?;
        let resolved = if index == -1 { count } else { index };
        self.init_typed(column.info(), T::VALUE_TYPE, resolved)?;
        self.write_indexed(
            resolved,
            FileMemSegments::from_memory_segment(0, Segment::whole()),
            column,
        )
    }

    /// Appends a column and writes its values.
    pub fn append<T: NativeValue, D: AsRef<[T]>>(&mut self, column: &Column<T, D>) -> FitsResult<()> {
        self.insert(-1, column)
    }
}

#[cfg(test)]
mod tests {
    use ferrofits_array::pos;
    use ferrofits_dtype::Complex32;
    use ferrofits_io::{BLOCK_SIZE, FileMode, MemFits, MemOpenOptions};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn fits() -> MemFits {
        let mut fits = MemOpenOptions::create().build().unwrap();
        fits.append_bintable(&[]).unwrap();
        fits
    }

    fn ints(name: &str, values: Vec<i32>) -> VecColumn<i32> {
        VecColumn::from_vec(ColumnInfo::new(name, "", 1), values).unwrap()
    }

    #[rstest]
    fn metadata(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&ints("A", vec![1, 2, 3])).unwrap();
        columns
            .init::<f64>(&ColumnInfo::with_shape("B", "m", pos![2, 3]), -1)
            .unwrap();
        columns.init::<u8>(&ColumnInfo::new("C", "", 1), 0).unwrap();
        assert_eq!(columns.read_column_count().unwrap(), 3);
        assert_eq!(columns.read_row_count().unwrap(), 3);
        assert_eq!(columns.read_all_names().unwrap(), ["C", "A", "B"]);
        assert_eq!(columns.read_index("B").unwrap(), 2);
        assert_eq!(columns.read_indices(&["A", "C"]).unwrap(), [1, 0]);
        assert_eq!(columns.read_name(-1).unwrap(), "B");
        let info = columns.read_info("B").unwrap();
        assert_eq!(info.shape, pos![2, 3]);
        assert_eq!(info.unit, "m");
        assert!(columns.has("A").unwrap());
        assert!(!columns.has("Z").unwrap());
        assert!(columns.read_index("Z").unwrap_err().is_not_found());
        assert!(columns.read_name(3).unwrap_err().is_out_of_bounds());

        columns.rename("C", "D").unwrap();
        assert_eq!(columns.read_name(0).unwrap(), "D");
        columns.rename(0, "A").unwrap();
        assert!(!columns.has("A").unwrap());
        assert!(columns.read_index("A").unwrap_err().is_ambiguous());
    }

    #[rstest]
    fn remove_columns(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        for name in ["A", "B", "C", "D"] {
            columns.init::<i16>(&ColumnInfo::new(name, "", 1), -1).unwrap();
        }
        columns.remove("B").unwrap();
        columns
            .remove_seq(&[ColumnKey::from("A"), ColumnKey::from(-1)])
            .unwrap();
        assert_eq!(columns.read_all_names().unwrap(), ["C"]);
    }

    #[rstest]
    fn vector_and_string_round_trip(mut fits: MemFits) {
        let vectors = VecColumn::from_rows(
            ColumnInfo::new("VEC", "", 3),
            [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]],
        )
        .unwrap();
        let strings = VecColumn::from_vec(
            ColumnInfo::new("STR", "", 5),
            vec!["ab".to_string(), "abcde".to_string()],
        )
        .unwrap();
        let complexes = VecColumn::from_vec(
            ColumnInfo::new("Z", "", 1),
            vec![Complex32::new(1.0, 2.0), Complex32::new(-1.0, 0.5)],
        )
        .unwrap();
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&vectors).unwrap();
        columns.append(&strings).unwrap();
        columns.append(&complexes).unwrap();
        assert_eq!(columns.read::<f32>("VEC").unwrap(), vectors);
        assert_eq!(columns.read::<String>("STR").unwrap(), strings);
        assert_eq!(columns.read::<Complex32>(-1).unwrap(), complexes);
        assert_eq!(columns.read::<f64>("VEC").unwrap().data()[5], 6.0);

        let too_long = VecColumn::from_vec(ColumnInfo::new("STR", "", 5), vec!["abcdef".to_string()])
            .unwrap();
        assert!(columns.write(&too_long).is_err());
        assert!(matches!(
            columns.read::<i32>("STR").unwrap_err(),
            ferrofits_error::FitsError::UnsupportedType(..)
        ));
    }

    #[rstest]
    fn segments(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&ints("A", (0..10).collect())).unwrap();
        let middle = columns.read_segment::<i32>(Segment::new(3, 5), "A").unwrap();
        assert_eq!(middle.data(), [3, 4, 5]);
        let tail = columns.read_segment::<i32>(Segment::new(7, -1), "A").unwrap();
        assert_eq!(tail.data(), [7, 8, 9]);
        assert!(columns
            .read_segment::<i32>(Segment::new(8, 10), "A")
            .unwrap_err()
            .is_out_of_bounds());

        let patch = ints("A", vec![-1, -2]);
        columns
            .write_segment(FileMemSegments::from_memory_segment(4, Segment::whole()), &patch)
            .unwrap();
        let mut into = ints("A", vec![0; 4]);
        columns
            .read_segment_to(FileMemSegments::from_file_segment(Segment::new(3, 5), 1), &mut into)
            .unwrap();
        assert_eq!(into.data(), [0, 3, -1, -2]);

        columns
            .write_segment(FileMemSegments::from_memory_segment(10, Segment::whole()), &patch)
            .unwrap();
        assert_eq!(columns.read_row_count().unwrap(), 12);
        assert!(columns
            .write_segment(FileMemSegments::from_memory_segment(13, Segment::whole()), &patch)
            .unwrap_err()
            .is_out_of_bounds());

        let mut first = ints("A", vec![0; 2]);
        columns.read_to(&mut first).unwrap();
        assert_eq!(first.data(), [0, 1]);
    }

    #[rstest]
    fn past_end_segments(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&ints("A", (0..5).collect())).unwrap();
        assert!(columns
            .read_segment::<i32>(Segment::new(9, -1), "A")
            .unwrap_err()
            .is_out_of_bounds());
        let empty = columns.read_segment::<i32>(Segment::new(5, -1), "A").unwrap();
        assert_eq!(empty.row_count(), 0);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    fn empty_segments_move_nothing(mut fits: MemFits, #[case] file_front: i64) {
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&ints("A", vec![0; 5])).unwrap();
        let source = ints("A", (100..110).collect());
        let empty = FileMemSegments::from_memory_segment(file_front, Segment::from_size(3, 0));
        columns.write_segment(empty, &source).unwrap();
        assert_eq!(columns.read::<i32>("A").unwrap().data(), [0; 5]);

        let mut into = ints("A", vec![-1; 4]);
        let empty = FileMemSegments::from_memory_segment(file_front, Segment::from_size(2, 0));
        columns.read_segment_to(empty, &mut into).unwrap();
        assert_eq!(into.data(), [-1; 4]);
    }

    #[rstest]
    fn append_rows(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&ints("A", vec![1, 2, 3])).unwrap();
        columns
            .write_segment(
                FileMemSegments::from_memory_segment(-1, Segment::whole()),
                &ints("A", vec![4, 5]),
            )
            .unwrap();
        columns
            .write_segment(
                FileMemSegments::from_memory_segment(-1, Segment::new(1, 1)),
                &ints("A", vec![0, 6]),
            )
            .unwrap();
        assert_eq!(columns.read::<i32>("A").unwrap().data(), [1, 2, 3, 4, 5, 6]);
    }

    #[rstest]
    fn duplicate_names_are_ambiguous(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        columns.append(&ints("DUP", vec![1, 2])).unwrap();
        columns.append(&ints("DUP", vec![3, 4])).unwrap();
        assert!(columns.read::<i32>("DUP").unwrap_err().is_ambiguous());
        assert!(columns
            .read_segment::<i32>(Segment::new(0, 0), "DUP")
            .unwrap_err()
            .is_ambiguous());
        assert!(columns
            .write(&ints("DUP", vec![5, 6]))
            .unwrap_err()
            .is_ambiguous());
        let mut into = ints("DUP", vec![0; 2]);
        assert!(columns.read_to(&mut into).unwrap_err().is_ambiguous());
        assert_eq!(columns.read::<i32>(1).unwrap().data(), [3, 4]);
    }

    #[rstest]
    #[case(BLOCK_SIZE)]
    #[case(3 * BLOCK_SIZE)]
    #[case(MemOpenOptions::DEFAULT_IO_BUFFER_BYTES)]
    fn chunked_sequences(#[case] buffer: usize) {
        let mut fits = MemOpenOptions::create()
            .with_io_buffer_bytes(buffer)
            .unwrap()
            .build()
            .unwrap();
        fits.append_bintable(&[]).unwrap();
        let rows = 1000;
        let ids = VecColumn::from_vec(ColumnInfo::new("ID", "", 1), (0..rows).collect::<Vec<i64>>())
            .unwrap();
        let fluxes = VecColumn::from_rows(
            ColumnInfo::new("FLUX", "Jy", 2),
            (0..rows).map(|i| [i as f64, -(i as f64)]),
        )
        .unwrap();
        let mut columns = BintableColumns::new(&mut fits);
        columns.init::<i64>(ids.info(), -1).unwrap();
        columns.init::<f64>(fluxes.info(), -1).unwrap();
        columns.write_seq(&(&ids, &fluxes)).unwrap();
        assert!(columns.read_buffer_row_count().unwrap() >= 1);
        assert_eq!(columns.read_row_count().unwrap(), rows);

        let (read_ids, read_fluxes) = columns
            .read_seq::<(i64, f64)>(&["ID".into(), "FLUX".into()])
            .unwrap();
        assert_eq!(read_ids, ids);
        assert_eq!(read_fluxes, fluxes);
        let both = columns
            .read_seq_vec::<f32>(&[ColumnKey::Index(0), ColumnKey::Index(1)])
            .unwrap();
        assert_eq!(both[1].at(-1, 0).unwrap(), &999.0);
        assert_eq!(both[1].at(-1, 1).unwrap(), &-999.0);
    }

    #[rstest]
    fn write_seq_checks_row_counts(mut fits: MemFits) {
        let mut columns = BintableColumns::new(&mut fits);
        let a = ints("A", vec![1, 2]);
        let b = ints("B", vec![1, 2, 3]);
        columns.init::<i32>(a.info(), -1).unwrap();
        columns.init::<i32>(b.info(), -1).unwrap();
        assert!(columns
            .write_seq(&(&a, &b))
            .unwrap_err()
            .is_shape_mismatch());
        assert_eq!(columns.read_row_count().unwrap(), 0);
        columns
            .write_seq(&[ints("A", vec![1, 2]), ints("B", vec![3, 4])][..])
            .unwrap();
        assert_eq!(columns.read::<i32>("B").unwrap().data(), [3, 4]);
    }

    #[rstest]
    fn read_only(fits: MemFits) {
        let mut fits = MemOpenOptions::open(fits.close())
            .with_mode(FileMode::Read)
            .build()
            .unwrap();
        let mut columns = BintableColumns::new(&mut fits);
        assert!(columns
            .append(&ints("A", vec![1]))
            .unwrap_err()
            .is_read_only());
        assert!(columns
            .init::<i32>(&ColumnInfo::new("A", "", 1), -1)
            .unwrap_err()
            .is_read_only());
    }
}
