use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use ferrofits_dtype::{Bitpix, ValueType, Values, ValuesMut};

use crate::wire::{decode, encode, encoded_len};
use crate::{
    BAD_COL_NUM, BAD_DIMEN, BAD_ELEM_NUM, BAD_HDU_NUM, BAD_KEYCHAR, BAD_ROW_NUM, ColumnDescriptor,
    FileMode, KEY_OUT_BOUNDS, NOT_BTABLE, NOT_IMAGE, READONLY_FILE, Status, Transport,
};

/// The width of a header card.
pub const CARD_WIDTH: usize = 80;

/// The size of a FITS block, the unit of I/O buffering.
pub const BLOCK_SIZE: usize = 2880;

#[derive(Debug, Clone)]
enum HduKind {
    Image {
        bitpix: Bitpix,
        shape: Vec<i64>,
    },
    Bintable {
        columns: Vec<ColumnDescriptor>,
        rows: i64,
    },
}

/// One header-data unit: header cards, structure, and big-endian data.
#[derive(Debug, Clone)]
struct Hdu<B> {
    cards: Vec<String>,
    kind: HduKind,
    data: B,
}

impl Hdu<BytesMut> {
    fn freeze(self) -> Hdu<Bytes> {
        Hdu {
            cards: self.cards,
            kind: self.kind,
            data: self.data.freeze(),
        }
    }
}

impl Hdu<Bytes> {
    fn thaw(&self) -> Hdu<BytesMut> {
        Hdu {
            cards: self.cards.clone(),
            kind: self.kind.clone(),
            data: BytesMut::from(&self.data[..]),
        }
    }
}

/// The frozen content of a closed [`MemFits`], cheap to clone and share.
///
/// Reopen it with [`MemOpenOptions::open`](crate::MemOpenOptions::open).
#[derive(Debug, Clone)]
pub struct MemStorage {
    hdus: Arc<[Hdu<Bytes>]>,
}

impl MemStorage {
    /// The number of HDUs.
    pub fn hdu_count(&self) -> usize {
        self.hdus.len()
    }

    /// The total number of data bytes, headers excluded.
    pub fn data_len(&self) -> usize {
        self.hdus.iter().map(|hdu| hdu.data.len()).sum()
    }
}

/// An in-memory FITS container.
///
/// The container is a list of HDUs, the first one being the primary image. Data units are
/// stored big-endian in their declared type. Structural keywords (`BITPIX`, `NAXISn`,
/// `TFORMn`...) are not materialized as header cards: the header holds user records only.
#[derive(Debug)]
pub struct MemFits {
    hdus: Vec<Hdu<BytesMut>>,
    current: usize,
    mode: FileMode,
    io_buffer_bytes: usize,
}

fn to_index(n: usize, count: usize, code: i32, what: &str) -> Result<usize, Status> {
    if n == 0 || n > count {
        return Err(Status::new(code, format!("{what} number {n} out of range 1..={count}")));
    }
    Ok(n - 1)
}

fn to_len(value: i64, code: i32, what: &str) -> Result<usize, Status> {
    usize::try_from(value).map_err(|_| Status::new(code, format!("invalid {what} {value}")))
}

fn image_len(bitpix: Bitpix, shape: &[i64]) -> Result<usize, Status> {
    let mut count = 1usize;
    for &length in shape {
        let length = to_len(length, BAD_DIMEN, "axis length")?;
        count = count
            .checked_mul(length)
            .ok_or_else(|| Status::new(BAD_DIMEN, "image too large"))?;
    }
    Ok(count * bitpix.byte_width())
}

fn check_card(card: &str) -> Result<String, Status> {
    if card.len() > CARD_WIDTH || !card.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        return Err(Status::new(
            BAD_KEYCHAR,
            format!("illegal header card '{card}'"),
        ));
    }
    Ok(format!("{card:<CARD_WIDTH$}"))
}

fn format_shape(shape: &[i64]) -> String {
    shape
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_descriptor(descriptor: &ColumnDescriptor) -> Result<(), Status> {
    let product: i64 = descriptor.shape.iter().product();
    if product != descriptor.tform.repeat() || descriptor.shape.iter().any(|&length| length < 0) {
        return Err(Status::new(
            BAD_DIMEN,
            format!(
                "cell shape [{}] does not match format {}",
                format_shape(&descriptor.shape),
                descriptor.tform
            ),
        ));
    }
    Ok(())
}

impl MemFits {
    pub(crate) fn new(mode: FileMode, io_buffer_bytes: usize) -> Self {
        let primary = Hdu {
            cards: Vec::new(),
            kind: HduKind::Image {
                bitpix: Bitpix::U8,
                shape: Vec::new(),
            },
            data: BytesMut::new(),
        };
        Self {
            hdus: vec![primary],
            current: 0,
            mode,
            io_buffer_bytes,
        }
    }

    pub(crate) fn from_storage(storage: &MemStorage, mode: FileMode, io_buffer_bytes: usize) -> Self {
        Self {
            hdus: storage.hdus.iter().map(Hdu::thaw).collect(),
            current: 0,
            mode,
            io_buffer_bytes,
        }
    }

    /// The number of HDUs, including the primary.
    pub fn hdu_count(&self) -> usize {
        self.hdus.len()
    }

    /// The 0-based index of the current HDU.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Makes the HDU at the 0-based `index` current.
    pub fn select(&mut self, index: usize) -> Result<(), Status> {
        if index >= self.hdus.len() {
            return Err(Status::new(
                BAD_HDU_NUM,
                format!("no HDU at index {index}, count is {}", self.hdus.len()),
            ));
        }
        self.current = index;
        Ok(())
    }

    /// Appends an image extension, zero-filled, and makes it current.
    pub fn append_image(&mut self, bitpix: Bitpix, shape: &[i64]) -> Result<usize, Status> {
        self.check_writable()?;
        let len = image_len(bitpix, shape)?;
        self.push(
            HduKind::Image {
                bitpix,
                shape: shape.to_vec(),
            },
            BytesMut::zeroed(len),
        )
    }

    /// Appends a binary table extension with the given columns and no rows, and makes it
    /// current.
    pub fn append_bintable(&mut self, columns: &[ColumnDescriptor]) -> Result<usize, Status> {
        self.check_writable()?;
        columns.iter().try_for_each(check_descriptor)?;
        self.push(
            HduKind::Bintable {
                columns: columns.to_vec(),
                rows: 0,
            },
            BytesMut::new(),
        )
    }

    /// Freezes the content of the container.
    pub fn close(self) -> MemStorage {
        log::debug!("closing in-memory container with {} HDUs", self.hdus.len());
        MemStorage {
            hdus: self.hdus.into_iter().map(Hdu::freeze).collect(),
        }
    }

    fn push(&mut self, kind: HduKind, data: BytesMut) -> Result<usize, Status> {
        self.hdus.push(Hdu {
            cards: Vec::new(),
            kind,
            data,
        });
        self.current = self.hdus.len() - 1;
        log::trace!("appended HDU {}", self.current);
        Ok(self.current)
    }

    fn check_writable(&self) -> Result<(), Status> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(Status::new(READONLY_FILE, "container is opened read-only"))
        }
    }

    fn hdu(&self) -> &Hdu<BytesMut> {
        &self.hdus[self.current]
    }

    fn hdu_mut(&mut self) -> &mut Hdu<BytesMut> {
        &mut self.hdus[self.current]
    }

    fn image(&self) -> Result<(Bitpix, &[i64], &[u8]), Status> {
        let hdu = self.hdu();
        match &hdu.kind {
            HduKind::Image { bitpix, shape } => Ok((*bitpix, shape.as_slice(), &hdu.data[..])),
            HduKind::Bintable { .. } => Err(Status::new(NOT_IMAGE, "current HDU is not an image")),
        }
    }

    fn table(&self) -> Result<(&[ColumnDescriptor], i64), Status> {
        match &self.hdu().kind {
            HduKind::Bintable { columns, rows } => Ok((columns.as_slice(), *rows)),
            HduKind::Image { .. } => {
                Err(Status::new(NOT_BTABLE, "current HDU is not a binary table"))
            }
        }
    }

    fn table_mut(&mut self) -> Result<(&mut Vec<ColumnDescriptor>, &mut i64, &mut BytesMut), Status> {
        let hdu = self.hdu_mut();
        match &mut hdu.kind {
            HduKind::Bintable { columns, rows } => Ok((columns, rows, &mut hdu.data)),
            HduKind::Image { .. } => {
                Err(Status::new(NOT_BTABLE, "current HDU is not a binary table"))
            }
        }
    }

    /// Checks a pixel range and returns the corresponding byte range.
    fn pixel_bytes(
        bitpix: Bitpix,
        data_len: usize,
        first: i64,
        count: usize,
    ) -> Result<Range<usize>, Status> {
        let width = bitpix.byte_width();
        let start = to_len(first - 1, BAD_ELEM_NUM, "first pixel number")? * width;
        let end = start + count * width;
        if first < 1 || end > data_len {
            return Err(Status::new(
                BAD_ELEM_NUM,
                format!(
                    "pixels {first}..{} out of range 1..={}",
                    first + i64::try_from(count).unwrap_or(i64::MAX),
                    data_len / width
                ),
            ));
        }
        Ok(start..end)
    }
}

/// Byte layout of the rows of a table.
struct RowLayout {
    offsets: Vec<usize>,
    width: usize,
}

impl RowLayout {
    fn new(columns: &[ColumnDescriptor]) -> Self {
        let mut offsets = Vec::with_capacity(columns.len());
        let mut width = 0;
        for column in columns {
            offsets.push(width);
            width += column.cell_width();
        }
        Self { offsets, width }
    }
}

/// Moves the cells of a table to a new column layout, `map` giving the old index of each new
/// column, or `None` for a new, zero-filled column.
fn relayout(
    data: &[u8],
    rows: usize,
    old: &[ColumnDescriptor],
    new: &[ColumnDescriptor],
    map: impl Fn(usize) -> Option<usize>,
) -> BytesMut {
    let old_layout = RowLayout::new(old);
    let new_layout = RowLayout::new(new);
    let mut out = BytesMut::zeroed(rows * new_layout.width);
    for row in 0..rows {
        for (index, column) in new.iter().enumerate() {
            let Some(source) = map(index) else {
                continue;
            };
            let width = column.cell_width();
            let from = row * old_layout.width + old_layout.offsets[source];
            let to = row * new_layout.width + new_layout.offsets[index];
            out[to..to + width].copy_from_slice(&data[from..from + width]);
        }
    }
    out
}

impl Transport for MemFits {
    fn mode(&self) -> FileMode {
        self.mode
    }

    fn card_count(&self) -> Result<usize, Status> {
        Ok(self.hdu().cards.len())
    }

    fn read_card(&self, n: usize) -> Result<String, Status> {
        let cards = &self.hdu().cards;
        let index = to_index(n, cards.len(), KEY_OUT_BOUNDS, "card")?;
        Ok(cards[index].clone())
    }

    fn insert_card(&mut self, n: usize, card: &str) -> Result<(), Status> {
        self.check_writable()?;
        let card = check_card(card)?;
        let cards = &mut self.hdu_mut().cards;
        let index = to_index(n, cards.len() + 1, KEY_OUT_BOUNDS, "card")?;
        cards.insert(index, card);
        Ok(())
    }

    fn update_card(&mut self, n: usize, card: &str) -> Result<(), Status> {
        self.check_writable()?;
        let card = check_card(card)?;
        let cards = &mut self.hdu_mut().cards;
        let index = to_index(n, cards.len(), KEY_OUT_BOUNDS, "card")?;
        cards[index] = card;
        Ok(())
    }

    fn delete_card(&mut self, n: usize) -> Result<(), Status> {
        self.check_writable()?;
        let cards = &mut self.hdu_mut().cards;
        let index = to_index(n, cards.len(), KEY_OUT_BOUNDS, "card")?;
        cards.remove(index);
        Ok(())
    }

    fn image_type_shape(&self) -> Result<(Bitpix, Vec<i64>), Status> {
        let (bitpix, shape, _) = self.image()?;
        Ok((bitpix, shape.to_vec()))
    }

    fn resize_image(&mut self, bitpix: Bitpix, shape: &[i64]) -> Result<(), Status> {
        self.check_writable()?;
        self.image()?;
        let len = image_len(bitpix, shape)?;
        let hdu = self.hdu_mut();
        hdu.kind = HduKind::Image {
            bitpix,
            shape: shape.to_vec(),
        };
        hdu.data.resize(len, 0);
        log::trace!("resized image to {bitpix} x [{}]", format_shape(shape));
        Ok(())
    }

    fn read_pixels(&self, first: i64, values: ValuesMut<'_>) -> Result<(), Status> {
        let (bitpix, _, data) = self.image()?;
        let range = Self::pixel_bytes(bitpix, data.len(), first, values.len())?;
        decode(&data[range], bitpix.value_type(), 0, values)
    }

    fn write_pixels(&mut self, first: i64, values: Values<'_>) -> Result<(), Status> {
        self.check_writable()?;
        let (bitpix, _, data) = self.image()?;
        let range = Self::pixel_bytes(bitpix, data.len(), first, values.len())?;
        encode(values, bitpix.value_type(), 0, &mut self.hdu_mut().data[range])
    }

    fn row_count(&self) -> Result<i64, Status> {
        Ok(self.table()?.1)
    }

    fn column_count(&self) -> Result<usize, Status> {
        Ok(self.table()?.0.len())
    }

    fn buffer_row_count(&self) -> Result<i64, Status> {
        let (columns, _) = self.table()?;
        let width = RowLayout::new(columns).width.max(1);
        Ok(i64::try_from(self.io_buffer_bytes / width)
            .unwrap_or(i64::MAX)
            .max(1))
    }

    fn column_descriptor(&self, n: usize) -> Result<ColumnDescriptor, Status> {
        let (columns, _) = self.table()?;
        let index = to_index(n, columns.len(), BAD_COL_NUM, "column")?;
        Ok(columns[index].clone())
    }

    fn insert_column(&mut self, n: usize, descriptor: &ColumnDescriptor) -> Result<(), Status> {
        self.check_writable()?;
        check_descriptor(descriptor)?;
        let (columns, rows, data) = self.table_mut()?;
        let index = to_index(n, columns.len() + 1, BAD_COL_NUM, "column")?;
        let mut new = columns.clone();
        new.insert(index, descriptor.clone());
        let rows = to_len(*rows, BAD_ROW_NUM, "row count")?;
        *data = relayout(&data[..], rows, columns, &new, |i| match i.cmp(&index) {
            Ordering::Less => Some(i),
            Ordering::Equal => None,
            Ordering::Greater => Some(i - 1),
        });
        *columns = new;
        log::trace!("inserted column {} as number {n}", descriptor.name);
        Ok(())
    }

    fn delete_column(&mut self, n: usize) -> Result<(), Status> {
        self.check_writable()?;
        let (columns, rows, data) = self.table_mut()?;
        let index = to_index(n, columns.len(), BAD_COL_NUM, "column")?;
        let mut new = columns.clone();
        new.remove(index);
        let rows = to_len(*rows, BAD_ROW_NUM, "row count")?;
        *data = relayout(&data[..], rows, columns, &new, |i| {
            Some(if i < index { i } else { i + 1 })
        });
        *columns = new;
        log::trace!("deleted column number {n}");
        Ok(())
    }

    fn rename_column(&mut self, n: usize, name: &str) -> Result<(), Status> {
        self.check_writable()?;
        let (columns, ..) = self.table_mut()?;
        let index = to_index(n, columns.len(), BAD_COL_NUM, "column")?;
        columns[index].name = name.to_string();
        Ok(())
    }

    fn read_cells(&self, n: usize, first_row: i64, mut values: ValuesMut<'_>) -> Result<(), Status> {
        let (columns, rows) = self.table()?;
        let index = to_index(n, columns.len(), BAD_COL_NUM, "column")?;
        let column = &columns[index];
        let per_row = to_len(column.elements_per_row(), BAD_DIMEN, "repeat count")?;
        let count = cell_rows(values.len(), per_row)?;
        check_rows(first_row, count, rows)?;
        let layout = RowLayout::new(columns);
        let width = column.cell_width();
        let data = &self.hdu().data;
        let first = to_len(first_row - 1, BAD_ROW_NUM, "row number")?;
        for row in 0..count {
            let start = (first + row) * layout.width + layout.offsets[index];
            decode(
                &data[start..start + width],
                column.value_type(),
                width,
                values.slice_mut(row * per_row..(row + 1) * per_row),
            )?;
        }
        Ok(())
    }

    fn write_cells(&mut self, n: usize, first_row: i64, values: Values<'_>) -> Result<(), Status> {
        self.check_writable()?;
        let (columns, rows, data) = self.table_mut()?;
        let index = to_index(n, columns.len(), BAD_COL_NUM, "column")?;
        let column = &columns[index];
        let per_row = to_len(column.elements_per_row(), BAD_DIMEN, "repeat count")?;
        let count = cell_rows(values.len(), per_row)?;
        if first_row < 1 {
            return Err(Status::new(BAD_ROW_NUM, format!("invalid first row {first_row}")));
        }
        let first = to_len(first_row - 1, BAD_ROW_NUM, "row number")?;
        let layout = RowLayout::new(columns);
        let end = first + count;
        if end > to_len(*rows, BAD_ROW_NUM, "row count")? {
            data.resize(end * layout.width, 0);
            *rows = i64::try_from(end).map_err(|_| Status::new(BAD_ROW_NUM, "too many rows"))?;
        }
        let width = column.cell_width();
        let stored = column.value_type();
        let text_width = if stored == ValueType::Str { width } else { 0 };
        debug_assert_eq!(encoded_len(stored, text_width, per_row), width);
        for row in 0..count {
            let start = (first + row) * layout.width + layout.offsets[index];
            encode(
                values.slice(row * per_row..(row + 1) * per_row),
                stored,
                text_width,
                &mut data[start..start + width],
            )?;
        }
        Ok(())
    }
}

fn cell_rows(len: usize, per_row: usize) -> Result<usize, Status> {
    if per_row == 0 {
        return if len == 0 {
            Ok(0)
        } else {
            Err(Status::new(BAD_ELEM_NUM, "column has empty cells"))
        };
    }
    if len % per_row != 0 {
        return Err(Status::new(
            BAD_ELEM_NUM,
            format!("{len} values do not fill cells of {per_row} values"),
        ));
    }
    Ok(len / per_row)
}

fn check_rows(first_row: i64, count: usize, rows: i64) -> Result<(), Status> {
    let count = i64::try_from(count).map_err(|_| Status::new(BAD_ROW_NUM, "too many rows"))?;
    if first_row < 1 || first_row - 1 + count > rows {
        return Err(Status::new(
            BAD_ROW_NUM,
            format!("rows {first_row}..{} out of range 1..={rows}", first_row + count),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ferrofits_dtype::{TForm, ValueType};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::MemOpenOptions;

    #[fixture]
    fn fits() -> MemFits {
        MemOpenOptions::create().build().unwrap()
    }

    fn descriptor(name: &str, repeat: i64, value_type: ValueType) -> ColumnDescriptor {
        ColumnDescriptor::new(name, "", TForm::new(repeat, value_type).unwrap())
    }

    #[rstest]
    fn cards(mut fits: MemFits) {
        fits.insert_card(1, "B       = 2").unwrap();
        fits.insert_card(1, "A       = 1").unwrap();
        assert_eq!(fits.card_count().unwrap(), 2);
        let card = fits.read_card(2).unwrap();
        assert_eq!(card.len(), CARD_WIDTH);
        assert!(card.starts_with("B       = 2 "));
        fits.update_card(1, "C       = 3").unwrap();
        fits.delete_card(2).unwrap();
        assert!(fits.read_card(1).unwrap().starts_with('C'));
        assert_eq!(fits.read_card(2).unwrap_err().code, KEY_OUT_BOUNDS);
        assert_eq!(fits.insert_card(1, &"X".repeat(81)).unwrap_err().code, BAD_KEYCHAR);
    }

    #[rstest]
    fn image_pixels(mut fits: MemFits) {
        fits.resize_image(Bitpix::I16, &[3, 2]).unwrap();
        assert_eq!(fits.image_type_shape().unwrap(), (Bitpix::I16, vec![3, 2]));
        fits.write_pixels(2, Values::I32(&[10, 20, 30])).unwrap();
        let mut pixels = [0f32; 6];
        fits.read_pixels(1, ValuesMut::F32(&mut pixels)).unwrap();
        assert_eq!(pixels, [0.0, 10.0, 20.0, 30.0, 0.0, 0.0]);
        assert_eq!(
            fits.write_pixels(5, Values::I16(&[1, 2, 3])).unwrap_err().code,
            BAD_ELEM_NUM
        );
        assert_eq!(
            fits.write_pixels(1, Values::I32(&[40_000])).unwrap_err().code,
            crate::NUM_OVERFLOW
        );
        assert_eq!(fits.row_count().unwrap_err().code, NOT_BTABLE);
    }

    #[rstest]
    fn table_cells_grow_rows(mut fits: MemFits) {
        fits.append_bintable(&[
            descriptor("ID", 1, ValueType::I32),
            descriptor("NAME", 4, ValueType::Str),
            descriptor("POS", 2, ValueType::F64),
        ])
        .unwrap();
        assert_eq!(fits.current(), 1);
        fits.write_cells(1, 1, Values::I64(&[1, 2, 3])).unwrap();
        fits.write_cells(2, 2, Values::Str(&["ab".to_string(), "cdefgh".to_string()]))
            .unwrap();
        assert_eq!(fits.row_count().unwrap(), 3);
        fits.write_cells(3, 3, Values::F64(&[1.5, 2.5, 3.5, 4.5])).unwrap();
        assert_eq!(fits.row_count().unwrap(), 4);

        let mut names = vec![String::new(); 3];
        fits.read_cells(2, 1, ValuesMut::Str(&mut names)).unwrap();
        assert_eq!(names, ["", "ab", "cdef"]);
        let mut pos = [0f64; 4];
        fits.read_cells(3, 3, ValuesMut::F64(&mut pos)).unwrap();
        assert_eq!(pos, [1.5, 2.5, 3.5, 4.5]);
        let mut odd = [0f64; 3];
        assert_eq!(
            fits.read_cells(3, 1, ValuesMut::F64(&mut odd)).unwrap_err().code,
            BAD_ELEM_NUM
        );
        let mut ids = [0i32; 2];
        assert_eq!(
            fits.read_cells(1, 4, ValuesMut::I32(&mut ids)).unwrap_err().code,
            BAD_ROW_NUM
        );
    }

    #[rstest]
    fn insert_and_delete_columns_keep_cells(mut fits: MemFits) {
        fits.append_bintable(&[descriptor("A", 1, ValueType::I16), descriptor("C", 1, ValueType::I16)])
            .unwrap();
        fits.write_cells(1, 1, Values::I16(&[1, 2])).unwrap();
        fits.write_cells(2, 1, Values::I16(&[5, 6])).unwrap();
        fits.insert_column(2, &descriptor("B", 2, ValueType::U8)).unwrap();
        assert_eq!(fits.column_count().unwrap(), 3);
        let mut c = [0i16; 2];
        fits.read_cells(3, 1, ValuesMut::I16(&mut c)).unwrap();
        assert_eq!(c, [5, 6]);
        let mut b = [9u8; 4];
        fits.read_cells(2, 1, ValuesMut::U8(&mut b)).unwrap();
        assert_eq!(b, [0; 4]);

        fits.delete_column(1).unwrap();
        fits.rename_column(2, "Z").unwrap();
        assert_eq!(fits.column_descriptor(2).unwrap().name, "Z");
        fits.read_cells(2, 1, ValuesMut::I16(&mut c)).unwrap();
        assert_eq!(c, [5, 6]);
        assert_eq!(fits.column_descriptor(3).unwrap_err().code, BAD_COL_NUM);
    }

    #[rstest]
    fn buffer_row_count_follows_row_width(mut fits: MemFits) {
        fits.append_bintable(&[descriptor("X", 10, ValueType::F64)]).unwrap();
        assert_eq!(fits.buffer_row_count().unwrap(), 40 * 2880 / 80);
        fits.append_bintable(&[descriptor("BIG", 200_000, ValueType::U8)]).unwrap();
        assert_eq!(fits.buffer_row_count().unwrap(), 1);
    }

    #[test]
    fn read_only_rejects_writes() {
        let storage = MemOpenOptions::create().build().unwrap().close();
        let mut fits = MemOpenOptions::open(storage).build().unwrap();
        assert_eq!(fits.mode(), FileMode::Read);
        assert_eq!(fits.insert_card(1, "A = 1").unwrap_err().code, READONLY_FILE);
        assert_eq!(
            fits.append_image(Bitpix::U8, &[2]).unwrap_err().code,
            READONLY_FILE
        );
        assert_eq!(fits.select(1).unwrap_err().code, BAD_HDU_NUM);
    }

    #[test]
    fn close_and_reopen_preserves_content() {
        let mut fits = MemOpenOptions::create().build().unwrap();
        fits.append_image(Bitpix::F32, &[2]).unwrap();
        fits.write_pixels(1, Values::F32(&[1.0, 2.0])).unwrap();
        let storage = fits.close();
        assert_eq!(storage.hdu_count(), 2);
        assert_eq!(storage.data_len(), 8);

        let mut reopened = MemOpenOptions::open(storage.clone())
            .with_mode(FileMode::ReadWrite)
            .build()
            .unwrap();
        reopened.select(1).unwrap();
        reopened.write_pixels(1, Values::F32(&[7.0])).unwrap();
        let mut pixels = [0f32; 2];
        reopened.read_pixels(1, ValuesMut::F32(&mut pixels)).unwrap();
        assert_eq!(pixels, [7.0, 2.0]);

        let mut original = MemOpenOptions::open(storage).build().unwrap();
        original.select(1).unwrap();
        original.read_pixels(1, ValuesMut::F32(&mut pixels)).unwrap();
        assert_eq!(pixels, [1.0, 2.0]);
    }
}
