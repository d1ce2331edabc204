use std::fmt::{Display, Formatter};

use ferrofits_dtype::{Bitpix, TForm, ValueType, Values, ValuesMut};

use crate::Status;

/// The access mode of an opened container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileMode {
    /// Reads only: every write returns [`READONLY_FILE`](crate::READONLY_FILE).
    #[default]
    Read,
    /// Reads and writes.
    ReadWrite,
}

impl FileMode {
    /// Returns `true` if writes are allowed.
    pub fn is_writable(self) -> bool {
        self == FileMode::ReadWrite
    }
}

impl Display for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FileMode::Read => write!(f, "read-only"),
            FileMode::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// The stored description of a table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// The column name (`TTYPEn`).
    pub name: String,
    /// The column unit (`TUNITn`), possibly empty.
    pub unit: String,
    /// The cell format (`TFORMn`).
    pub tform: TForm,
    /// The cell shape (`TDIMn`).
    ///
    /// The product of the components is the repeat count. For string columns, the first
    /// component is the string width.
    pub shape: Vec<i64>,
}

impl ColumnDescriptor {
    /// Creates a descriptor whose cells are one-dimensional.
    pub fn new(name: impl Into<String>, unit: impl Into<String>, tform: TForm) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            shape: vec![tform.repeat()],
            tform,
        }
    }

    /// The stored value type.
    pub fn value_type(&self) -> ValueType {
        self.tform.value_type()
    }

    /// The number of values per row exchanged with the transport: one string, or `repeat`
    /// scalars.
    pub fn elements_per_row(&self) -> i64 {
        if self.value_type() == ValueType::Str {
            1
        } else {
            self.tform.repeat()
        }
    }

    /// The width in bytes of one cell.
    pub fn cell_width(&self) -> usize {
        usize::try_from(self.tform.repeat()).unwrap_or(0) * self.value_type().byte_width()
    }
}

/// A positioned, typed view over one container, as seen by the core.
///
/// All methods act on the current HDU of the container. Numbers are 1-based: the first card,
/// column, row or pixel is number 1. Datatype conversions between the transferred values and
/// the stored type are the transport's responsibility, as is packing strings to the width of
/// their column.
pub trait Transport {
    /// The access mode the container was opened with.
    fn mode(&self) -> FileMode;

    /// The number of header cards.
    fn card_count(&self) -> Result<usize, Status>;

    /// Reads the card number `n`, an 80-character string.
    fn read_card(&self, n: usize) -> Result<String, Status>;

    /// Inserts a card so that it becomes card number `n`; `card_count() + 1` appends.
    fn insert_card(&mut self, n: usize, card: &str) -> Result<(), Status>;

    /// Replaces the card number `n`.
    fn update_card(&mut self, n: usize, card: &str) -> Result<(), Status>;

    /// Deletes the card number `n`.
    fn delete_card(&mut self, n: usize) -> Result<(), Status>;

    /// The stored pixel type and the shape of the image, first axis first.
    fn image_type_shape(&self) -> Result<(Bitpix, Vec<i64>), Status>;

    /// Changes the stored pixel type and shape of the image.
    fn resize_image(&mut self, bitpix: Bitpix, shape: &[i64]) -> Result<(), Status>;

    /// Reads `values.len()` contiguous pixels, starting at pixel number `first`.
    fn read_pixels(&self, first: i64, values: ValuesMut<'_>) -> Result<(), Status>;

    /// Writes contiguous pixels, starting at pixel number `first`.
    fn write_pixels(&mut self, first: i64, values: Values<'_>) -> Result<(), Status>;

    /// The number of rows of the table.
    fn row_count(&self) -> Result<i64, Status>;

    /// The number of columns of the table.
    fn column_count(&self) -> Result<usize, Status>;

    /// The number of rows which fit in the transport's I/O buffer, at least 1.
    fn buffer_row_count(&self) -> Result<i64, Status>;

    /// The description of column number `n`.
    fn column_descriptor(&self, n: usize) -> Result<ColumnDescriptor, Status>;

    /// Inserts a column so that it becomes column number `n`; `column_count() + 1` appends.
    ///
    /// Existing rows get zeroed cells.
    fn insert_column(&mut self, n: usize, descriptor: &ColumnDescriptor) -> Result<(), Status>;

    /// Deletes column number `n`.
    fn delete_column(&mut self, n: usize) -> Result<(), Status>;

    /// Renames column number `n`.
    fn rename_column(&mut self, n: usize, name: &str) -> Result<(), Status>;

    /// Reads the cells of column number `n` from row `first_row` on.
    ///
    /// The length of `values` must be a multiple of the number of elements per row of the
    /// column; that many rows are read.
    fn read_cells(&self, n: usize, first_row: i64, values: ValuesMut<'_>) -> Result<(), Status>;

    /// Writes the cells of column number `n` from row `first_row` on.
    ///
    /// Writing past the last row grows the table.
    fn write_cells(&mut self, n: usize, first_row: i64, values: Values<'_>) -> Result<(), Status>;
}
