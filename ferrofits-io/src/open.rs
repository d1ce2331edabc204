use ferrofits_error::{FitsResult, fits_bail};

use crate::{BLOCK_SIZE, FileMode, MemFits, MemStorage};

/// Options for creating or reopening a [`MemFits`] container.
///
/// ```
/// use ferrofits_io::{FileMode, MemOpenOptions, Transport};
///
/// let fits = MemOpenOptions::create().build().unwrap();
/// let storage = fits.close();
/// let reopened = MemOpenOptions::open(storage)
///     .with_mode(FileMode::ReadWrite)
///     .build()
///     .unwrap();
/// assert_eq!(reopened.mode(), FileMode::ReadWrite);
/// ```
#[derive(Debug, Clone)]
pub struct MemOpenOptions {
    storage: Option<MemStorage>,
    mode: FileMode,
    io_buffer_bytes: usize,
}

impl MemOpenOptions {
    /// The default size of the I/O buffer: 40 blocks.
    pub const DEFAULT_IO_BUFFER_BYTES: usize = 40 * BLOCK_SIZE;

    /// Creates a new, empty container, writable by default.
    pub fn create() -> Self {
        Self {
            storage: None,
            mode: FileMode::ReadWrite,
            io_buffer_bytes: Self::DEFAULT_IO_BUFFER_BYTES,
        }
    }

    /// Reopens the content of a closed container, read-only by default.
    pub fn open(storage: MemStorage) -> Self {
        Self {
            storage: Some(storage),
            mode: FileMode::Read,
            io_buffer_bytes: Self::DEFAULT_IO_BUFFER_BYTES,
        }
    }

    /// Configure the access mode.
    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Configure the size of the I/O buffer, which drives the number of rows read or written
    /// per table chunk.
    pub fn with_io_buffer_bytes(mut self, io_buffer_bytes: usize) -> FitsResult<Self> {
        if io_buffer_bytes < BLOCK_SIZE {
            fits_bail!("io_buffer_bytes must be at least one block of {BLOCK_SIZE} bytes, got {io_buffer_bytes}");
        }
        self.io_buffer_bytes = io_buffer_bytes;
        Ok(self)
    }

    /// Opens the container.
    pub fn build(self) -> FitsResult<MemFits> {
        log::debug!(
            "opening in-memory container, {}, {} buffer bytes",
            self.mode,
            self.io_buffer_bytes
        );
        Ok(match &self.storage {
            Some(storage) => MemFits::from_storage(storage, self.mode, self.io_buffer_bytes),
            None => MemFits::new(self.mode, self.io_buffer_bytes),
        })
    }
}
