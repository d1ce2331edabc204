//! Mapping between regions of a data unit and regions of memory.
//!
//! A mapping is a pair of same-shaped regions, one in the file and one in memory. Either side
//! may be left open with `-1` back components, which are resolved against the actual extents
//! once they are known. Resolved mappings are then split into contiguous [`Run`]s for images,
//! and into [`RowChunks`] for tables.
//!
//! Openness is recorded when a mapping is built, from the bounds given by the caller only. A
//! bound computed from the other side is never open, even when it happens to be `-1`, as for
//! an empty region starting at 0.

use std::fmt::Display;

use ferrofits_array::{Position, Region, Segment, linear_index};
use ferrofits_error::{FitsResult, fits_bail};

/// The side whose open back bound drives the resolution of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    File,
    Memory,
}

fn check_ordered(front: i64, back: i64, what: &str, bounds: impl Display) -> FitsResult<()> {
    if back < front - 1 {
        fits_bail!(OutOfBounds: "{} {} ends before it starts", what, bounds);
    }
    Ok(())
}

fn check_region_ordered(region: &Region, what: &str) -> FitsResult<()> {
    region
        .front
        .iter()
        .zip(region.back.iter())
        .try_for_each(|(&front, &back)| check_ordered(front, back, what, region))
}

/// A pair of in-file and in-memory regions of the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMemRegions {
    file: Region,
    memory: Region,
    open: Vec<Option<Side>>,
}

impl FileMemRegions {
    /// Maps an in-file region to the memory region of the same shape starting at
    /// `memory_front`.
    ///
    /// Along axes which are open in the file region, the memory back bound is a placeholder
    /// which follows the file bound on resolution.
    pub fn from_file_region(file: Region, memory_front: Position) -> FitsResult<Self> {
        let mut memory = Region::from_shape(memory_front, &file.shape())?;
        let open = (0..file.dimension())
            .map(|axis| (file.back[axis] == -1).then_some(Side::File))
            .collect::<Vec<_>>();
        for (axis, side) in open.iter().enumerate() {
            if side.is_some() {
                memory.back[axis] = memory.front[axis];
            }
        }
        Ok(Self { file, memory, open })
    }

    /// Maps an in-memory region to the in-file region of the same shape starting at
    /// `file_front`.
    ///
    /// Along axes which are open in the memory region, the file back bound is a placeholder
    /// which follows the memory bound on resolution.
    pub fn from_memory_region(file_front: Position, memory: Region) -> FitsResult<Self> {
        let mut file = Region::from_shape(file_front, &memory.shape())?;
        let open = (0..memory.dimension())
            .map(|axis| (memory.back[axis] == -1).then_some(Side::Memory))
            .collect::<Vec<_>>();
        for (axis, side) in open.iter().enumerate() {
            if side.is_some() {
                file.back[axis] = file.front[axis];
            }
        }
        Ok(Self { file, memory, open })
    }

    /// Maps a whole data unit to a whole raster, the data unit driving the resolution.
    pub fn whole(dimension: usize) -> Self {
        Self {
            file: Region::whole(dimension),
            memory: Region::whole(dimension),
            open: vec![Some(Side::File); dimension],
        }
    }

    /// The in-file region.
    pub fn file(&self) -> &Region {
        &self.file
    }

    /// The in-memory region.
    pub fn memory(&self) -> &Region {
        &self.memory
    }

    /// The number of axes.
    pub fn dimension(&self) -> usize {
        self.file.dimension()
    }

    /// The translation from in-file to in-memory positions.
    pub fn file_to_memory(&self) -> Position {
        &self.memory.front - &self.file.front
    }

    /// The translation from in-memory to in-file positions.
    pub fn memory_to_file(&self) -> Position {
        &self.file.front - &self.memory.front
    }

    /// Replaces the open back components, given the back positions of the data unit and of
    /// the raster.
    ///
    /// For each axis, an open in-file bound takes `file_back` and the memory bound follows;
    /// otherwise an open in-memory bound takes `memory_back` and the file bound follows.
    /// Resolving a fully specified mapping does nothing.
    ///
    /// Fails with [`FitsError::OutOfBounds`](ferrofits_error::FitsError::OutOfBounds) if a
    /// resolved back component lies before its front minus one, i.e. if a region is inverted
    /// or starts past the end of its container. A back component equal to its front minus one
    /// is a legal empty axis.
    pub fn resolve(&mut self, file_back: &Position, memory_back: &Position) -> FitsResult<()> {
        let dimension = self.dimension();
        if file_back.dimension() != dimension || memory_back.dimension() != dimension {
            fits_bail!(
                ShapeMismatch: "cannot resolve {}-dimensional mapping with back positions {} and {}",
                dimension,
                file_back,
                memory_back
            );
        }
        let file_to_memory = self.file_to_memory();
        for (axis, side) in self.open.iter().enumerate() {
            match side {
                Some(Side::File) => {
                    self.file.back[axis] = file_back[axis];
                    self.memory.back[axis] = file_back[axis] + file_to_memory[axis];
                }
                Some(Side::Memory) => {
                    self.memory.back[axis] = memory_back[axis];
                    self.file.back[axis] = memory_back[axis] - file_to_memory[axis];
                }
                None => {}
            }
        }
        check_region_ordered(&self.file, "in-file region")?;
        check_region_ordered(&self.memory, "in-memory region")?;
        self.open.fill(None);
        Ok(())
    }

    /// Returns `true` if no back component is open.
    pub fn is_resolved(&self) -> bool {
        self.open.iter().all(Option::is_none)
    }

    /// The common shape of both regions.
    pub fn shape(&self) -> FitsResult<Position> {
        let file = self.file.shape();
        let memory = self.memory.shape();
        if file != memory {
            fits_bail!(
                ShapeMismatch: "in-file region {} and in-memory region {} differ in shape",
                self.file,
                self.memory
            );
        }
        Ok(file)
    }
}

/// A pair of in-file and in-memory row ranges of the same size.
///
/// An in-file front of `-1` appends the rows after the last row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMemSegments {
    file: Segment,
    memory: Segment,
    open: Option<Side>,
    append: bool,
}

impl FileMemSegments {
    /// Maps the in-file rows to the memory rows starting at `memory_front`.
    pub fn from_file_segment(file: Segment, memory_front: i64) -> Self {
        let open = file.is_max().then_some(Side::File);
        let memory_back = if open.is_some() {
            memory_front
        } else {
            memory_front + file.size() - 1
        };
        Self {
            file,
            memory: Segment::new(memory_front, memory_back),
            open,
            append: false,
        }
    }

    /// Maps the in-memory rows to the file rows starting at `file_front`.
    ///
    /// A `file_front` of `-1` places the rows right after the last row of the table.
    pub fn from_memory_segment(file_front: i64, memory: Segment) -> Self {
        let open = memory.is_max().then_some(Side::Memory);
        let file_back = if open.is_some() {
            file_front
        } else {
            file_front + memory.size() - 1
        };
        Self {
            file: Segment::new(file_front, file_back),
            memory,
            open,
            append: file_front == -1,
        }
    }

    /// Maps all the rows of a table to all the rows of a column.
    pub fn whole() -> Self {
        Self {
            file: Segment::whole(),
            memory: Segment::whole(),
            open: Some(Side::File),
            append: false,
        }
    }

    /// The in-file rows.
    pub fn file(&self) -> Segment {
        self.file
    }

    /// The in-memory rows.
    pub fn memory(&self) -> Segment {
        self.memory
    }

    /// The translation from in-file to in-memory rows.
    pub fn file_to_memory(&self) -> i64 {
        self.memory.front - self.file.front
    }

    /// The translation from in-memory to in-file rows.
    pub fn memory_to_file(&self) -> i64 {
        self.file.front - self.memory.front
    }

    /// Replaces an open back bound and an appending front, like [`FileMemRegions::resolve`].
    ///
    /// An appending in-file front becomes `file_back + 1`.
    pub fn resolve(&mut self, file_back: i64, memory_back: i64) -> FitsResult<()> {
        if self.append {
            self.file.front = file_back + 1;
        }
        match self.open {
            Some(Side::File) => {
                self.file.back = file_back;
                self.memory.back = self.memory.front + self.file.size() - 1;
            }
            Some(Side::Memory) => {
                self.memory.back = memory_back;
                self.file.back = self.file.front + self.memory.size() - 1;
            }
            None => {
                if self.append {
                    self.file.back = self.file.front + self.memory.size() - 1;
                }
            }
        }
        check_ordered(self.file.front, self.file.back, "in-file rows", &self.file)?;
        check_ordered(self.memory.front, self.memory.back, "in-memory rows", &self.memory)?;
        self.open = None;
        self.append = false;
        Ok(())
    }

    /// Returns `true` if neither back bound is open and the in-file front is known.
    pub fn is_resolved(&self) -> bool {
        self.open.is_none() && !self.append
    }

    /// The number of rows, once resolved.
    pub fn size(&self) -> i64 {
        self.file.size()
    }
}

/// A contiguous span of elements, as offsets in the file and in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// The offset of the first element in the data unit.
    pub file_offset: i64,
    /// The offset of the first element in memory.
    pub memory_offset: i64,
    /// The number of elements.
    pub len: i64,
}

/// Splits a resolved mapping between a data unit of shape `file_shape` and a raster of shape
/// `memory_shape` into contiguous runs, in storage order.
///
/// Leading axes are merged into a single run as long as the region spans them fully on both
/// sides.
pub fn runs(
    regions: &FileMemRegions,
    file_shape: &Position,
    memory_shape: &Position,
) -> FitsResult<Vec<Run>> {
    let shape = regions.shape()?;
    let dimension = shape.dimension();
    if file_shape.dimension() != dimension || memory_shape.dimension() != dimension {
        fits_bail!(
            ShapeMismatch: "mapping of shape {} does not fit data unit {} and raster {}",
            shape,
            file_shape,
            memory_shape
        );
    }
    if shape.iter().any(|&length| length <= 0) {
        return Ok(Vec::new());
    }
    if dimension == 0 {
        return Ok(vec![Run {
            file_offset: 0,
            memory_offset: 0,
            len: 1,
        }]);
    }

    let mut merged = 1;
    let mut len = shape[0];
    while merged < dimension
        && shape[merged - 1] == file_shape[merged - 1]
        && shape[merged - 1] == memory_shape[merged - 1]
    {
        len *= shape[merged];
        merged += 1;
    }

    let outer = Region::new(
        Position::zero(dimension - merged),
        Position::new(shape.iter().skip(merged).map(|&length| length - 1)),
    )?;
    let file_front = &regions.file().front;
    let memory_front = &regions.memory().front;
    let mut runs = Vec::new();
    for position in outer.positions() {
        let offset = Position::new(std::iter::repeat_n(0, merged).chain(position.iter().copied()));
        runs.push(Run {
            file_offset: linear_index(file_shape, &(file_front + &offset)),
            memory_offset: linear_index(memory_shape, &(memory_front + &offset)),
            len,
        });
    }
    Ok(runs)
}

/// Splits a row segment into chunks of at most a given number of rows.
///
/// The chunks cover the segment exactly, in order, without overlap.
#[derive(Debug, Clone)]
pub struct RowChunks {
    next: i64,
    back: i64,
    rows_per_chunk: i64,
}

impl RowChunks {
    /// Creates the chunks of a resolved segment, with `rows_per_chunk >= 1`.
    pub fn new(rows: Segment, rows_per_chunk: i64) -> FitsResult<Self> {
        if rows_per_chunk < 1 {
            fits_bail!("chunks must hold at least one row, got {}", rows_per_chunk);
        }
        Ok(Self {
            next: rows.front,
            back: rows.back,
            rows_per_chunk,
        })
    }
}

impl Iterator for RowChunks {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.back {
            return None;
        }
        let front = self.next;
        let back = (front + self.rows_per_chunk - 1).min(self.back);
        self.next = back + 1;
        Some(Segment::new(front, back))
    }
}
