use ferrofits_array::{Position, Raster, Region, VecRaster, to_usize};
use ferrofits_dtype::{PixelType, ValueType};
use ferrofits_error::{FitsResult, ResultExt, fits_bail};
use ferrofits_io::{StatusContext, Transport};

use crate::mapping::{FileMemRegions, runs};

/// A handle to the image data unit of the current HDU.
///
/// Whole-image transfers are single transport calls. Region transfers go through a
/// [`FileMemRegions`] mapping, which is resolved against the image and raster shapes and split
/// into contiguous runs.
///
/// Rasters of lower dimension than the image are extended with trailing axes of length 1, so
/// that e.g. a plane can be written into a cube.
pub struct ImageRaster<'a, H: Transport> {
    transport: &'a mut H,
}

fn check_within(region: &Region, shape: &Position, side: &str) -> FitsResult<()> {
    let inside = (0..region.dimension())
        .all(|axis| region.front[axis] >= 0 && region.back[axis] < shape[axis]);
    if !inside {
        fits_bail!(OutOfBounds: "{} region {} exceeds shape {}", side, region, shape);
    }
    Ok(())
}

impl<'a, H: Transport> ImageRaster<'a, H> {
    /// Creates a handle to the image of the current HDU.
    pub fn new(transport: &'a mut H) -> Self {
        Self { transport }
    }

    /// The shape of the image.
    pub fn read_shape(&self) -> FitsResult<Position> {
        let (_, shape) = self
            .transport
            .image_type_shape()
            .context("cannot read image shape")?;
        Ok(Position::from(shape))
    }

    /// The number of pixels.
    pub fn read_size(&self) -> FitsResult<i64> {
        Ok(self.read_shape()?.shape_size())
    }

    /// The pixel type.
    pub fn read_value_type(&self) -> FitsResult<ValueType> {
        let (bitpix, _) = self
            .transport
            .image_type_shape()
            .context("cannot read image type")?;
        Ok(bitpix.value_type())
    }

    fn check_writable(&self) -> FitsResult<()> {
        let mode = self.transport.mode();
        if !mode.is_writable() {
            fits_bail!(ReadOnly: "cannot write pixels in a {} image", mode);
        }
        Ok(())
    }

    /// Changes the pixel type and shape of the image.
    pub fn update_type_shape<T: PixelType>(&mut self, shape: &Position) -> FitsResult<()> {
        self.check_writable()?;
        log::debug!("resizing image to {} with BITPIX {}", shape, T::BITPIX);
        self.transport
            .resize_image(T::BITPIX, shape)
            .with_context(|| format!("cannot resize image to {shape}"))
    }

    /// Reads the whole image.
    pub fn read<T: PixelType>(&self) -> FitsResult<VecRaster<T>> {
        let mut raster = VecRaster::new(self.read_shape()?)?;
        self.read_to(&mut raster)?;
        Ok(raster)
    }

    /// Reads the whole image into a raster with as many pixels.
    pub fn read_to<T: PixelType, D: AsRef<[T]> + AsMut<[T]>>(
        &self,
        raster: &mut Raster<T, D>,
    ) -> FitsResult<()> {
        let size = self.read_size()?;
        if to_usize(size)? != raster.size() {
            fits_bail!(
                ShapeMismatch: "cannot read {} pixels into a raster of shape {}",
                size,
                raster.shape()
            );
        }
        if size == 0 {
            return Ok(());
        }
        self.transport
            .read_pixels(1, T::as_values_mut(raster.data_mut()))
            .context("cannot read image")
    }

    /// Reads a region of the image, where `-1` back components extend to the end of the image.
    pub fn read_region<T: PixelType>(&self, region: &Region) -> FitsResult<VecRaster<T>> {
        let shape = self.read_shape()?;
        let mut regions =
            FileMemRegions::from_file_region(region.clone(), Position::zero(region.dimension()))?;
        let back = &shape - 1;
        regions.resolve(&back, &back)?;
        let mut raster = VecRaster::new(regions.shape()?)?;
        self.read_region_to(&regions, &mut raster)?;
        Ok(raster)
    }

    /// Reads a region of the image into a region of a raster.
    pub fn read_region_to<T: PixelType, D: AsRef<[T]> + AsMut<[T]>>(
        &self,
        regions: &FileMemRegions,
        raster: &mut Raster<T, D>,
    ) -> FitsResult<()> {
        let file_shape = self.read_shape()?;
        let (regions, memory_shape) = self.plan(regions, &file_shape, raster.shape())?;
        let runs = runs(&regions, &file_shape, &memory_shape)?;
        log::debug!("reading image region {} in {} runs", regions.file(), runs.len());
        let data = raster.data_mut();
        for run in runs {
            let front = to_usize(run.memory_offset)?;
            let values = &mut data[front..front + to_usize(run.len)?];
            self.transport
                .read_pixels(run.file_offset + 1, T::as_values_mut(values))
                .with_context(|| format!("cannot read {} pixels", run.len))?;
        }
        Ok(())
    }

    /// Writes a raster with as many pixels as the image.
    pub fn write<T: PixelType, D: AsRef<[T]>>(&mut self, raster: &Raster<T, D>) -> FitsResult<()> {
        self.check_writable()?;
        let size = self.read_size()?;
        if to_usize(size)? != raster.size() {
            fits_bail!(
                ShapeMismatch: "cannot write a raster of shape {} into {} pixels",
                raster.shape(),
                size
            );
        }
        if size == 0 {
            return Ok(());
        }
        self.transport
            .write_pixels(1, T::as_values(raster.data()))
            .context("cannot write image")
    }

    /// Writes a region of a raster into a region of the image.
    pub fn write_region<T: PixelType, D: AsRef<[T]>>(
        &mut self,
        regions: &FileMemRegions,
        raster: &Raster<T, D>,
    ) -> FitsResult<()> {
        self.check_writable()?;
        let file_shape = self.read_shape()?;
        let (regions, memory_shape) = self.plan(regions, &file_shape, raster.shape())?;
        let runs = runs(&regions, &file_shape, &memory_shape)?;
        log::debug!("writing image region {} in {} runs", regions.file(), runs.len());
        let data = raster.data();
        for run in runs {
            let front = to_usize(run.memory_offset)?;
            let values = &data[front..front + to_usize(run.len)?];
            self.transport
                .write_pixels(run.file_offset + 1, T::as_values(values))
                .with_context(|| format!("cannot write {} pixels", run.len))?;
        }
        Ok(())
    }

    /// Writes a whole raster into the image, starting at `front`.
    pub fn write_at<T: PixelType, D: AsRef<[T]>>(
        &mut self,
        front: &Position,
        raster: &Raster<T, D>,
    ) -> FitsResult<()> {
        let memory_shape = raster.shape().extend(&Position::one(front.dimension()))?;
        let memory = Region::from_shape(Position::zero(front.dimension()), &memory_shape)?;
        let regions = FileMemRegions::from_memory_region(front.clone(), memory)?;
        self.write_region(&regions, raster)
    }

    /// Extends the raster shape to the image dimension, resolves the mapping and checks that both
    /// sides are in bounds.
    fn plan(
        &self,
        regions: &FileMemRegions,
        file_shape: &Position,
        raster_shape: &Position,
    ) -> FitsResult<(FileMemRegions, Position)> {
        let memory_shape = raster_shape
            .extend(&Position::one(file_shape.dimension()))
            .with_context(|| {
                format!("cannot map a raster of shape {raster_shape} into an image of shape {file_shape}")
            })?;
        let mut regions = regions.clone();
        regions.resolve(&(file_shape - 1), &(&memory_shape - 1))?;
        let shape = regions.shape()?;
        if shape.iter().all(|&length| length > 0) {
            check_within(regions.file(), file_shape, "in-file")?;
            check_within(regions.memory(), &memory_shape, "in-memory")?;
        }
        Ok((regions, memory_shape))
    }
}
