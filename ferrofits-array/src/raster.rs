use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use ferrofits_error::{FitsResult, fits_bail, fits_err, fits_panic};

use crate::{Position, Region};

/// The linear index of `position` in an array of the given `shape`, first axis fastest:
/// `p[0] + s[0] * (p[1] + s[1] * (p[2] + ...))`.
///
/// Bounds are not checked.
pub fn linear_index(shape: &Position, position: &Position) -> i64 {
    shape
        .iter()
        .zip(position.iter())
        .rev()
        .fold(0, |acc, (&s, &p)| p + s * acc)
}

/// Converts a non-negative index or size to `usize`.
pub fn to_usize(value: i64) -> FitsResult<usize> {
    usize::try_from(value).map_err(|_| fits_err!(OutOfBounds: "negative index or size {}", value))
}

/// Backing storage of a [`Raster`] or a [`Column`](crate::Column).
///
/// Owned storage can be resized, borrowed storage cannot.
pub trait Storage<T>: AsRef<[T]> {
    /// Resizes the storage to `len` elements, filling new elements with default values.
    fn resize(&mut self, len: usize) -> FitsResult<()>;
}

impl<T: Clone + Default> Storage<T> for Vec<T> {
    fn resize(&mut self, len: usize) -> FitsResult<()> {
        Vec::resize(self, len, T::default());
        Ok(())
    }
}

impl<T> Storage<T> for &[T] {
    fn resize(&mut self, len: usize) -> FitsResult<()> {
        if len != self.len() {
            fits_bail!(
                ShapeMismatch: "cannot resize borrowed data from {} to {} elements",
                self.len(),
                len
            );
        }
        Ok(())
    }
}

impl<T> Storage<T> for &mut [T] {
    fn resize(&mut self, len: usize) -> FitsResult<()> {
        if len != self.len() {
            fits_bail!(
                ShapeMismatch: "cannot resize borrowed data from {} to {} elements",
                self.len(),
                len
            );
        }
        Ok(())
    }
}

/// An N-dimensional array of `T` with a dynamic shape, first axis fastest.
///
/// The storage `D` is either owned ([`VecRaster`]), an immutable borrow ([`PtrRaster`]) or a
/// mutable borrow ([`PtrRasterMut`]). A borrowed raster neither allocates nor frees its data.
pub struct Raster<T, D = Vec<T>> {
    shape: Position,
    data: D,
    _type: PhantomData<T>,
}

/// A raster which owns its data.
pub type VecRaster<T> = Raster<T, Vec<T>>;

/// A raster which borrows immutable data.
pub type PtrRaster<'a, T> = Raster<T, &'a [T]>;

/// A raster which borrows mutable data.
pub type PtrRasterMut<'a, T> = Raster<T, &'a mut [T]>;

fn check_shape(shape: &Position) -> FitsResult<usize> {
    if let Some(negative) = shape.iter().find(|&&s| s < 0) {
        fits_bail!(
            ShapeMismatch: "negative length {} in shape {}",
            negative,
            shape
        );
    }
    to_usize(shape.shape_size())
}

impl<T: Clone + Default> VecRaster<T> {
    /// Creates a raster filled with default values, i.e. zeros for numbers.
    pub fn new(shape: Position) -> FitsResult<Self> {
        let size = check_shape(&shape)?;
        Ok(Self {
            shape,
            data: vec![T::default(); size],
            _type: PhantomData,
        })
    }
}

impl<T> VecRaster<T> {
    /// Moves the data out.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T, D: AsRef<[T]>> Raster<T, D> {
    /// Creates a raster from its shape and data, which must have `shape_size(shape)` elements.
    pub fn try_new(shape: Position, data: D) -> FitsResult<Self> {
        let size = check_shape(&shape)?;
        if data.as_ref().len() != size {
            fits_bail!(
                ShapeMismatch: "shape {} requires {} elements, got {}",
                shape,
                size,
                data.as_ref().len()
            );
        }
        Ok(Self {
            shape,
            data,
            _type: PhantomData,
        })
    }

    /// The shape.
    pub fn shape(&self) -> &Position {
        &self.shape
    }

    /// The number of axes.
    pub fn dimension(&self) -> usize {
        self.shape.dimension()
    }

    /// The number of elements.
    pub fn size(&self) -> usize {
        self.data.as_ref().len()
    }

    /// The elements, first axis fastest.
    pub fn data(&self) -> &[T] {
        self.data.as_ref()
    }

    /// Iterates over the elements, first axis fastest.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data().iter()
    }

    /// The region covered by the raster: from the origin to `shape - 1`.
    pub fn domain(&self) -> Region {
        Region {
            front: Position::zero(self.dimension()),
            back: &self.shape - 1,
        }
    }

    /// The linear index of a position, without bounds checking.
    pub fn index_of(&self, position: &Position) -> i64 {
        linear_index(&self.shape, position)
    }

    /// Replaces negative components, counted from the end of each axis, and checks bounds.
    fn checked_offset(&self, position: &Position) -> FitsResult<usize> {
        if position.dimension() != self.dimension() {
            fits_bail!(
                ShapeMismatch: "cannot index a {}-dimensional raster with position {}",
                self.dimension(),
                position
            );
        }
        let resolved = position
            .iter()
            .zip(self.shape.iter())
            .map(|(&p, &s)| {
                let i = if p < 0 { p + s } else { p };
                if i < 0 || i >= s {
                    return Err(fits_err!(
                        OutOfBounds: "position {} is out of shape {}",
                        position,
                        self.shape
                    ));
                }
                Ok(i)
            })
            .collect::<FitsResult<Position>>()?;
        to_usize(self.index_of(&resolved))
    }

    fn offset(&self, position: &Position) -> usize {
        let index = self.index_of(position);
        match usize::try_from(index) {
            Ok(i) if i < self.size() => i,
            _ => fits_panic!(
                OutOfBounds: "position {} is out of shape {}",
                position,
                self.shape
            ),
        }
    }

    /// The element at `position`, bounds-checked.
    ///
    /// Negative components count from the end of their axis, e.g. `-1` is the last index.
    pub fn at(&self, position: &Position) -> FitsResult<&T> {
        let offset = self.checked_offset(position)?;
        Ok(&self.data()[offset])
    }

    /// Returns `true` if `region` is a contiguous part of the data: all axes before some axis
    /// `k` are fully covered, and all axes after `k` are flat.
    pub fn is_contiguous(&self, region: &Region) -> bool {
        if region.dimension() != self.dimension() {
            return false;
        }
        let mut partial = false;
        for axis in 0..self.dimension() {
            let (front, back) = (region.front[axis], region.back[axis]);
            if partial {
                if front != back {
                    return false;
                }
            } else if front != 0 || back != self.shape[axis] - 1 {
                partial = true;
            }
        }
        true
    }

    fn check_slice(&self, region: &Region) -> FitsResult<std::ops::Range<usize>> {
        let domain = self.domain();
        if region.dimension() != self.dimension() {
            fits_bail!(
                ShapeMismatch: "cannot slice a {}-dimensional raster with region {}",
                self.dimension(),
                region
            );
        }
        if region.size() == 0 {
            fits_bail!("cannot slice empty region {}", region);
        }
        if !domain.contains(&region.front) || !domain.contains(&region.back) {
            fits_bail!(OutOfBounds: "region {} is out of shape {}", region, self.shape);
        }
        if !self.is_contiguous(region) {
            fits_bail!("region {} is not contiguous in shape {}", region, self.shape);
        }
        let front = to_usize(self.index_of(&region.front))?;
        let back = to_usize(self.index_of(&region.back))?;
        Ok(front..back + 1)
    }

    /// A borrowed view of a contiguous region, with the shape of the region.
    pub fn slice(&self, region: &Region) -> FitsResult<PtrRaster<'_, T>> {
        let range = self.check_slice(region)?;
        PtrRaster::try_new(region.shape(), &self.data()[range])
    }

    fn section_region(&self, front: i64, back: i64) -> FitsResult<Region> {
        let Some(last) = self.dimension().checked_sub(1) else {
            fits_bail!("cannot take a section of a 0-dimensional raster");
        };
        let length = self.shape[last];
        let resolve = |i: i64| if i < 0 { i + length } else { i };
        let mut region = self.domain();
        region.front[last] = resolve(front);
        region.back[last] = resolve(back);
        Ok(region)
    }

    /// A borrowed `N-1`-dimensional view of the plane at `index` along the last axis.
    ///
    /// A negative index counts from the end.
    pub fn section(&self, index: i64) -> FitsResult<PtrRaster<'_, T>> {
        let region = self.section_region(index, index)?;
        let range = self.check_slice(&region)?;
        PtrRaster::try_new(region.shape().slice(self.dimension() - 1)?, &self.data()[range])
    }

    /// A borrowed view of the planes from `front` to `back` (inclusive) along the last axis.
    pub fn section_range(&self, front: i64, back: i64) -> FitsResult<PtrRaster<'_, T>> {
        let region = self.section_region(front, back)?;
        self.slice(&region)
    }

    /// A borrowed `N-1`-dimensional view of the hyperplane at `index` along `axis`.
    ///
    /// Only hyperplanes which are contiguous in memory can be viewed, which is always the case
    /// for the last axis, or when every axis after `axis` has length one.
    pub fn section_along(&self, axis: usize, index: i64) -> FitsResult<PtrRaster<'_, T>> {
        if axis >= self.dimension() {
            fits_bail!(OutOfBounds: "axis {} of a {}-dimensional raster", axis, self.dimension());
        }
        let mut region = self.domain();
        let index = if index < 0 { index + self.shape[axis] } else { index };
        region.front[axis] = index;
        region.back[axis] = index;
        let range = self.check_slice(&region)?;
        let shape = region
            .shape()
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| (i != axis).then_some(s))
            .collect();
        PtrRaster::try_new(shape, &self.data()[range])
    }

    /// A borrowed view of the whole raster.
    pub fn as_ptr_raster(&self) -> PtrRaster<'_, T> {
        Raster {
            shape: self.shape.clone(),
            data: self.data(),
            _type: PhantomData,
        }
    }

    /// Copies the raster into an owned one.
    pub fn to_owned_raster(&self) -> VecRaster<T>
    where
        T: Clone,
    {
        Raster {
            shape: self.shape.clone(),
            data: self.data().to_vec(),
            _type: PhantomData,
        }
    }
}

impl<T, D: AsRef<[T]> + AsMut<[T]>> Raster<T, D> {
    /// The elements, mutably.
    pub fn data_mut(&mut self) -> &mut [T] {
        self.data.as_mut()
    }

    /// Iterates mutably over the elements.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data_mut().iter_mut()
    }

    /// The element at `position`, bounds-checked, mutably.
    ///
    /// Negative components count from the end of their axis.
    pub fn at_mut(&mut self, position: &Position) -> FitsResult<&mut T> {
        let offset = self.checked_offset(position)?;
        Ok(&mut self.data_mut()[offset])
    }

    /// A mutable view of a contiguous region.
    pub fn slice_mut(&mut self, region: &Region) -> FitsResult<PtrRasterMut<'_, T>> {
        let range = self.check_slice(region)?;
        PtrRasterMut::try_new(region.shape(), &mut self.data_mut()[range])
    }

    /// A mutable `N-1`-dimensional view of the plane at `index` along the last axis.
    pub fn section_mut(&mut self, index: i64) -> FitsResult<PtrRasterMut<'_, T>> {
        let region = self.section_region(index, index)?;
        let range = self.check_slice(&region)?;
        let shape = region.shape().slice(self.dimension() - 1)?;
        PtrRasterMut::try_new(shape, &mut self.data_mut()[range])
    }

    /// A mutable view of the whole raster.
    pub fn as_ptr_raster_mut(&mut self) -> PtrRasterMut<'_, T> {
        Raster {
            shape: self.shape.clone(),
            data: self.data.as_mut(),
            _type: PhantomData,
        }
    }
}

impl<T, D: Storage<T>> Raster<T, D> {
    /// Changes the shape.
    ///
    /// Owned rasters reallocate (new elements are default-initialized); borrowed rasters only
    /// accept shapes with the same number of elements.
    pub fn reshape(&mut self, shape: Position) -> FitsResult<()> {
        let size = check_shape(&shape)?;
        self.data.resize(size)?;
        self.shape = shape;
        Ok(())
    }
}

impl<T, D: AsRef<[T]>> Index<&Position> for Raster<T, D> {
    type Output = T;

    fn index(&self, position: &Position) -> &T {
        &self.data()[self.offset(position)]
    }
}

impl<T, D: AsRef<[T]> + AsMut<[T]>> IndexMut<&Position> for Raster<T, D> {
    fn index_mut(&mut self, position: &Position) -> &mut T {
        let offset = self.offset(position);
        &mut self.data_mut()[offset]
    }
}

impl<T: PartialEq, D: AsRef<[T]>, E: AsRef<[T]>> PartialEq<Raster<T, E>> for Raster<T, D> {
    fn eq(&self, other: &Raster<T, E>) -> bool {
        self.shape == other.shape && self.data() == other.data()
    }
}

impl<T: Clone, D: Clone> Clone for Raster<T, D> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: Debug, D: AsRef<[T]>> Debug for Raster<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("shape", &self.shape)
            .field("data", &self.data())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::pos;

    fn iota(shape: Position) -> VecRaster<i32> {
        let size = usize::try_from(shape.shape_size()).unwrap();
        let data = (0..i32::try_from(size).unwrap()).collect::<Vec<_>>();
        VecRaster::try_new(shape, data).unwrap()
    }

    #[rstest]
    #[case(pos![4], pos![3], 3)]
    #[case(pos![3, 2], pos![1, 1], 4)]
    #[case(pos![2, 3, 4], pos![1, 2, 3], 23)]
    #[case(pos![], pos![], 0)]
    fn linear_index_is_first_axis_fastest(
        #[case] shape: Position,
        #[case] position: Position,
        #[case] expected: i64,
    ) {
        assert_eq!(linear_index(&shape, &position), expected);
    }

    #[test]
    fn new_is_zero_filled() {
        let raster = VecRaster::<f32>::new(pos![3, 2]).unwrap();
        assert_eq!(raster.size(), 6);
        assert!(raster.iter().all(|&v| v == 0.0));
        assert!(VecRaster::<f32>::new(pos![3, -2]).is_err());
        assert!(VecRaster::<u8>::try_new(pos![2], vec![1, 2, 3]).is_err());
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let raster = iota(pos![5]);
        assert_eq!(raster.at(&pos![-1]).unwrap(), raster.at(&pos![4]).unwrap());
        assert_eq!(*raster.at(&pos![-5]).unwrap(), 0);
        assert!(raster.at(&pos![-6]).unwrap_err().is_out_of_bounds());
        assert!(raster.at(&pos![5]).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn at_mut_and_index_mut() {
        let mut raster = iota(pos![3, 2]);
        *raster.at_mut(&pos![-1, -1]).unwrap() = 42;
        raster[&pos![0, 0]] = -1;
        assert_eq!(raster.data(), &[-1, 1, 2, 3, 4, 42]);
        assert_eq!(raster[&pos![2, 1]], 42);
    }

    #[test]
    fn section_fixes_last_axis() {
        let raster = iota(pos![2, 3, 4]);
        let plane = raster.section(1).unwrap();
        assert_eq!(plane.shape(), &pos![2, 3]);
        assert_eq!(plane.data(), &(6..12).collect::<Vec<i32>>()[..]);
        assert_eq!(raster.section(-1).unwrap().data()[0], 18);
        assert!(raster.section(4).is_err());
        let planes = raster.section_range(1, 2).unwrap();
        assert_eq!(planes.shape(), &pos![2, 3, 2]);
        assert_eq!(planes.data().first(), Some(&6));
    }

    #[test]
    fn section_mut_shares_storage() {
        let mut raster = iota(pos![2, 2]);
        raster.section_mut(0).unwrap().iter_mut().for_each(|v| *v = 0);
        assert_eq!(raster.data(), &[0, 0, 2, 3]);
    }

    #[test]
    fn slice_requires_contiguity() {
        let raster = iota(pos![4, 3]);
        let row = Region::new(pos![1, 1], pos![3, 1]).unwrap();
        assert!(raster.is_contiguous(&row));
        assert_eq!(raster.slice(&row).unwrap().data(), &[5, 6, 7]);
        let block = Region::new(pos![1, 0], pos![2, 1]).unwrap();
        assert!(!raster.is_contiguous(&block));
        assert!(raster.slice(&block).is_err());
        let outside = Region::new(pos![0, 2], pos![3, 3]).unwrap();
        assert!(raster.slice(&outside).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn section_along_first_axis_of_flat_raster() {
        let raster = iota(pos![3, 1]);
        let column = raster.section_along(0, 2).unwrap();
        assert_eq!(column.shape(), &pos![1]);
        assert_eq!(column.data(), &[2]);
        assert!(iota(pos![3, 2]).section_along(0, 1).is_err());
        assert_eq!(iota(pos![3, 2]).section_along(1, 1).unwrap().data(), &[3, 4, 5]);
    }

    #[test]
    fn reshape_owned_and_borrowed() {
        let mut owned = iota(pos![2, 2]);
        owned.reshape(pos![3, 2]).unwrap();
        assert_eq!(owned.data(), &[0, 1, 2, 3, 0, 0]);

        let data = [1, 2, 3, 4];
        let mut borrowed = PtrRaster::try_new(pos![2, 2], &data[..]).unwrap();
        borrowed.reshape(pos![4]).unwrap();
        assert_eq!(borrowed.shape(), &pos![4]);
        assert!(borrowed.reshape(pos![5]).unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn equality_across_storages() {
        let owned = iota(pos![2, 3]);
        let data = owned.data().to_vec();
        let borrowed = PtrRaster::try_new(pos![2, 3], data.as_slice()).unwrap();
        assert_eq!(owned, borrowed);
        assert_ne!(owned, PtrRaster::try_new(pos![3, 2], data.as_slice()).unwrap());
        assert_eq!(borrowed.to_owned_raster(), owned);
    }
}
