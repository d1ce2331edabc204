use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};

use ferrofits_error::{FitsResult, fits_bail};

use crate::Position;

/// An N-dimensional box, given by its front and back positions, both inclusive.
///
/// Back components equal to `-1` are a sentinel for "up to the end of the container", resolved
/// against the actual extent when reading or writing.
///
/// # Panics
///
/// Translating a region with `+` or `-` by a position of another dimension panics, like the
/// operators of [`Position`]. [`Region::translate`] fails instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// The front (lowest) position.
    pub front: Position,
    /// The back (highest) position, inclusive.
    pub back: Position,
}

impl Region {
    /// Creates a region from its front and back positions.
    pub fn new(front: Position, back: Position) -> FitsResult<Self> {
        if front.dimension() != back.dimension() {
            fits_bail!(
                ShapeMismatch: "region front {} and back {} differ in dimension",
                front,
                back
            );
        }
        Ok(Self { front, back })
    }

    /// Creates a region from its front position and shape.
    pub fn from_shape(front: Position, shape: &Position) -> FitsResult<Self> {
        let back = front.checked_add(shape)?.checked_sub(&Position::one(shape.dimension()))?;
        Ok(Self { front, back })
    }

    /// The region which covers a whole container, whatever its extent.
    pub fn whole(dimension: usize) -> Self {
        Self {
            front: Position::zero(dimension),
            back: Position::max(dimension),
        }
    }

    /// The number of axes.
    pub fn dimension(&self) -> usize {
        self.front.dimension()
    }

    /// The shape, i.e. `back - front + 1`.
    pub fn shape(&self) -> Position {
        &(&self.back - &self.front) + 1
    }

    /// The number of positions in the region.
    pub fn size(&self) -> i64 {
        self.shape().shape_size()
    }

    /// Returns `true` if the back position is the sentinel.
    pub fn is_max(&self) -> bool {
        self.back.is_max()
    }

    /// Returns `true` if the position lies in the region.
    pub fn contains(&self, position: &Position) -> bool {
        position.dimension() == self.dimension()
            && position
                .iter()
                .zip(self.front.iter().zip(self.back.iter()))
                .all(|(p, (f, b))| f <= p && p <= b)
    }

    /// Translates the region by `offset`, failing on dimension mismatch or overflow.
    pub fn translate(&self, offset: &Position) -> FitsResult<Self> {
        Ok(Self {
            front: self.front.checked_add(offset)?,
            back: self.back.checked_add(offset)?,
        })
    }

    /// Iterates over the positions of the region, first axis fastest.
    pub fn positions(&self) -> Positions {
        Positions::new(self.clone())
    }
}

impl Add<&Position> for &Region {
    type Output = Region;

    fn add(self, rhs: &Position) -> Region {
        Region {
            front: &self.front + rhs,
            back: &self.back + rhs,
        }
    }
}

impl Sub<&Position> for &Region {
    type Output = Region;

    fn sub(self, rhs: &Position) -> Region {
        Region {
            front: &self.front - rhs,
            back: &self.back - rhs,
        }
    }
}

impl Add<i64> for &Region {
    type Output = Region;

    fn add(self, rhs: i64) -> Region {
        Region {
            front: &self.front + rhs,
            back: &self.back + rhs,
        }
    }
}

impl Sub<i64> for &Region {
    type Output = Region;

    fn sub(self, rhs: i64) -> Region {
        Region {
            front: &self.front - rhs,
            back: &self.back - rhs,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.front, self.back)
    }
}

/// Iterator over the positions of a [`Region`], first axis fastest.
pub struct Positions {
    region: Region,
    current: Option<Position>,
}

impl Positions {
    fn new(region: Region) -> Self {
        let current = (region.size() > 0).then(|| region.front.clone());
        Self { region, current }
    }
}

impl Iterator for Positions {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let mut next = current.clone();
        for axis in 0..next.dimension() {
            if next[axis] < self.region.back[axis] {
                next[axis] += 1;
                self.current = Some(next);
                return Some(current);
            }
            next[axis] = self.region.front[axis];
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos;

    #[test]
    fn from_shape_and_back() {
        let region = Region::from_shape(pos![1, 2], &pos![3, 4]).unwrap();
        assert_eq!(region.back, pos![3, 5]);
        assert_eq!(region.shape(), pos![3, 4]);
        assert_eq!(region.size(), 12);
        assert!(Region::from_shape(pos![1, 2], &pos![3]).is_err());
    }

    #[test]
    fn whole_is_max() {
        let whole = Region::whole(3);
        assert!(whole.is_max());
        assert!(whole.front.is_zero());
        assert!(!Region::from_shape(pos![0], &pos![2]).unwrap().is_max());
    }

    #[test]
    fn translation() {
        let region = Region::new(pos![0, 0], pos![2, 3]).unwrap();
        let moved = &region + &pos![1, -1];
        assert_eq!(moved, Region::new(pos![1, -1], pos![3, 2]).unwrap());
        assert_eq!(&moved - 1, Region::new(pos![0, -2], pos![2, 1]).unwrap());
        assert!(Region::new(pos![0], pos![1, 2]).is_err());
    }

    #[test]
    fn checked_translation() {
        let region = Region::new(pos![0, 0], pos![2, 3]).unwrap();
        assert_eq!(region.translate(&pos![1, -1]).unwrap(), &region + &pos![1, -1]);
        assert!(region.translate(&pos![1]).unwrap_err().is_shape_mismatch());
        assert!(region.translate(&pos![i64::MAX, 0]).is_err());
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn translation_operator_panics_on_dimension_mismatch() {
        let _ = &Region::whole(2) + &pos![1, 2, 3];
    }

    #[test]
    fn positions_are_ordered_first_axis_fastest() {
        let region = Region::new(pos![1, 0], pos![2, 1]).unwrap();
        let positions = region.positions().collect::<Vec<_>>();
        assert_eq!(
            positions,
            vec![pos![1, 0], pos![2, 0], pos![1, 1], pos![2, 1]]
        );
        assert!(positions.iter().all(|p| region.contains(p)));
        assert!(!region.contains(&pos![0, 0]));
    }

    #[test]
    fn empty_region_has_no_positions() {
        let region = Region::from_shape(pos![0, 0], &pos![0, 3]).unwrap();
        assert_eq!(region.size(), 0);
        assert_eq!(region.positions().count(), 0);
    }
}
