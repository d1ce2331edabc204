use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, AddAssign, Deref, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub, SubAssign};

use ferrofits_error::{FitsResult, fits_bail, fits_err, fits_panic};
use itertools::Itertools;
use smallvec::SmallVec;

/// An N-dimensional position, shape or offset.
///
/// The dimension is dynamic, with up to four components stored inline. Components are `i64`:
/// shapes are non-negative, offsets may be negative, and `-1` is used as a sentinel for
/// "unknown until resolved" back positions (see [`Position::max`]).
///
/// # Panics
///
/// The arithmetic operators (`+`, `-`, `*`, `/` and their assigning forms) between two positions
/// panic if the dimensions differ. Use [`Position::checked_add`] and its siblings where the
/// dimensions come from user input.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Position(SmallVec<[i64; 4]>);

/// Creates a [`Position`] from a list of components.
///
/// ```
/// use ferrofits_array::pos;
///
/// let shape = pos![3, 2];
/// assert_eq!(shape.shape_size(), 6);
/// ```
#[macro_export]
macro_rules! pos {
    ($($x:expr),* $(,)?) => {
        $crate::Position::from_slice(&[$($x),*])
    };
}

impl Position {
    /// Creates a position from its components.
    pub fn new(indices: impl IntoIterator<Item = i64>) -> Self {
        Self(indices.into_iter().collect())
    }

    /// Creates a position from a slice of components.
    pub fn from_slice(indices: &[i64]) -> Self {
        Self(SmallVec::from_slice(indices))
    }

    /// Creates a position with every component set to `value`.
    pub fn filled(dimension: usize, value: i64) -> Self {
        Self(SmallVec::from_elem(value, dimension))
    }

    /// The origin.
    pub fn zero(dimension: usize) -> Self {
        Self::filled(dimension, 0)
    }

    /// The position with every component set to one, e.g. the shape of a single pixel.
    pub fn one(dimension: usize) -> Self {
        Self::filled(dimension, 1)
    }

    /// The sentinel position, with every component set to `-1`.
    pub fn max(dimension: usize) -> Self {
        Self::filled(dimension, -1)
    }

    /// The number of components.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&i| i == 0)
    }

    /// Returns `true` if every component is the `-1` sentinel.
    pub fn is_max(&self) -> bool {
        self.0.iter().all(|&i| i == -1)
    }

    /// The number of elements in an array of this shape: the product of the components.
    ///
    /// The shape of dimension 0 has one element.
    pub fn shape_size(&self) -> i64 {
        self.0.iter().product()
    }

    /// The components.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Appends a component.
    pub fn push(&mut self, index: i64) {
        self.0.push(index);
    }

    /// Keeps the first `dimension` components.
    pub fn slice(&self, dimension: usize) -> FitsResult<Self> {
        if dimension > self.dimension() {
            fits_bail!(
                ShapeMismatch: "cannot slice {}-dimensional position {} to {} dimensions",
                self.dimension(),
                self,
                dimension
            );
        }
        Ok(Self::from_slice(&self.0[..dimension]))
    }

    /// Copies this position into a position of the dimension of `padding`, whose trailing
    /// components are taken from `padding`.
    pub fn extend(&self, padding: &Position) -> FitsResult<Self> {
        if padding.dimension() < self.dimension() {
            fits_bail!(
                ShapeMismatch: "cannot extend {}-dimensional position {} to {} dimensions",
                self.dimension(),
                self,
                padding.dimension()
            );
        }
        Ok(self
            .0
            .iter()
            .chain(&padding.0[self.dimension()..])
            .copied()
            .collect())
    }

    fn zip_with(&self, rhs: &Position, op: impl Fn(i64, i64) -> Option<i64>) -> FitsResult<Self> {
        if self.dimension() != rhs.dimension() {
            fits_bail!(
                ShapeMismatch: "dimension mismatch between {} and {}",
                self,
                rhs
            );
        }
        self.0
            .iter()
            .zip(&rhs.0)
            .map(|(&l, &r)| op(l, r).ok_or_else(|| fits_err!("arithmetic overflow between {} and {}", self, rhs)))
            .collect()
    }

    /// Component-wise sum, failing on dimension mismatch.
    pub fn checked_add(&self, rhs: &Position) -> FitsResult<Self> {
        self.zip_with(rhs, i64::checked_add)
    }

    /// Component-wise difference, failing on dimension mismatch.
    pub fn checked_sub(&self, rhs: &Position) -> FitsResult<Self> {
        self.zip_with(rhs, i64::checked_sub)
    }

    /// Component-wise product, failing on dimension mismatch.
    pub fn checked_mul(&self, rhs: &Position) -> FitsResult<Self> {
        self.zip_with(rhs, i64::checked_mul)
    }

    /// Component-wise quotient, failing on dimension mismatch or division by zero.
    pub fn checked_div(&self, rhs: &Position) -> FitsResult<Self> {
        self.zip_with(rhs, i64::checked_div)
    }
}

impl Deref for Position {
    type Target = [i64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Index<usize> for Position {
    type Output = i64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Position {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const N: usize> From<[i64; N]> for Position {
    fn from(value: [i64; N]) -> Self {
        Self::from_slice(&value)
    }
}

impl From<Vec<i64>> for Position {
    fn from(value: Vec<i64>) -> Self {
        Self(SmallVec::from_vec(value))
    }
}

impl From<&[i64]> for Position {
    fn from(value: &[i64]) -> Self {
        Self::from_slice(value)
    }
}

impl FromIterator<i64> for Position {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Position {
    type Item = &'a i64;
    type IntoIter = std::slice::Iter<'a, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}

impl Debug for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

macro_rules! position_op {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident) => {
        impl $OpAssign<&Position> for Position {
            fn $op_assign(&mut self, rhs: &Position) {
                if self.dimension() != rhs.dimension() {
                    fits_panic!(ShapeMismatch: "dimension mismatch between {} and {}", self, rhs);
                }
                self.0.iter_mut().zip(&rhs.0).for_each(|(l, r)| l.$op_assign(*r));
            }
        }

        impl $OpAssign<Position> for Position {
            fn $op_assign(&mut self, rhs: Position) {
                self.$op_assign(&rhs);
            }
        }

        impl $OpAssign<i64> for Position {
            fn $op_assign(&mut self, rhs: i64) {
                self.0.iter_mut().for_each(|l| l.$op_assign(rhs));
            }
        }

        impl $Op<&Position> for &Position {
            type Output = Position;

            fn $op(self, rhs: &Position) -> Position {
                let mut out = self.clone();
                out.$op_assign(rhs);
                out
            }
        }

        impl $Op<&Position> for Position {
            type Output = Position;

            fn $op(mut self, rhs: &Position) -> Position {
                self.$op_assign(rhs);
                self
            }
        }

        impl $Op<Position> for Position {
            type Output = Position;

            fn $op(mut self, rhs: Position) -> Position {
                self.$op_assign(&rhs);
                self
            }
        }

        impl $Op<i64> for &Position {
            type Output = Position;

            fn $op(self, rhs: i64) -> Position {
                let mut out = self.clone();
                out.$op_assign(rhs);
                out
            }
        }

        impl $Op<i64> for Position {
            type Output = Position;

            fn $op(mut self, rhs: i64) -> Position {
                self.$op_assign(rhs);
                self
            }
        }
    };
}

position_op!(Add, add, AddAssign, add_assign);
position_op!(Sub, sub, SubAssign, sub_assign);
position_op!(Mul, mul, MulAssign, mul_assign);
position_op!(Div, div, DivAssign, div_assign);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn constants() {
        assert!(Position::zero(3).is_zero());
        assert!(Position::max(2).is_max());
        assert!(!pos![-1, 0].is_max());
        assert_eq!(Position::one(4).shape_size(), 1);
        assert_eq!(Position::zero(0).shape_size(), 1);
        assert_eq!(pos![3, 0, 2].shape_size(), 0);
    }

    #[test]
    fn arithmetic() {
        let a = pos![1, 2, 3];
        let b = pos![4, 5, 6];
        assert_eq!(&a + &b, pos![5, 7, 9]);
        assert_eq!(&b - &a, pos![3, 3, 3]);
        assert_eq!(&a * &b, pos![4, 10, 18]);
        assert_eq!(&b / &a, pos![4, 2, 2]);
        assert_eq!(&a + 1, pos![2, 3, 4]);
        assert_eq!(a.clone() * 2, pos![2, 4, 6]);
        assert_eq!(b - 1, pos![3, 4, 5]);
    }

    #[test]
    fn checked_arithmetic() {
        let err = pos![1, 2].checked_add(&pos![1, 2, 3]).unwrap_err();
        assert!(err.is_shape_mismatch());
        assert!(pos![1].checked_div(&pos![0]).is_err());
        assert_eq!(pos![6, 4].checked_div(&pos![3, 2]).unwrap(), pos![2, 2]);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn operator_panics_on_dimension_mismatch() {
        let _ = pos![1, 2] + pos![1];
    }

    #[rstest]
    #[case(pos![1, 2], pos![0, 0, 7, 8], pos![1, 2, 7, 8])]
    #[case(pos![1, 2], pos![9, 9], pos![1, 2])]
    #[case(pos![], pos![3], pos![3])]
    fn extend(#[case] position: Position, #[case] padding: Position, #[case] expected: Position) {
        assert_eq!(position.extend(&padding).unwrap(), expected);
    }

    #[test]
    fn extend_and_slice_reject_wrong_dimensions() {
        assert!(pos![1, 2, 3].extend(&pos![0, 0]).is_err());
        assert!(pos![1, 2].slice(3).is_err());
        assert_eq!(pos![1, 2, 3].slice(2).unwrap(), pos![1, 2]);
    }

    #[test]
    fn display() {
        assert_eq!(pos![3, -1].to_string(), "[3, -1]");
    }
}
