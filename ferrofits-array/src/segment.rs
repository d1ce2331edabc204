use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};

/// A range of rows or elements, both bounds inclusive.
///
/// A back bound equal to `-1` is a sentinel for "up to the last row".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// The first index.
    pub front: i64,
    /// The last index, inclusive.
    pub back: i64,
}

impl Segment {
    /// Creates a segment from its bounds.
    pub fn new(front: i64, back: i64) -> Self {
        Self { front, back }
    }

    /// Creates a segment from its front index and size.
    pub fn from_size(front: i64, size: i64) -> Self {
        Self {
            front,
            back: front + size - 1,
        }
    }

    /// The segment which covers a whole sequence, whatever its length.
    pub fn whole() -> Self {
        Self { front: 0, back: -1 }
    }

    /// The number of indices, `back - front + 1`.
    pub fn size(&self) -> i64 {
        self.back - self.front + 1
    }

    /// Returns `true` if the back bound is the sentinel.
    pub fn is_max(&self) -> bool {
        self.back == -1
    }
}

impl Add<i64> for Segment {
    type Output = Segment;

    fn add(self, rhs: i64) -> Segment {
        Segment::new(self.front + rhs, self.back + rhs)
    }
}

impl Sub<i64> for Segment {
    type Output = Segment;

    fn sub(self, rhs: i64) -> Segment {
        Segment::new(self.front - rhs, self.back - rhs)
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.front, self.back)
    }
}
