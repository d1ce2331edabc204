#![deny(missing_docs)]

//! In-memory data containers of Ferrofits.
//!
//! - [`Position`], [`Region`] and [`Segment`] are the coordinate algebra: N-dimensional
//!   positions and boxes, and 1-dimensional row ranges.
//! - [`Raster`] is an N-dimensional array over owned or borrowed storage.
//! - [`Column`] is a table column: a [`ColumnInfo`] plus the values of its rows.
//!
//! Nothing here performs I/O; the containers are read and written by the handles of
//! `ferrofits-file`.

pub use column::*;
pub use position::*;
pub use raster::*;
pub use region::*;
pub use segment::*;

mod column;
mod position;
mod raster;
mod region;
mod segment;
