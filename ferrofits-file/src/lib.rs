#![deny(missing_docs)]

//! Handles to the header, image and binary table of the current HDU of a container.
//!
//! Each handle mutably borrows a [`Transport`](ferrofits_io::Transport) for its lifetime, so
//! a single handle at a time can access a container:
//! - [`Header`] reads, parses and writes keyword records, formatting them as 80-character cards;
//! - [`ImageRaster`] reads and writes rasters, whole or by region;
//! - [`BintableColumns`] reads and writes columns, whole, by row segment, or several at once.
//!
//! Region and row mappings between the container and memory are described by [`FileMemRegions`]
//! and [`FileMemSegments`].

pub use bintable::*;
pub use header::*;
pub use image::*;
pub use mapping::*;

mod bintable;
mod header;
mod image;
mod mapping;
