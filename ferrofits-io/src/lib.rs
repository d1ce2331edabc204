#![deny(missing_docs)]

//! The transport contract between the Ferrofits core and a block-structured container.
//!
//! The core never touches bytes: it asks a [`Transport`] to read or write header cards,
//! contiguous runs of pixels and row ranges of table cells, passing typed slices
//! ([`Values`](ferrofits_dtype::Values) and [`ValuesMut`](ferrofits_dtype::ValuesMut)) whose
//! variant announces the datatype of the transfer. Row, column, card and element numbers are
//! 1-based at this boundary.
//!
//! [`MemFits`] is a complete in-memory implementation of the contract, opened through
//! [`MemOpenOptions`].

pub use mem::*;
pub use open::*;
pub use status::*;
pub use transport::*;

mod mem;
mod open;
mod status;
mod transport;
mod wire;
