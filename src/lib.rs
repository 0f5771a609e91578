//! gridgeom - dimension geometry for tiled spreadsheet rendering
//!
//! Answers positional questions about a spreadsheet grid whose row/column
//! layout is owned by a remote layout authority: where does cell (col, row)
//! land on screen, which cell is under this point, how do positions map
//! between zoom levels. Geometry arrives as run-length-encoded snapshots
//! ([`GeometrySnapshot`]) and is queryable in three units ([`Unit`]):
//! device pixels, zoom-aligned twips and zoom-invariant logical twips.
//!
//! # Usage
//!
//! ```no_run
//! use gridgeom::{GeometrySnapshot, GridGeometry, Point, Unit};
//!
//! # fn main() -> gridgeom::Result<()> {
//! # let payload = "";
//! let snapshot = GeometrySnapshot::from_json(payload)?;
//! let geometry = GridGeometry::new(&snapshot, 3840, 3840, 256, 0)?;
//!
//! let rect = geometry.cell_rect(2, 5, None);
//! let (col, row) = geometry.cell_from_point(Point::new(120.0, 40.0), Unit::Device);
//! # Ok(())
//! # }
//! ```

pub mod axis;
pub mod error;
pub mod geom;
pub mod grid;
pub mod outline;
pub mod runs;
pub mod search;
pub mod snapshot;

pub use axis::{AxisDimension, GroupSpan, IndexRange, PosSize, StartEnd, Unit, REF_TWIPS_PER_PIXEL};
pub use error::{GeometryError, Result};
pub use geom::{Point, Rect};
pub use grid::{CellRange, GridGeometry};
pub use outline::{OutlineGroup, OutlineTable};
pub use runs::{BoolRunList, RunList, RunSpan};
pub use snapshot::{AxisSnapshot, GeometrySnapshot, SNAPSHOT_COMMAND_NAME};

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
