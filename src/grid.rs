//! Sheet-level geometry: one [`GridGeometry`] per sheet part, pairing the
//! column and row [`AxisDimension`]s behind a 2-D query surface.

use tracing::debug;

use crate::axis::{AxisDimension, GroupSpan, IndexRange, PosSize, Unit};
use crate::error::{GeometryError, Result};
use crate::geom::{Point, Rect};
use crate::snapshot::{AxisSnapshot, GeometrySnapshot, SNAPSHOT_COMMAND_NAME};

/// Element-index ranges of the current view on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRange {
    pub columns: IndexRange,
    pub rows: IndexRange,
}

/// Complete dimension geometry for one sheet part.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    part: i32,
    columns: AxisDimension,
    rows: AxisDimension,
}

impl GridGeometry {
    /// Builds the geometry for `part` from a full snapshot and the tile
    /// scale in effect: logical tile extent in twips per axis and the tile
    /// edge in device pixels.
    pub fn new(
        snapshot: &GeometrySnapshot,
        tile_width_twips: i64,
        tile_height_twips: i64,
        tile_size_px: i64,
        part: i32,
    ) -> Result<Self> {
        let mut geometry = Self {
            part,
            columns: AxisDimension::new(),
            rows: AxisDimension::new(),
        };
        geometry.set_tile_geometry(tile_width_twips, tile_height_twips, tile_size_px);
        geometry.update(snapshot, true, part)?;
        Ok(geometry)
    }

    /// Applies a snapshot. With `check_completeness`, both axes must be
    /// present (required for the first snapshot of a part; later updates may
    /// be partial). Both axes are validated before either is touched, so a
    /// malformed snapshot never leaves the part with mismatched axes.
    pub fn update(
        &mut self,
        snapshot: &GeometrySnapshot,
        check_completeness: bool,
        part: i32,
    ) -> Result<()> {
        if snapshot.command_name != SNAPSHOT_COMMAND_NAME {
            return Err(GeometryError::Snapshot(format!(
                "unexpected command name {:?}",
                snapshot.command_name
            )));
        }
        let max_column = parse_index(&snapshot.max_column_index, "maxColumnIndex")?;
        let max_row = parse_index(&snapshot.max_row_index, "maxRowIndex")?;
        if check_completeness {
            for (axis, name) in [(&snapshot.columns, "columns"), (&snapshot.rows, "rows")] {
                let complete = axis.as_ref().is_some_and(|data| {
                    data.sizes.is_some() && data.hidden.is_some() && data.filtered.is_some()
                });
                if !complete {
                    return Err(GeometryError::Snapshot(format!(
                        "snapshot is missing {name} data"
                    )));
                }
            }
        }

        let empty = AxisSnapshot::default();
        let columns = snapshot.columns.as_ref().unwrap_or(&empty);
        let rows = snapshot.rows.as_ref().unwrap_or(&empty);

        let staged_columns = self.columns.stage(columns)?;
        let staged_rows = self.rows.stage(rows)?;
        self.columns.commit(staged_columns);
        self.rows.commit(staged_rows);

        self.columns.set_max_index(max_column);
        self.rows.set_max_index(max_row);
        self.part = part;
        debug!(part, max_column, max_row, "applied geometry snapshot");
        Ok(())
    }

    /// Sets the tile scale for both axes, recomputing the position caches
    /// when it actually changed.
    pub fn set_tile_geometry(
        &mut self,
        tile_width_twips: i64,
        tile_height_twips: i64,
        tile_size_px: i64,
    ) {
        self.columns.set_scale(tile_width_twips, tile_size_px, true);
        self.rows.set_scale(tile_height_twips, tile_size_px, true);
    }

    /// Sets the visible area from its origin and size in aligned twips.
    pub fn set_view_area(&mut self, origin: Point, size: Point) {
        self.columns
            .set_view_window(origin.x as i64, (origin.x + size.x) as i64);
        self.rows
            .set_view_window(origin.y as i64, (origin.y + size.y) as i64);
    }

    pub fn part(&self) -> i32 {
        self.part
    }

    pub fn columns(&self) -> &AxisDimension {
        &self.columns
    }

    pub fn rows(&self) -> &AxisDimension {
        &self.rows
    }

    pub fn view_column_range(&self) -> IndexRange {
        self.columns.view_range()
    }

    pub fn view_row_range(&self) -> IndexRange {
        self.rows.view_range()
    }

    pub fn view_cell_range(&self) -> CellRange {
        CellRange {
            columns: self.columns.view_range(),
            rows: self.rows.view_range(),
        }
    }

    /// Device pos/size of one column at the current zoom.
    pub fn column_at(&self, index: i64) -> Option<PosSize> {
        self.columns.element_at(index)
    }

    /// Device pos/size of one row at the current zoom.
    pub fn row_at(&self, index: i64) -> Option<PosSize> {
        self.rows.element_at(index)
    }

    pub fn column_group_levels(&self) -> usize {
        self.columns.group_levels()
    }

    pub fn row_group_levels(&self) -> usize {
        self.rows.group_levels()
    }

    pub fn column_groups_in_view(&self) -> Vec<GroupSpan> {
        self.columns.groups_in_view()
    }

    pub fn row_groups_in_view(&self) -> Vec<GroupSpan> {
        self.rows.groups_in_view()
    }

    /// Total sheet extent `(width, height)` in the requested unit.
    pub fn size(&self, unit: Unit) -> Option<(i64, i64)> {
        Some((self.columns.total_size(unit)?, self.rows.total_size(unit)?))
    }

    /// Device-pixel bounds of one cell, at the current zoom or at an
    /// explicit zoom scale.
    pub fn cell_rect(&self, column: i64, row: i64, zoom: Option<f64>) -> Option<Rect> {
        let (h, v) = match zoom {
            Some(zoom) => (
                self.columns.element_at_zoom(column, zoom),
                self.rows.element_at_zoom(row, zoom),
            ),
            None => (
                self.columns.element_at(column)?,
                self.rows.element_at(row)?,
            ),
        };
        Some(Rect::new(h.start, v.start, h.size, v.size))
    }

    /// Cell indices `(column, row)` under a point; out-of-range coordinates
    /// clamp to the sheet edge.
    pub fn cell_from_point(&self, point: Point, unit: Unit) -> (i64, i64) {
        (
            self.columns.index_at(point.x, unit),
            self.rows.index_at(point.y, unit),
        )
    }

    /// Start position of the column containing `pos`, in the same unit.
    pub fn snap_x(&self, pos: f64, unit: Unit) -> Option<i64> {
        self.columns.snap_pos(pos, unit)
    }

    /// Start position of the row containing `pos`, in the same unit.
    pub fn snap_y(&self, pos: f64, unit: Unit) -> Option<i64> {
        self.rows.snap_pos(pos, unit)
    }

    /// Reprojects an aligned-twips point at the current zoom to `zoom`.
    pub fn aligned_point_at_zoom(&self, point: Point, zoom: f64) -> Point {
        Point::new(
            self.columns.aligned_at_zoom(point.x as i64, zoom) as f64,
            self.rows.aligned_at_zoom(point.y as i64, zoom) as f64,
        )
    }

    /// Reprojects a device-pixel point at the current zoom to `zoom`.
    pub fn device_point_at_zoom(&self, point: Point, zoom: f64) -> Point {
        Point::new(
            self.columns.device_at_zoom(point.x, zoom),
            self.rows.device_at_zoom(point.y, zoom),
        )
    }

    /// Reprojects a device-pixel point at `zoom` back to the current zoom.
    pub fn device_point_from_zoom(&self, point: Point, zoom: f64) -> Point {
        Point::new(
            self.columns.device_from_zoom(point.x, zoom),
            self.rows.device_from_zoom(point.y, zoom),
        )
    }

    /// Converts a logical-twips point to aligned twips at the current zoom.
    pub fn aligned_from_logical_point(&self, point: Point) -> Point {
        Point::new(
            self.columns.aligned_from_logical(point.x as i64) as f64,
            self.rows.aligned_from_logical(point.y as i64) as f64,
        )
    }

    /// Converts an aligned-twips point at the current zoom to logical twips.
    pub fn logical_from_aligned_point(&self, point: Point) -> Point {
        Point::new(
            self.columns.logical_from_aligned(point.x as i64) as f64,
            self.rows.logical_from_aligned(point.y as i64) as f64,
        )
    }

    /// Converts a logical-twips rectangle to the aligned-twips area covering
    /// it, expanded to cell boundaries.
    pub fn logical_rect_to_aligned(&self, rect: Rect) -> Rect {
        let h = self.columns.range_from_logical(rect.x, rect.right());
        let v = self.rows.range_from_logical(rect.y, rect.bottom());
        Rect::new(h.start, v.start, h.end - h.start, v.end - v.start)
    }
}

// Max indexes arrive as unsigned decimal strings; a sign or any other
// non-digit character marks the snapshot as malformed.
fn parse_index(field: &str, name: &str) -> Result<i64> {
    let trimmed = field.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GeometryError::Snapshot(format!(
            "non-numeric {name} {field:?}"
        )));
    }
    trimmed
        .parse()
        .map_err(|_| GeometryError::Snapshot(format!("{name} out of range {field:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    fn snapshot(rows_sizes: &str) -> GeometrySnapshot {
        GeometrySnapshot::from_json(&format!(
            r#"{{
                "commandName": "GridGeometryData",
                "maxColumnIndex": "1023",
                "maxRowIndex": "500000",
                "columns": {{
                    "sizes": "1280:1023 ",
                    "hidden": "0:1023 ",
                    "filtered": "0:1023 "
                }},
                "rows": {{
                    "sizes": "{rows_sizes}",
                    "hidden": "0:1048575 ",
                    "filtered": "0:1048575 "
                }}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn construction_applies_both_axes() {
        let geometry = GridGeometry::new(&snapshot("256:1048575 "), 3840, 3840, 256, 2).unwrap();
        assert_eq!(geometry.part(), 2);
        assert_eq!(geometry.column_at(3).map(|c| c.size), Some(85));
        assert_eq!(geometry.row_at(3).map(|r| r.size), Some(17));
    }

    #[test]
    fn update_rejects_wrong_command_name() {
        let mut wrong = snapshot("256:1048575 ");
        wrong.command_name = "CellCursorData".to_owned();
        assert!(GridGeometry::new(&wrong, 3840, 3840, 256, 0).is_err());
    }

    #[test]
    fn first_snapshot_must_carry_both_axes() {
        let mut partial = snapshot("256:1048575 ");
        partial.rows = None;
        assert!(GridGeometry::new(&partial, 3840, 3840, 256, 0).is_err());
    }

    #[test]
    fn rejected_update_leaves_both_axes_untouched() {
        let mut geometry =
            GridGeometry::new(&snapshot("256:1048575 "), 3840, 3840, 256, 0).unwrap();

        // Valid columns, malformed rows: neither axis may change.
        let mut bad = snapshot("garbage");
        if let Some(columns) = bad.columns.as_mut() {
            columns.sizes = Some("2560:1023 ".to_owned());
        }
        assert!(geometry.update(&bad, true, 0).is_err());
        assert_eq!(geometry.column_at(3).map(|c| c.size), Some(85));
        assert_eq!(geometry.row_at(3).map(|r| r.size), Some(17));
    }

    #[test]
    fn signed_max_indexes_are_rejected() {
        for bad_index in ["-5", "+5", "1e3", ""] {
            let mut bad = snapshot("256:1048575 ");
            bad.max_row_index = bad_index.to_owned();
            assert!(
                GridGeometry::new(&bad, 3840, 3840, 256, 0).is_err(),
                "maxRowIndex {bad_index:?} must not be accepted"
            );
        }
    }

    #[test]
    fn cell_queries_round_trip() {
        let geometry = GridGeometry::new(&snapshot("256:1048575 "), 3840, 3840, 256, 0).unwrap();
        let rect = geometry.cell_rect(4, 9, None).unwrap();
        let (column, row) = geometry.cell_from_point(rect.center(), Unit::Device);
        assert_eq!((column, row), (4, 9));
        assert_eq!(
            geometry.snap_x(rect.center().x, Unit::Device),
            Some(rect.x)
        );
        assert_eq!(
            geometry.snap_y(rect.center().y, Unit::Device),
            Some(rect.y)
        );
    }

    #[test]
    fn sheet_size_in_all_units() {
        let geometry = GridGeometry::new(&snapshot("256:1048575 "), 3840, 3840, 256, 0).unwrap();
        // 1024 columns of 85px, 500001 rows of 17px.
        assert_eq!(geometry.size(Unit::Device), Some((87_040, 8_500_017)));
        assert_eq!(geometry.size(Unit::Aligned), Some((1_305_600, 127_500_255)));
        assert_eq!(geometry.size(Unit::Logical), Some((1_310_720, 128_000_256)));
    }
}
