//! Per-axis dimension geometry: index/position lookups for one run of rows
//! or columns.
//!
//! An [`AxisDimension`] owns the raw sizes (logical twips), the hidden and
//! filtered flag lists and the outline table for one axis, plus a derived
//! list of *visible* sizes whose per-run caches answer every positional
//! query. Three coordinate systems are supported, see [`Unit`].
//!
//! The authority rasterizes tiles on a device-pixel grid and rounds each
//! element's size down to whole pixels independently. All aligned-twips
//! values here are therefore re-derived from device pixels, never computed
//! from logical twips, so the client's geometry matches the authority's
//! raster bit for bit.

use tracing::warn;

use crate::error::Result;
use crate::outline::OutlineTable;
use crate::runs::{BoolRunList, RunList, RunSpan};
use crate::snapshot::AxisSnapshot;

/// Twips per device pixel at the reference (100%) zoom. Protocol constant
/// relating the authority's tile raster to the logical twips unit; all zoom
/// formulas use it verbatim.
pub const REF_TWIPS_PER_PIXEL: f64 = 15.0;

/// Coordinate systems understood by the positional queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Device pixels of the authority's raster tiles at the current zoom.
    Device,
    /// Twips re-derived from device-pixel-rounded positions at the current
    /// zoom; differs from logical twips by per-element rounding.
    Aligned,
    /// Zoom-invariant twips matching the document's true layout.
    Logical,
}

/// Start position and size of one element, in the unit of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosSize {
    pub start: i64,
    pub size: i64,
}

/// Inclusive start/end positions, in the unit of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartEnd {
    pub start: i64,
    pub end: i64,
}

/// Inclusive element-index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRange {
    pub start: i64,
    pub end: i64,
}

/// Geometry of one outline group, resolved to device pixels for header
/// rendering. `level` is 1-based as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpan {
    pub level: usize,
    pub index: usize,
    pub start_pos: i64,
    pub end_pos: i64,
    pub hidden: bool,
}

/// Per-run derived cache on the visible-sizes list. Positions are
/// cumulative through the run's last element; the device size is per
/// element, floor-rounded independently of its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PosData {
    size_px: i64,
    pos_px: i64,
    pos_aligned: i64,
    pos_logical: i64,
}

/// Staged, fully parsed axis update; committed only as a whole.
#[derive(Debug, Default)]
pub(crate) struct StagedAxisUpdate {
    sizes: Option<RunList<()>>,
    hidden: Option<BoolRunList>,
    filtered: Option<BoolRunList>,
    outlines: Option<OutlineTable>,
}

/// Dimension geometry for one axis (all columns, or all rows).
#[derive(Debug, Clone, Default)]
pub struct AxisDimension {
    sizes: RunList<()>,
    hidden: BoolRunList,
    filtered: BoolRunList,
    outlines: OutlineTable,
    /// Sizes with hidden/filtered elements zeroed, carrying the position
    /// caches. Regenerated whenever sizes or flags change.
    visible: RunList<PosData>,
    max_index: i64,
    tile_size_twips: i64,
    tile_size_px: i64,
    twips_per_px: f64,
    /// Device pixels per 15 twips: `tile_size_px * 15 / tile_size_twips`.
    zoom_factor: f64,
    view_start: i64,
    view_end: i64,
}

impl AxisDimension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses all encodings present in `data` without touching state.
    /// Cross-checks that sizes, hidden and filtered cover the same index
    /// domain (staged or retained) so the visible-sizes regeneration cannot
    /// fail after commit.
    pub(crate) fn stage(&self, data: &AxisSnapshot) -> Result<StagedAxisUpdate> {
        let staged = StagedAxisUpdate {
            sizes: data.sizes.as_deref().map(RunList::parse).transpose()?,
            hidden: data.hidden.as_deref().map(BoolRunList::parse).transpose()?,
            filtered: data.filtered.as_deref().map(BoolRunList::parse).transpose()?,
            outlines: data.groups.as_deref().map(OutlineTable::parse).transpose()?,
        };

        if staged.sizes.is_some() || staged.hidden.is_some() || staged.filtered.is_some() {
            let sizes_max = staged
                .sizes
                .as_ref()
                .map_or_else(|| self.sizes.max_index(), RunList::max_index);
            let hidden_max = staged
                .hidden
                .as_ref()
                .map_or_else(|| self.hidden.max_index(), BoolRunList::max_index);
            let filtered_max = staged
                .filtered
                .as_ref()
                .map_or_else(|| self.filtered.max_index(), BoolRunList::max_index);

            let left = sizes_max.unwrap_or(-1);
            for right in [hidden_max.unwrap_or(-1), filtered_max.unwrap_or(-1)] {
                if left != right || left < 0 {
                    return Err(crate::error::GeometryError::DomainMismatch { left, right });
                }
            }
        }

        Ok(staged)
    }

    /// Replaces state with a staged update and regenerates the derived
    /// caches when sizes or flags changed. Cannot fail.
    pub(crate) fn commit(&mut self, staged: StagedAxisUpdate) {
        let regenerate =
            staged.sizes.is_some() || staged.hidden.is_some() || staged.filtered.is_some();
        if let Some(sizes) = staged.sizes {
            self.sizes = sizes;
        }
        if let Some(hidden) = staged.hidden {
            self.hidden = hidden;
        }
        if let Some(filtered) = staged.filtered {
            self.filtered = filtered;
        }
        if let Some(outlines) = staged.outlines {
            self.outlines = outlines;
        }
        if regenerate {
            self.refresh_visible();
        }
    }

    /// Applies a snapshot for this axis. Encodings are parsed and
    /// cross-validated before anything is replaced; on error the previous
    /// geometry is fully retained. Absent fields keep their prior value
    /// (the authority sends partial updates, e.g. groups-only).
    pub fn update(&mut self, data: &AxisSnapshot) -> Result<()> {
        let staged = self.stage(data)?;
        self.commit(staged);
        Ok(())
    }

    pub fn max_index(&self) -> i64 {
        self.max_index
    }

    pub fn set_max_index(&mut self, max_index: i64) {
        self.max_index = max_index;
    }

    /// Twips per device pixel at the current scale.
    pub fn twips_per_pixel(&self) -> f64 {
        self.twips_per_px
    }

    /// Sets the tile scale pair: logical tile size in twips and tile size in
    /// device pixels. No-op when both are unchanged, so repeated calls at a
    /// stable zoom never recompute the position caches. With `recompute`,
    /// rebuilds the caches for the new scale.
    pub fn set_scale(&mut self, tile_size_twips: i64, tile_size_px: i64, recompute: bool) {
        if tile_size_twips <= 0 || tile_size_px <= 0 {
            warn!(tile_size_twips, tile_size_px, "ignoring invalid tile scale");
            return;
        }
        if self.tile_size_twips == tile_size_twips && self.tile_size_px == tile_size_px {
            return;
        }

        self.tile_size_twips = tile_size_twips;
        self.tile_size_px = tile_size_px;
        self.zoom_factor = tile_size_px as f64 * REF_TWIPS_PER_PIXEL / tile_size_twips as f64;
        self.twips_per_px = tile_size_twips as f64 / tile_size_px as f64;

        if recompute {
            self.refresh_positions();
        }
    }

    fn refresh_visible(&mut self) {
        // Stage validation guarantees equal domains here; a failure means a
        // programming error upstream, so keep the old caches and complain.
        let mask = match self.hidden.union(&self.filtered) {
            Ok(mask) => mask,
            Err(err) => {
                warn!("cannot merge hidden and filtered flags: {err}");
                return;
            }
        };
        match self.sizes.zero_outside(&mask) {
            Ok(visible) => self.visible = visible,
            Err(err) => {
                warn!("cannot mask sizes with visibility flags: {err}");
                return;
            }
        }
        self.refresh_positions();
    }

    fn refresh_positions(&mut self) {
        if self.tile_size_twips <= 0 || self.tile_size_px <= 0 {
            return;
        }
        let twips_per_px = self.twips_per_px;
        let mut pos_px = 0i64;
        let mut pos_logical = 0i64;
        self.visible.attach(|_end, value, len| {
            // Rounding happens per element, never on accumulated totals, to
            // reproduce the authority's raster exactly.
            let size_px = (value as f64 / twips_per_px).floor() as i64;
            pos_px += size_px * len;
            let pos_aligned = (pos_px as f64 * twips_per_px).floor() as i64;
            pos_logical += value * len;
            PosData {
                size_px,
                pos_px,
                pos_aligned,
                pos_logical,
            }
        });
    }

    /// Start position and size of `index` in device pixels at the current
    /// zoom. Hidden and filtered elements have size 0.
    pub fn element_at(&self, index: i64) -> Option<PosSize> {
        self.element_in(index, Unit::Device)
    }

    /// Start position and size of `index` in the requested unit.
    pub fn element_in(&self, index: i64, unit: Unit) -> Option<PosSize> {
        let span = self.visible.by_index(index)?;
        Some(self.element_from_span(index, &span, unit))
    }

    /// Start position and size of `index` in device pixels at an arbitrary
    /// zoom scale. Uncached: walks every run up to `index`, so use only for
    /// transient lookups (zoom animation frames).
    pub fn element_at_zoom(&self, index: i64, zoom: f64) -> PosSize {
        let mut start = 0i64;
        let mut size = 0i64;
        self.visible.for_each_in_range(0, index, |span| {
            let size_one = (span.value as f64 * zoom / REF_TWIPS_PER_PIXEL).floor() as i64;
            if index > span.end {
                start += size_one * span.len();
            } else if index >= span.start {
                start += size_one * (index - span.start);
                size = size_one;
            }
        });
        PosSize { start, size }
    }

    fn element_from_span(&self, index: i64, span: &RunSpan<PosData>, unit: Unit) -> PosSize {
        // Elements from `index` through the end of the run.
        let tail = span.end - index + 1;
        match unit {
            Unit::Device => PosSize {
                start: span.derived.pos_px - span.derived.size_px * tail,
                size: span.derived.size_px,
            },
            Unit::Logical => PosSize {
                start: span.derived.pos_logical - span.value * tail,
                size: span.value,
            },
            Unit::Aligned => {
                let start_px = span.derived.pos_px - span.derived.size_px * tail;
                PosSize {
                    start: (start_px as f64 * self.twips_per_px).floor() as i64,
                    size: (span.derived.size_px as f64 * self.twips_per_px).floor() as i64,
                }
            }
        }
    }

    /// Element index containing `pos`. Positions past either end of the
    /// domain clamp to the nearest end.
    pub fn index_at(&self, pos: f64, unit: Unit) -> i64 {
        let resolved = match unit {
            Unit::Device => self.span_and_index_from_aligned(pos * self.twips_per_px),
            Unit::Aligned => self.span_and_index_from_aligned(pos),
            Unit::Logical => self.span_and_index_from_logical(pos),
        };
        resolved.map_or(0, |(index, _)| index)
    }

    /// Start position of the element containing `pos`, in the same unit.
    pub fn snap_pos(&self, pos: f64, unit: Unit) -> Option<i64> {
        let (index, span) = match unit {
            Unit::Device => self.span_and_index_from_aligned(pos * self.twips_per_px),
            Unit::Aligned => self.span_and_index_from_aligned(pos),
            Unit::Logical => self.span_and_index_from_logical(pos),
        }?;
        Some(self.element_from_span(index, &span, unit).start)
    }

    fn span_and_index_from_aligned(&self, pos: f64) -> Option<(i64, RunSpan<PosData>)> {
        if let Some(span) = self.visible.by_derived(pos, |data| data.pos_aligned) {
            let count = span.len();
            let start_aligned =
                (span.derived.pos_px - span.derived.size_px * count) as f64 * self.twips_per_px;
            let end_aligned = span.derived.pos_aligned as f64;
            let size_one = (end_aligned - start_aligned) / count as f64;
            let relative = if size_one > 0.0 {
                ((pos - start_aligned) / size_one).floor() as i64
            } else {
                0
            };
            return Some((span.start + relative, span));
        }

        // Out of range: clamp to the nearest domain end.
        let index = if pos >= 0.0 { self.max_index } else { 0 };
        let span = self.visible.by_index(index)?;
        Some((index, span))
    }

    fn span_and_index_from_logical(&self, pos: f64) -> Option<(i64, RunSpan<PosData>)> {
        if let Some(span) = self.visible.by_derived(pos, |data| data.pos_logical) {
            let count = span.len();
            let start_logical = (span.derived.pos_logical - span.value * count) as f64;
            let relative = if span.value > 0 {
                ((pos - start_logical) / span.value as f64).floor() as i64
            } else {
                0
            };
            return Some((span.start + relative, span));
        }

        let index = if pos >= 0.0 { self.max_index } else { 0 };
        let span = self.visible.by_index(index)?;
        Some((index, span))
    }

    /// Converts an aligned-twips position at the current zoom to logical
    /// twips, preserving the offset from the containing element's start.
    pub fn logical_from_aligned(&self, pos: i64) -> i64 {
        let Some((index, span)) = self.span_and_index_from_aligned(pos as f64) else {
            return 0;
        };
        let aligned = self.element_from_span(index, &span, Unit::Aligned);
        let logical = self.element_from_span(index, &span, Unit::Logical);
        logical.start + (pos - aligned.start)
    }

    /// Converts a logical-twips position to aligned twips at the current
    /// zoom, preserving the offset from the containing element's start.
    pub fn aligned_from_logical(&self, pos: i64) -> i64 {
        let Some((index, span)) = self.span_and_index_from_logical(pos as f64) else {
            return 0;
        };
        let aligned = self.element_from_span(index, &span, Unit::Aligned);
        let logical = self.element_from_span(index, &span, Unit::Logical);
        aligned.start + (pos - logical.start)
    }

    /// Converts a logical-twips position to aligned twips at an arbitrary
    /// zoom scale by rescaling run by run. A single linear factor cannot do
    /// this: every element's device size is floor-rounded independently.
    pub fn aligned_from_logical_at_zoom(&self, pos: i64, zoom: f64) -> i64 {
        let mut converted = 0i64;
        let mut consumed = 0i64;
        self.visible.for_each(|span| {
            if consumed >= pos {
                return;
            }
            let count = span.len();
            let span_logical = span.value * count;
            let size_one_px = (span.value as f64 * zoom / REF_TWIPS_PER_PIXEL).floor();
            let span_aligned =
                (size_one_px * count as f64 * REF_TWIPS_PER_PIXEL / zoom).floor() as i64;

            if consumed + span_logical < pos {
                consumed += span_logical;
                converted += span_aligned;
                return;
            }

            // Final run: convert whole elements, keep the remainder as-is.
            let remaining = pos - consumed;
            let elems = remaining / span.value;
            let extra = remaining - elems * span.value;
            converted += (elems as f64 * span_aligned as f64 / count as f64).floor() as i64 + extra;
            consumed = pos;
        });
        converted
    }

    /// Reprojects an aligned-twips position at the current zoom to the
    /// equivalent aligned-twips position at `zoom`.
    pub fn aligned_at_zoom(&self, pos: i64, zoom: f64) -> i64 {
        let logical = self.logical_from_aligned(pos);
        self.aligned_from_logical_at_zoom(logical, zoom)
    }

    /// Reprojects a device-pixel position at the current zoom to the
    /// equivalent device-pixel position at `zoom`, run by run. The
    /// fractional remainder inside the final element scales linearly.
    pub fn device_at_zoom(&self, pos: f64, zoom: f64) -> f64 {
        let mut converted = 0.0f64;
        let mut remaining = pos;
        self.visible.for_each(|span| {
            let count = span.len() as f64;
            let size_one = span.derived.size_px as f64;
            let size_one_z = (span.value as f64 / REF_TWIPS_PER_PIXEL * zoom).floor();
            let span_px = size_one * count;
            let span_px_z = size_one_z * count;

            if remaining < size_one {
                // Done converting.
                return;
            }
            if remaining >= span_px {
                remaining -= span_px;
                converted += span_px_z;
                return;
            }
            let elems = (remaining / size_one).floor();
            remaining -= elems * size_one;
            converted += elems * size_one_z;
        });
        converted + remaining * zoom / self.zoom_factor
    }

    /// Inverse of [`Self::device_at_zoom`]: reprojects a device-pixel
    /// position at `zoom` back to the current zoom.
    pub fn device_from_zoom(&self, pos: f64, zoom: f64) -> f64 {
        let mut converted = 0.0f64;
        let mut remaining = pos;
        self.visible.for_each(|span| {
            let count = span.len() as f64;
            let size_one = span.derived.size_px as f64;
            let size_one_z = (span.value as f64 / REF_TWIPS_PER_PIXEL * zoom).floor();
            let span_px = size_one * count;
            let span_px_z = size_one_z * count;

            if remaining < size_one_z {
                return;
            }
            if remaining >= span_px_z {
                remaining -= span_px_z;
                converted += span_px;
                return;
            }
            let elems = (remaining / size_one_z).floor();
            remaining -= elems * size_one_z;
            converted += elems * size_one;
        });
        converted + remaining * self.zoom_factor / zoom
    }

    /// Aligned-twips range covering the logical-twips range `[start, end]`,
    /// expanded to element boundaries. A collapsed range (`start == end`,
    /// e.g. a selection on a hidden element) yields a minimal range one
    /// device pixel wide, mirroring the authority's degenerate-selection
    /// representation.
    pub fn range_from_logical(&self, start: i64, end: i64) -> StartEnd {
        let Some((start_index, start_span)) = self.span_and_index_from_logical(start as f64)
        else {
            return StartEnd { start: 0, end: 0 };
        };
        let start_aligned = self
            .element_from_span(start_index, &start_span, Unit::Aligned)
            .start;

        if start == end {
            let width = self.twips_per_px.floor() as i64;
            return StartEnd {
                start: start_aligned,
                end: start_aligned + width,
            };
        }

        let Some((end_index, end_span)) = self.span_and_index_from_logical(end as f64) else {
            return StartEnd {
                start: start_aligned,
                end: start_aligned,
            };
        };
        let end_data = self.element_from_span(end_index, &end_span, Unit::Aligned);
        let end_aligned = (end_data.start + end_data.size).max(start_aligned);

        StartEnd {
            start: start_aligned,
            end: end_aligned,
        }
    }

    /// Total axis size in the requested unit: end of the last addressable
    /// element.
    pub fn total_size(&self, unit: Unit) -> Option<i64> {
        let last = self.element_in(self.max_index, unit)?;
        Some(last.start + last.size)
    }

    /// Sets the view range from aligned-twips window bounds, clamped to the
    /// addressable domain.
    pub fn set_view_window(&mut self, start: i64, end: i64) {
        self.view_start = self.index_at(start as f64, Unit::Aligned).max(0);
        self.view_end = self.index_at(end as f64, Unit::Aligned).min(self.max_index);
    }

    /// Element range of the current view window.
    pub fn view_range(&self) -> IndexRange {
        IndexRange {
            start: self.view_start,
            end: self.view_end,
        }
    }

    /// Number of outline nesting levels.
    pub fn group_levels(&self) -> usize {
        self.outlines.levels()
    }

    /// Outline groups for the current view, deepest level first, resolved to
    /// device pixels for header rendering. Queries from element 0 rather than
    /// the view start: header controls for a group stay visible while any
    /// part of the document above the view end is scrolled past.
    pub fn groups_in_view(&self) -> Vec<GroupSpan> {
        let mut groups = Vec::new();
        if self.outlines.levels() == 0 {
            return groups;
        }
        self.outlines
            .groups_intersecting(0, self.view_end, |level, index, group| {
                let (Some(first), Some(last)) =
                    (self.element_at(group.start), self.element_at(group.end))
                else {
                    return;
                };
                groups.push(GroupSpan {
                    level: level + 1,
                    index,
                    start_pos: first.start,
                    end_pos: last.start + last.size,
                    hidden: group.hidden,
                });
            });
        groups
    }

    /// Visits each element in `[start, end]` with its device pos/size.
    pub fn for_each_in_range<F>(&self, start: i64, end: i64, mut f: F)
    where
        F: FnMut(i64, PosSize),
    {
        self.visible.for_each_in_range(start, end, |span| {
            let first = span.start.max(start);
            let last = span.end.min(end);
            for index in first..=last {
                f(index, self.element_from_span(index, span, Unit::Device));
            }
        });
    }

    /// Visits every grid line in the device-pixel window `[start_px,
    /// end_px]` with its position and element index. Zero-size runs draw no
    /// lines.
    pub fn for_each_grid_line<F>(&self, start_px: i64, end_px: i64, mut f: F)
    where
        F: FnMut(i64, i64),
    {
        self.visible.for_each(|span| {
            let count = span.len();
            let size = span.derived.size_px;
            let span_first = span.derived.pos_px - size * count;
            if size <= 0 || span_first >= end_px || span.derived.pos_px <= start_px {
                return;
            }

            let first = span_first.max(start_px + size - (start_px - span_first) % size);
            let last = end_px.min(span.derived.pos_px);
            let mut index = span.start + (first - span_first) / size;
            let mut pos = first;
            while pos <= last {
                f(pos, index);
                index += 1;
                pos += size;
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;

    // Recorded authority payload: varying row sizes, nothing hidden.
    const ROW_SIZES: &str = "256:6 583:7 256:10 264:11 256:13 450:14 256:19 1485:20 256:1048575 ";
    const ALL_VISIBLE: &str = "0:1048575 ";
    // Row 22 hidden.
    const ROW_HIDDEN: &str = "0:21 22 1048575 ";

    fn axis(hidden: &str) -> AxisDimension {
        let mut axis = AxisDimension::new();
        axis.set_scale(3840, 256, false);
        axis.update(&AxisSnapshot {
            sizes: Some(ROW_SIZES.to_owned()),
            hidden: Some(hidden.to_owned()),
            filtered: Some(ALL_VISIBLE.to_owned()),
            groups: None,
        })
        .unwrap();
        axis.set_max_index(500_000);
        axis
    }

    #[test]
    fn element_positions_match_the_authority_raster() {
        let axis = axis(ALL_VISIBLE);
        assert_eq!(
            axis.element_at(36),
            Some(PosSize {
                start: 728,
                size: 17
            })
        );
    }

    #[test]
    fn rescaling_changes_sizes_deterministically() {
        let mut axis = axis(ALL_VISIBLE);
        axis.set_scale(6636, 256, true);
        assert_eq!(
            axis.element_at(36),
            Some(PosSize {
                start: 394,
                size: 9
            })
        );
    }

    #[test]
    fn set_scale_with_unchanged_parameters_is_a_noop() {
        let mut axis = axis(ALL_VISIBLE);
        let before = axis.element_at(36);
        axis.set_scale(3840, 256, true);
        assert_eq!(axis.element_at(36), before);
    }

    #[test]
    fn hidden_elements_have_zero_size() {
        let axis = axis(ROW_HIDDEN);
        let hidden = axis.element_at(22).unwrap();
        assert_eq!(hidden.size, 0);
        // The next element starts where the hidden one does.
        assert_eq!(axis.element_at(23).unwrap().start, hidden.start);
        // And everything after is shifted up by one row height.
        assert_eq!(
            axis.element_at(36),
            Some(PosSize {
                start: 711,
                size: 17
            })
        );
    }

    #[test]
    fn positions_are_contiguous() {
        let axis = axis(ROW_HIDDEN);
        for index in 0..60 {
            let cur = axis.element_at(index).unwrap();
            let next = axis.element_at(index + 1).unwrap();
            assert_eq!(next.start, cur.start + cur.size, "index {index}");
        }
    }

    #[test]
    fn index_round_trips_through_position_for_visible_elements() {
        let axis = axis(ROW_HIDDEN);
        for index in 0..60 {
            let element = axis.element_at(index).unwrap();
            if element.size > 0 {
                assert_eq!(
                    axis.index_at(element.start as f64, Unit::Device),
                    index,
                    "index {index}"
                );
            }
        }
    }

    #[test_case(Unit::Device; "device pixels")]
    #[test_case(Unit::Aligned; "aligned twips")]
    #[test_case(Unit::Logical; "logical twips")]
    fn index_at_clamps_out_of_range_positions(unit: Unit) {
        let axis = axis(ALL_VISIBLE);
        assert_eq!(axis.index_at(-10.0, unit), 0);
        assert_eq!(axis.index_at(1.0e15, unit), 500_000);
    }

    #[test]
    fn aligned_positions_follow_device_rounding() {
        let axis = axis(ALL_VISIBLE);
        // Row 7 is 583 twips tall but rasterizes to 38px = 570 aligned twips.
        let row = axis.element_in(7, Unit::Aligned).unwrap();
        assert_eq!(row.size, 570);
        assert_eq!(axis.element_in(7, Unit::Logical).unwrap().size, 583);
    }

    #[test]
    fn logical_round_trip_preserves_offsets() {
        let axis = axis(ALL_VISIBLE);
        let logical = axis.logical_from_aligned(17_280);
        assert_eq!(logical, 17_358);
        assert_eq!(axis.aligned_from_logical(logical), 17_280);
    }

    #[test]
    fn reprojection_to_another_zoom_rescales_run_by_run() {
        let axis = axis(ALL_VISIBLE);
        assert_eq!(axis.aligned_at_zoom(17_280, 1.2), 17_002);
    }

    #[test]
    fn degenerate_logical_range_is_one_pixel_wide() {
        let axis = axis(ALL_VISIBLE);
        let range = axis.range_from_logical(17_358, 17_358);
        assert_eq!(range.start, 17_040);
        assert_eq!(range.end, 17_040 + 15);
    }

    #[test]
    fn update_failure_retains_previous_geometry() {
        let mut axis = axis(ALL_VISIBLE);
        let before = axis.element_at(36);
        let err = axis.update(&AxisSnapshot {
            sizes: Some("100:10 ".to_owned()), // domain mismatch with flags
            hidden: None,
            filtered: None,
            groups: None,
        });
        assert!(err.is_err());
        assert_eq!(axis.element_at(36), before);
    }

    #[test]
    fn groups_only_update_keeps_positions() {
        let mut axis = axis(ALL_VISIBLE);
        let before = axis.element_at(36);
        axis.update(&AxisSnapshot {
            groups: Some("10:14:0:1, 13:9:0:1, 17:4:1:1, ".to_owned()),
            ..AxisSnapshot::default()
        })
        .unwrap();
        assert_eq!(axis.group_levels(), 3);
        assert_eq!(axis.element_at(36), before);

        // Removing all groups arrives as an empty encoding.
        axis.update(&AxisSnapshot {
            groups: Some(String::new()),
            ..AxisSnapshot::default()
        })
        .unwrap();
        assert_eq!(axis.group_levels(), 0);
    }

    #[test]
    fn groups_above_the_view_start_are_still_reported() {
        let mut axis = axis(ALL_VISIBLE);
        axis.update(&AxisSnapshot {
            groups: Some("2:2:0:1, ".to_owned()),
            ..AxisSnapshot::default()
        })
        .unwrap();

        // Scroll well past the group; its header control must survive.
        axis.set_view_window(17_280, 34_560);
        assert!(axis.view_range().start > 3);

        let groups = axis.groups_in_view();
        assert_eq!(groups.len(), 1);
        assert_eq!((groups[0].level, groups[0].hidden), (1, false));
        assert_eq!((groups[0].start_pos, groups[0].end_pos), (34, 68));
    }

    #[test]
    fn grid_lines_cover_the_requested_window() {
        let axis = axis(ALL_VISIBLE);
        // Rows 0-6 are 17px each; ask for lines between 10px and 60px.
        let mut lines = Vec::new();
        axis.for_each_grid_line(10, 60, |pos, index| lines.push((pos, index)));
        assert_eq!(lines, vec![(17, 1), (34, 2), (51, 3)]);
    }
}
