//! Outline (grouping) tables for one axis.
//!
//! Groups let the user collapse ranges of rows or columns. The authority
//! sends one list of non-overlapping groups per nesting level; groups on
//! different levels may overlap, which is how nesting is represented.
//!
//! Encoding: levels separated by a single space with a trailing space; each
//! level is a comma-separated list of `"<start>:<count>:<hidden>:<visible>"`
//! quadruples with a trailing comma. An encoding without a level separator
//! (typically the empty string) is a valid empty table; that is how the
//! authority reports that all groups were removed.

use std::cmp::Ordering;

use crate::error::{GeometryError, Result};
use crate::search::binary_search;

/// One contiguous group of elements at a fixed nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineGroup {
    pub start: i64,
    pub end: i64,
    pub hidden: bool,
    pub visible: bool,
}

/// Per-level lists of ordered, non-overlapping groups.
#[derive(Debug, Clone, Default)]
pub struct OutlineTable {
    levels: Vec<Vec<OutlineGroup>>,
}

impl OutlineTable {
    /// Parses an encoded outline table; fails on structurally invalid levels.
    pub fn parse(encoding: &str) -> Result<Self> {
        let mut splits: Vec<&str> = encoding.split(' ').collect();
        // The last split is a terminator; an encoding without one (typically
        // the empty string) carries no levels.
        splits.pop();
        if splits.is_empty() {
            return Ok(Self::default());
        }

        let mut levels = Vec::with_capacity(splits.len());
        for level in splits {
            let mut entries: Vec<&str> = level.split(',').collect();
            entries.pop();
            if entries.is_empty() {
                return Err(GeometryError::OutlineEncoding(format!(
                    "level {level:?} has no trailing separator"
                )));
            }

            let mut groups = Vec::with_capacity(entries.len());
            for entry in entries {
                groups.push(Self::parse_group(entry)?);
            }
            levels.push(groups);
        }

        Ok(Self { levels })
    }

    fn parse_group(entry: &str) -> Result<OutlineGroup> {
        let mut fields = entry.split(':');
        let mut next_int = |name: &str| -> Result<i64> {
            fields
                .next()
                .and_then(|field| field.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    GeometryError::OutlineEncoding(format!(
                        "missing or non-numeric {name} in group {entry:?}"
                    ))
                })
        };

        let start = next_int("start")?;
        let count = next_int("count")?;
        let hidden = next_int("hidden")?;
        let visible = next_int("visible")?;

        Ok(OutlineGroup {
            start,
            end: start + count - 1,
            hidden: hidden != 0,
            visible: visible != 0,
        })
    }

    /// Number of nesting levels.
    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    /// Visits every group intersecting the inclusive element range
    /// `[start, end]`, iterating levels from the last parsed level back to
    /// the first and groups within a level in increasing start order.
    /// `visit` receives `(level_idx, group_idx, &group)` with 0-based level.
    pub fn groups_intersecting<F>(&self, start: i64, end: i64, mut visit: F)
    where
        F: FnMut(usize, usize, &OutlineGroup),
    {
        if self.levels.is_empty() || start > end {
            return;
        }

        for (level_idx, groups) in self.levels.iter().enumerate().rev() {
            // First group at-or-after `start`: a group matches when it
            // contains `start`, or starts after it while its predecessor
            // ends before it.
            let found = binary_search(
                groups,
                |prev, cur: &OutlineGroup, _next| {
                    if cur.end < start {
                        return Ordering::Greater;
                    }
                    if start >= cur.start {
                        return Ordering::Equal;
                    }
                    match prev {
                        None => Ordering::Equal,
                        Some(p) if p.end < start => Ordering::Equal,
                        Some(_) => Ordering::Less,
                    }
                },
                false,
            );
            let Some(first) = found else {
                // All groups at this level end before `start`.
                continue;
            };

            for (group_idx, group) in groups.iter().enumerate().skip(first) {
                if end < group.start {
                    break;
                }
                visit(level_idx, group_idx, group);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;

    // Three nested single-group levels, as sent for grouped rows.
    const ROW_GROUPS: &str = "10:14:0:1, 13:9:0:1, 17:4:1:1, ";

    #[test]
    fn parse_levels_and_bounds() {
        let table = OutlineTable::parse(ROW_GROUPS).unwrap();
        assert_eq!(table.levels(), 3);

        let mut seen = Vec::new();
        table.groups_intersecting(0, 100, |level, index, group| {
            seen.push((level, index, group.start, group.end, group.hidden));
        });
        // Deepest parsed level first, end = start + count - 1.
        assert_eq!(
            seen,
            vec![
                (2, 0, 17, 20, true),
                (1, 0, 13, 21, false),
                (0, 0, 10, 23, false),
            ]
        );
    }

    #[test]
    fn empty_encoding_is_an_empty_table() {
        let table = OutlineTable::parse("").unwrap();
        assert_eq!(table.levels(), 0);
    }

    #[test_case("10:14:0:1 "; "missing trailing comma")]
    #[test_case("10:14:0, "; "too few fields")]
    #[test_case("10:x:0:1, "; "non-numeric count")]
    fn parse_rejects_malformed(encoding: &str) {
        assert!(OutlineTable::parse(encoding).is_err());
    }

    #[test]
    fn intersection_respects_query_range() {
        // Two groups per level: [2,4] and [8,10] at level 0, [3,3] at level 1.
        let table = OutlineTable::parse("2:3:0:1,8:3:1:1, 3:1:0:1, ").unwrap();

        let mut seen = Vec::new();
        table.groups_intersecting(5, 7, |level, index, group| {
            seen.push((level, index, group.start, group.end));
        });
        assert!(seen.is_empty());

        seen.clear();
        table.groups_intersecting(4, 8, |level, index, group| {
            seen.push((level, index, group.start, group.end));
        });
        assert_eq!(seen, vec![(0, 0, 2, 4), (0, 1, 8, 10)]);

        seen.clear();
        table.groups_intersecting(0, 3, |level, index, group| {
            seen.push((level, index, group.start, group.end));
        });
        assert_eq!(seen, vec![(1, 0, 3, 3), (0, 0, 2, 4)]);
    }

    #[test]
    fn groups_after_query_start_are_found() {
        let table = OutlineTable::parse("5:2:0:1,9:2:0:1, ").unwrap();
        let mut seen = Vec::new();
        table.groups_intersecting(0, 20, |_, index, group| seen.push((index, group.start)));
        assert_eq!(seen, vec![(0, 5), (1, 9)]);
    }
}
