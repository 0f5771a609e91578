//! Run-length containers over a contiguous element-index domain.
//!
//! The layout authority describes per-element sizes and flags for up to a
//! million rows/columns as a handful of runs. [`RunList`] stores value runs
//! (sizes in twips) plus optional per-run derived data built in one forward
//! pass; [`BoolRunList`] stores flag runs (hidden/filtered) as flip
//! boundaries. Both cover `[0, max_index]` with no gaps or overlaps.
//!
//! Encoding grammar (authority wire format): `"<value>:<end>"` tokens
//! separated by single spaces, with a trailing separator; the final split is
//! a terminator and is ignored. Boolean lists start with `"<bit>:<end>"`
//! followed by bare boundary integers.

use std::cmp::Ordering;

use crate::error::{GeometryError, Result};
use crate::search::binary_search;

/// One maximal range of equal-valued elements. `end` is the last covered
/// index; the run starts one past the previous run's `end` (0 for the first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run<D> {
    pub end: i64,
    pub value: i64,
    pub derived: D,
}

/// Query view of a run with its start index materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSpan<D> {
    pub start: i64,
    pub end: i64,
    pub value: i64,
    pub derived: D,
}

impl<D> RunSpan<D> {
    /// Number of elements covered by the run.
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Ordered run-length list with per-run derived-data caching.
#[derive(Debug, Clone, Default)]
pub struct RunList<D> {
    runs: Vec<Run<D>>,
}

impl<D: Clone + Default> RunList<D> {
    /// Parses an encoded run list. Fails on malformed tokens, non-numeric
    /// values, non-increasing end indices, or fewer than one run.
    pub fn parse(encoding: &str) -> Result<Self> {
        let mut splits: Vec<&str> = encoding.split(' ').collect();
        // The encoding ends with a separator, so the last split is a
        // terminator, not a run.
        splits.pop();
        if splits.is_empty() {
            return Err(GeometryError::RunEncoding(format!(
                "expected at least one run token in {encoding:?}"
            )));
        }

        let mut runs: Vec<Run<D>> = Vec::with_capacity(splits.len());
        for token in splits {
            let (value, end) = token.split_once(':').ok_or_else(|| {
                GeometryError::RunEncoding(format!("malformed run token {token:?}"))
            })?;
            let value: i64 = value.parse().map_err(|_| {
                GeometryError::RunEncoding(format!("non-numeric run value in {token:?}"))
            })?;
            let end: i64 = end.parse().map_err(|_| {
                GeometryError::RunEncoding(format!("non-numeric run end in {token:?}"))
            })?;
            if let Some(prev) = runs.last() {
                if end <= prev.end {
                    return Err(GeometryError::RunEncoding(format!(
                        "run end {end} does not increase past {}",
                        prev.end
                    )));
                }
            } else if end < 0 {
                return Err(GeometryError::RunEncoding(format!(
                    "negative run end {end}"
                )));
            }
            runs.push(Run {
                end,
                value,
                derived: D::default(),
            });
        }

        Ok(Self { runs })
    }
}

impl<D: Clone> RunList<D> {
    /// Last covered element index, or `None` for a never-loaded list.
    pub fn max_index(&self) -> Option<i64> {
        self.runs.last().map(|run| run.end)
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Rebuilds the derived data in one forward pass. `f` receives each
    /// run's end index, value and element count in index order, so cumulative
    /// state lives in the closure.
    pub fn attach<F>(&mut self, mut f: F)
    where
        F: FnMut(i64, i64, i64) -> D,
    {
        let mut prev_end = -1i64;
        for run in &mut self.runs {
            run.derived = f(run.end, run.value, run.end - prev_end);
            prev_end = run.end;
        }
    }

    /// Finds the run containing element `index`.
    pub fn by_index(&self, index: i64) -> Option<RunSpan<D>> {
        let id = binary_search(
            &self.runs,
            |prev, cur: &Run<D>, _next| {
                let start = prev.map_or(0, |p: &Run<D>| p.end + 1);
                if index < start {
                    Ordering::Less
                } else if cur.end < index {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            },
            false,
        )?;
        self.span(id)
    }

    /// Finds the first run whose derived-field window contains `key`.
    ///
    /// `field` extracts a cumulative, non-decreasing value that starts from 0
    /// at the front of the list. The window of run *i* is
    /// `[field(i-1), field(i) - 1]`, except the last run whose window is
    /// closed at `field(last)`. Zero-size runs produce empty windows and
    /// duplicate boundaries; the first match (lowest index) wins.
    pub fn by_derived<F>(&self, key: f64, field: F) -> Option<RunSpan<D>>
    where
        F: Fn(&D) -> i64,
    {
        let id = binary_search(
            &self.runs,
            |prev, cur: &Run<D>, next| {
                let lo = prev.map_or(0, |p: &Run<D>| field(&p.derived));
                let hi = field(&cur.derived) - i64::from(next.is_some());
                if key < lo as f64 {
                    Ordering::Less
                } else if (hi as f64) < key {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            },
            true,
        )?;
        self.span(id)
    }

    /// Visits every run in index order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&RunSpan<D>),
    {
        let mut start = 0i64;
        for run in &self.runs {
            f(&RunSpan {
                start,
                end: run.end,
                value: run.value,
                derived: run.derived.clone(),
            });
            start = run.end + 1;
        }
    }

    /// Visits every run overlapping the inclusive element range `[lo, hi]`.
    pub fn for_each_in_range<F>(&self, lo: i64, hi: i64, mut f: F)
    where
        F: FnMut(&RunSpan<D>),
    {
        if lo > hi {
            return;
        }
        let Some(first) = self.by_index(lo) else {
            return;
        };
        let mut start = first.start;
        for run in self.runs.iter().skip_while(|run| run.end < lo) {
            if start > hi {
                break;
            }
            f(&RunSpan {
                start,
                end: run.end,
                value: run.value,
                derived: run.derived.clone(),
            });
            start = run.end + 1;
        }
    }

    /// Produces a copy with value 0 wherever `mask` is set. Two-pointer sweep
    /// over the merged boundary set, O(n + m). Both operands must cover the
    /// same domain.
    pub fn zero_outside<E: Clone + Default>(&self, mask: &BoolRunList) -> Result<RunList<E>> {
        let left = self.max_index().unwrap_or(-1);
        let right = mask.max_index().unwrap_or(-1);
        if left != right || left < 0 {
            return Err(GeometryError::DomainMismatch { left, right });
        }

        let max_index = left;
        let mut out: Vec<Run<E>> = Vec::new();

        let mut this_idx = 0usize;
        let mut mask_idx = 0usize;
        let mut zero_bit = mask.start_bit;
        let value_at = |idx: usize, zero: bool| -> i64 {
            if zero {
                0
            } else {
                self.runs.get(idx).map_or(0, |run| run.value)
            }
        };
        let mut cur_value = value_at(this_idx, zero_bit);

        while this_idx < self.runs.len() && mask_idx < mask.boundaries.len() {
            let this_end = match self.runs.get(this_idx) {
                Some(run) => run.end,
                None => break,
            };
            let mask_end = match mask.boundaries.get(mask_idx) {
                Some(end) => *end,
                None => break,
            };

            let boundary = this_end.min(mask_end);
            if this_end <= mask_end {
                this_idx += 1;
            }
            if mask_end <= this_end {
                zero_bit = !zero_bit;
                mask_idx += 1;
            }

            let next_value = if this_idx < self.runs.len() {
                value_at(this_idx, zero_bit)
            } else {
                cur_value
            };

            if cur_value != next_value || boundary >= max_index {
                out.push(Run {
                    end: boundary,
                    value: cur_value,
                    derived: E::default(),
                });
                cur_value = next_value;
            }
        }

        Ok(RunList { runs: out })
    }

    fn span(&self, id: usize) -> Option<RunSpan<D>> {
        let run = self.runs.get(id)?;
        let start = match id.checked_sub(1).and_then(|i| self.runs.get(i)) {
            Some(prev) => prev.end + 1,
            None => 0,
        };
        Some(RunSpan {
            start,
            end: run.end,
            value: run.value,
            derived: run.derived.clone(),
        })
    }
}

/// Boolean run-length list stored as a start flag plus flip boundaries: the
/// flag holds for `[0, boundaries[0]]` and flips after every boundary.
#[derive(Debug, Clone, Default)]
pub struct BoolRunList {
    start_bit: bool,
    boundaries: Vec<i64>,
}

impl BoolRunList {
    /// Parses an encoded boolean run list.
    pub fn parse(encoding: &str) -> Result<Self> {
        let mut splits: Vec<&str> = encoding.split(' ').collect();
        splits.pop();
        let mut tokens = splits.into_iter();
        let head = tokens.next().ok_or_else(|| {
            GeometryError::FlagEncoding(format!(
                "expected at least one flag token in {encoding:?}"
            ))
        })?;
        let (bit, first) = head.split_once(':').ok_or_else(|| {
            GeometryError::FlagEncoding(format!("malformed flag head {head:?}"))
        })?;
        let bit: i64 = bit.parse().map_err(|_| {
            GeometryError::FlagEncoding(format!("non-numeric start bit in {head:?}"))
        })?;
        let first: i64 = first.parse().map_err(|_| {
            GeometryError::FlagEncoding(format!("non-numeric boundary in {head:?}"))
        })?;
        if first < 0 {
            return Err(GeometryError::FlagEncoding(format!(
                "negative boundary {first}"
            )));
        }

        let mut boundaries = vec![first];
        for token in tokens {
            let end: i64 = token.parse().map_err(|_| {
                GeometryError::FlagEncoding(format!("non-numeric boundary {token:?}"))
            })?;
            if boundaries.last().is_some_and(|prev| end <= *prev) {
                return Err(GeometryError::FlagEncoding(format!(
                    "boundary {end} does not increase"
                )));
            }
            boundaries.push(end);
        }

        Ok(Self {
            start_bit: bit != 0,
            boundaries,
        })
    }

    /// Last covered element index, or `None` for a never-loaded list.
    pub fn max_index(&self) -> Option<i64> {
        self.boundaries.last().copied()
    }

    /// Flag value at element `index`. Out-of-domain indices report the
    /// trailing flag value.
    pub fn is_set(&self, index: i64) -> bool {
        let flips = self.boundaries.iter().take_while(|end| **end < index).count();
        self.start_bit ^ (flips % 2 == 1)
    }

    /// OR of two flag streams via a synchronized boundary sweep, O(n + m).
    /// Both operands must cover the same domain.
    pub fn union(&self, other: &BoolRunList) -> Result<BoolRunList> {
        let left = self.max_index().unwrap_or(-1);
        let right = other.max_index().unwrap_or(-1);
        if left != right || left < 0 {
            return Err(GeometryError::DomainMismatch { left, right });
        }

        let max_index = left;
        let mut this_bit = self.start_bit;
        let mut other_bit = other.start_bit;
        let mut result = BoolRunList {
            start_bit: this_bit || other_bit,
            boundaries: Vec::new(),
        };
        let mut cur_bit = result.start_bit;

        let mut this_idx = 0usize;
        let mut other_idx = 0usize;
        while this_idx < self.boundaries.len() && other_idx < other.boundaries.len() {
            let this_end = match self.boundaries.get(this_idx) {
                Some(end) => *end,
                None => break,
            };
            let other_end = match other.boundaries.get(other_idx) {
                Some(end) => *end,
                None => break,
            };

            let boundary = this_end.min(other_end);
            if this_end <= other_end {
                this_bit = !this_bit;
                this_idx += 1;
            }
            if other_end <= this_end {
                other_bit = !other_bit;
                other_idx += 1;
            }

            let next_bit = this_bit || other_bit;
            if cur_bit != next_bit || boundary >= max_index {
                result.boundaries.push(boundary);
                cur_bit = next_bit;
            }
        }

        Ok(result)
    }
}
