//! Predicate-driven binary search over sorted slices.
//!
//! The run-length containers in this crate search by containment windows
//! (index ranges, cumulative-position ranges) rather than by plain keys, so
//! the comparator sees the candidate's neighbors: a window starts where the
//! previous element ends. The same routine serves index lookups, cumulative
//! position lookups and outline-group queries.

use std::cmp::Ordering;

/// Binary search driven by a direction comparator.
///
/// `cmp(prev, cur, next)` reports where the (captured) key lies relative to
/// `cur`: `Less` means before it, `Equal` means `cur` matches, `Greater`
/// means after it. `prev`/`next` are `None` at the slice edges. The slice
/// must be sorted with respect to the comparator.
///
/// The first and last elements are probed before bisecting, so keys outside
/// the covered domain resolve in O(1); callers use that to clamp to the
/// nearest domain end. The probe of the last element passes `next = None`
/// even when a predecessor exists, which comparators over half-open windows
/// rely on to widen the final window.
///
/// With `first_match`, after any match the search walks backward while the
/// predecessor also matches and returns the smallest matching index. This
/// resolves duplicate keys, e.g. equal cumulative positions produced by
/// zero-size runs.
///
/// Returns `None` when no element matches.
pub fn binary_search<T, F>(items: &[T], mut cmp: F, first_match: bool) -> Option<usize>
where
    F: FnMut(Option<&T>, &T, Option<&T>) -> Ordering,
{
    let first = items.first()?;
    let last_idx = items.len() - 1;

    // Bound checks and early exit.
    match cmp(None, first, items.get(1)) {
        Ordering::Less => return None,
        Ordering::Equal => return Some(0),
        Ordering::Greater => {}
    }

    let last = items.get(last_idx)?;
    let before_last = last_idx.checked_sub(1).and_then(|i| items.get(i));
    match cmp(before_last, last, None) {
        Ordering::Greater => return None,
        Ordering::Equal => {
            return Some(if first_match {
                walk_to_first(items, &mut cmp, last_idx)
            } else {
                last_idx
            });
        }
        Ordering::Less => {}
    }

    let mut lo: usize = 0;
    let mut hi: usize = last_idx;
    let mut mid: usize = 0;
    let mut matched = false;

    while lo <= hi {
        mid = (lo + hi + 1) / 2;
        let cur = items.get(mid)?;
        let prev = mid.checked_sub(1).and_then(|i| items.get(i));
        match cmp(prev, cur, items.get(mid + 1)) {
            Ordering::Equal => {
                matched = true;
                break;
            }
            Ordering::Less => {
                let Some(h) = mid.checked_sub(1) else { break };
                hi = h;
            }
            Ordering::Greater => lo = mid + 1,
        }
    }

    if !matched {
        return None;
    }

    Some(if first_match {
        walk_to_first(items, &mut cmp, mid)
    } else {
        mid
    })
}

/// Walks backward from a known match to the lowest-index match.
fn walk_to_first<T, F>(items: &[T], cmp: &mut F, matched: usize) -> usize
where
    F: FnMut(Option<&T>, &T, Option<&T>) -> Ordering,
{
    let mut idx = matched;
    while idx > 0 {
        let candidate = idx - 1;
        let Some(cur) = items.get(candidate) else { break };
        let prev = candidate.checked_sub(1).and_then(|i| items.get(i));
        if cmp(prev, cur, items.get(candidate + 1)) != Ordering::Equal {
            break;
        }
        idx = candidate;
    }
    idx
}
