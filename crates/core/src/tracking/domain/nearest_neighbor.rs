use std::collections::HashSet;

use super::locatable::Locatable;

/// Greedy nearest-neighbour assignment.
///
/// All `(tracked, observed)` pairs closer than `max_distance` are sorted by
/// ascending distance (ties broken by index) and taken greedily, so each
/// side is used at most once. Returns `(tracked_index, observed_index)`.
pub fn match_nearest<T: Locatable, O: Locatable>(
    tracked: &[T],
    observed: &[O],
    max_distance: f64,
) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (ti, t) in tracked.iter().enumerate() {
        for (oi, o) in observed.iter().enumerate() {
            let d = t.tracking_distance(o);
            if d < max_distance {
                pairs.push((ti, oi, d));
            }
        }
    }
    pairs.sort_by(|a, b| {
        a.2.partial_cmp(&b.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });

    let mut used_tracked = HashSet::new();
    let mut used_observed = HashSet::new();
    let mut matches = Vec::new();
    for (ti, oi, _) in pairs {
        if !used_tracked.contains(&ti) && !used_observed.contains(&oi) {
            used_tracked.insert(ti);
            used_observed.insert(oi);
            matches.push((ti, oi));
        }
    }
    matches
}
