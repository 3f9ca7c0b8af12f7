//! Per-district point reduction.
//!
//! Both strategies work on the joined table in row order, walk districts in
//! order of first appearance, skip incidents without a district, and emit
//! at most `k` points per district. Ties are always broken by first
//! appearance, so the output is fully determined by the input order.

use std::collections::HashMap;
use std::hash::Hash;

use crime_dashboard_map_models::{JoinedIncident, ReducedPoint, ReductionStrategy};

/// Runs the reduction selected by `strategy`.
#[must_use]
pub fn reduce(strategy: ReductionStrategy, joined: &[JoinedIncident], k: usize) -> Vec<ReducedPoint> {
    match strategy {
        ReductionStrategy::RepresentativeByType => representative_by_type(joined, k),
        ReductionStrategy::Hotspot => hotspot(joined, k),
    }
}

/// For each district, one point for each of its `k` most frequent
/// categories.
///
/// The point is the middle incident (index `count / 2`) of that category's
/// incidents in the district and carries the category count.
#[must_use]
pub fn representative_by_type(joined: &[JoinedIncident], k: usize) -> Vec<ReducedPoint> {
    let mut reduced = Vec::new();

    for (_, rows) in group_by_district(joined) {
        let mut by_category = group_in_order(rows, |j| j.category);
        by_category.sort_by(|(_, a), (_, b)| b.len().cmp(&a.len()));

        for (_, rows) in by_category.into_iter().take(k) {
            reduced.push(ReducedPoint {
                incident: rows[rows.len() / 2].clone(),
                crime_count: rows.len(),
            });
        }
    }

    reduced
}

/// For each district, one point for each of its `k` busiest cells.
///
/// Cells are the incidents' coordinates rounded to three decimals (about
/// 100 m). The point is the first incident of the cell's most common
/// category and carries the cell's incident count.
#[must_use]
pub fn hotspot(joined: &[JoinedIncident], k: usize) -> Vec<ReducedPoint> {
    let mut reduced = Vec::new();

    for (_, rows) in group_by_district(joined) {
        let mut by_cell = group_in_order(rows, |j| cell_key(j.latitude, j.longitude));
        by_cell.sort_by(|(_, a), (_, b)| b.len().cmp(&a.len()));

        for (_, rows) in by_cell.into_iter().take(k) {
            let mut by_category = group_in_order(rows.iter().copied(), |j| j.category);
            // Stable: the first encountered category wins a tie.
            by_category.sort_by(|(_, a), (_, b)| b.len().cmp(&a.len()));

            if let Some((_, mode_rows)) = by_category.first() {
                reduced.push(ReducedPoint {
                    incident: mode_rows[0].clone(),
                    crime_count: rows.len(),
                });
            }
        }
    }

    reduced
}

/// Grid cell of a coordinate: latitude and longitude in thousandths of a
/// degree, rounded half to even.
#[allow(clippy::cast_possible_truncation)]
fn cell_key(latitude: f64, longitude: f64) -> (i64, i64) {
    (
        (latitude * 1000.0).round_ties_even() as i64,
        (longitude * 1000.0).round_ties_even() as i64,
    )
}

fn group_by_district(joined: &[JoinedIncident]) -> Vec<(&str, Vec<&JoinedIncident>)> {
    group_in_order(
        joined.iter().filter(|j| j.district.is_some()),
        |j| j.district.as_deref().unwrap_or_default(),
    )
}

/// Groups items by key, keeping groups in order of first appearance and
/// items in input order within each group.
fn group_in_order<'a, K, T>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&'a T) -> K,
) -> Vec<(K, Vec<&'a T>)>
where
    K: Eq + Hash + Clone,
    T: 'a,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();

    for item in items {
        let k = key(item);
        if let Some(&pos) = positions.get(&k) {
            groups[pos].1.push(item);
        } else {
            positions.insert(k.clone(), groups.len());
            groups.push((k, vec![item]));
        }
    }

    groups
}
