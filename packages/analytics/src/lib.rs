#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Figures for the timeline, temporal, scatter, and heatmap pages.
//!
//! Each page module reads its incidents through an [`IncidentSource`],
//! aggregates them, and returns a Plotly figure. The aggregation steps are
//! exposed separately so they can be checked without a figure around them.
//!
//! [`IncidentSource`]: crime_dashboard_data::IncidentSource

pub mod heatmap;
pub mod reference;
pub mod scatter;
pub mod temporal;
pub mod timeline;

use std::collections::HashMap;
use std::hash::Hash;

use crime_dashboard_data::DataError;
use thiserror::Error;

/// Errors that can occur while building a dashboard figure.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Loading incidents failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The data can't be turned into the requested figure.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Counts items per key, keeping keys in order of first appearance.
pub(crate) fn count_in_order<K, I>(keys: I) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, u64)> = Vec::new();

    for key in keys {
        if let Some(&pos) = positions.get(&key) {
            counts[pos].1 += 1;
        } else {
            positions.insert(key.clone(), counts.len());
            counts.push((key, 1));
        }
    }

    counts
}

/// Sorts counts in descending order, keeping first-appearance order among
/// equal counts.
pub(crate) fn sort_descending<K>(counts: &mut [(K, u64)]) {
    counts.sort_by(|(_, a), (_, b)| b.cmp(a));
}
