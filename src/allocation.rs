#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Random, balanced allocation of groups to markers.

use itertools::Itertools;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use tabled::Tabled;

use crate::error::ConfigurationError;

/// Groups assigned to each marker, in marker input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// One entry per marker.
    entries: Vec<(String, Vec<String>)>,
}

impl Allocation {
    /// Groups assigned to `marker`, if it took part in the allocation.
    pub fn groups_for(&self, marker: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(m, _)| m == marker)
            .map(|(_, groups)| groups.as_slice())
    }

    /// Iterates over `(marker, groups)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(m, groups)| (m.as_str(), groups.as_slice()))
    }

    /// Markers, in input order.
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    /// Total number of assignments.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, groups)| groups.len()).sum()
    }

    /// Table rows for display.
    pub fn rows(&self) -> Vec<AllocationRow> {
        self.iter()
            .map(|(marker, groups)| AllocationRow {
                marker: marker.to_string(),
                count:  groups.len(),
                groups: groups.join(", "),
            })
            .collect()
    }
}

/// One line of the allocation table.
#[derive(Tabled, Debug, Clone)]
pub struct AllocationRow {
    #[tabled(rename = "Marker")]
    /// Marker username.
    pub marker: String,
    #[tabled(rename = "Count")]
    /// Number of groups assigned.
    pub count:  usize,
    #[tabled(rename = "Groups")]
    /// Assigned groups, comma separated.
    pub groups: String,
}

/// Shuffles `groups` with `rng`, then deals them out to `markers` round-robin.
/// Every marker ends up with `floor(n/m)` or `ceil(n/m)` groups.
///
/// Duplicates in either input are collapsed, keeping first appearance.
pub fn allocate<R: Rng + ?Sized>(
    markers: &[String],
    groups: &[String],
    rng: &mut R,
) -> Result<Allocation, ConfigurationError> {
    let markers: Vec<&String> = markers.iter().unique().collect();
    if markers.is_empty() {
        return Err(ConfigurationError::NoMarkers);
    }

    let mut groups: Vec<&String> = groups.iter().unique().collect();
    groups.shuffle(rng);

    let mut entries: Vec<(String, Vec<String>)> = markers
        .iter()
        .map(|m| ((*m).clone(), Vec::new()))
        .collect();

    let slots = entries.len();
    for (index, group) in groups.into_iter().enumerate() {
        entries[index % slots].1.push(group.clone());
    }

    Ok(Allocation { entries })
}

/// Runs [`allocate`] with a `StdRng` seeded from `seed`, or with the thread
/// local generator when no seed is given.
pub fn allocate_with_seed(
    markers: &[String],
    groups: &[String],
    seed: Option<u64>,
) -> Result<Allocation, ConfigurationError> {
    match seed {
        Some(seed) => allocate(markers, groups, &mut StdRng::seed_from_u64(seed)),
        None => allocate(markers, groups, &mut rand::thread_rng()),
    }
}
