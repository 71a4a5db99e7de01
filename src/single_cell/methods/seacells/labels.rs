use faer::MatRef;
use rustc_hash::FxHashMap;

use crate::core::base::utils::*;

/// Final point to metacell mapping
///
/// ### Fields
///
/// * `labels` - Dense metacell id per point. `None` if the point's archetype
///   has no realised centre.
/// * `is_centre` - Whether the point is the (binarised) representative of at
///   least one archetype.
/// * `centres` - Representative point per dense metacell id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetacellLabels {
    pub labels: Vec<Option<usize>>,
    pub is_centre: Vec<bool>,
    pub centres: Vec<usize>,
}

impl MetacellLabels {
    /// Number of distinct metacells
    pub fn n_metacells(&self) -> usize {
        self.centres.len()
    }

    /// Point indices per metacell id
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_metacells()];
        for (point, label) in self.labels.iter().enumerate() {
            if let Some(id) = label {
                members[*id].push(point);
            }
        }
        members
    }
}

/// Get hard point assignments (each point assigned to one archetype)
///
/// ### Params
///
/// * `a` - Assignment matrix (k × n)
///
/// ### Returns
///
/// Archetype index (0 to k-1) per point, ties to the lower index
pub fn hard_assignments(a: MatRef<f64>) -> Vec<usize> {
    col_argmax(a)
}

/// Convert hard assignments to metacell membership lists
///
/// ### Params
///
/// * `assignments` - Archetype index per point
/// * `k` - Number of archetypes
///
/// ### Returns
///
/// Vector of length k with the point indices of every archetype
pub fn assignments_to_metacells(assignments: &[usize], k: usize) -> Vec<Vec<usize>> {
    let mut metacells = vec![Vec::new(); k];

    for (point, &archetype) in assignments.iter().enumerate() {
        metacells[archetype].push(point);
    }

    metacells
}

/// Extract metacell labels from the fitted matrices
///
/// Both matrices are binarised by column argmax. Points selected by any
/// column of the binarised B are centres. Archetypes are renumbered densely
/// (in increasing archetype order) keeping only those that are the hard
/// label of at least one centre; points of all other archetypes stay
/// unlabelled.
///
/// ### Params
///
/// * `a` - Assignment matrix (k × n)
/// * `b` - Archetype matrix (n × k)
///
/// ### Returns
///
/// The `MetacellLabels`
pub fn extract_labels(a: MatRef<f64>, b: MatRef<f64>) -> MetacellLabels {
    let n = a.ncols();
    let k = a.nrows();

    let raw = hard_assignments(a);

    let mut is_centre = vec![false; n];
    for centre in col_argmax(b) {
        is_centre[centre] = true;
    }

    // lowest-index centre per raw archetype
    let mut realised: Vec<Option<usize>> = vec![None; k];
    for (point, &archetype) in raw.iter().enumerate() {
        if is_centre[point] && realised[archetype].is_none() {
            realised[archetype] = Some(point);
        }
    }

    let mut dense_ids: FxHashMap<usize, usize> = FxHashMap::default();
    let mut centres = Vec::new();
    for (archetype, centre) in realised.iter().enumerate() {
        if let Some(point) = centre {
            dense_ids.insert(archetype, centres.len());
            centres.push(*point);
        }
    }

    let labels = raw
        .iter()
        .map(|archetype| dense_ids.get(archetype).copied())
        .collect();

    MetacellLabels {
        labels,
        is_centre,
        centres,
    }
}

///////////
// Tests //
///////////
