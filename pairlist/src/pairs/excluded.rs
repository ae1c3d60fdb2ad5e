use crate::Selection;

/// The set of candidate partners shared by all the records of a pair list in
/// excluded representation.
///
/// Each implicit record interacts with every candidate in its scope, except
/// for the record's own exclusions. For cross lists the scope is the full set
/// of candidates, for self lists the scope of particle `i` only contains the
/// candidates `j < i`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PairExcluded {
    /// candidate partners, strictly increasing
    indices: Vec<usize>,
}

impl PairExcluded {
    /// Create a new set of candidates from any list of indices
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> PairExcluded {
        let mut indices = indices.into_iter().collect::<Vec<_>>();
        indices.sort_unstable();
        indices.dedup();
        return PairExcluded { indices };
    }

    /// Use all the indices of `selection` as candidates
    pub fn from_selection(selection: &Selection) -> PairExcluded {
        PairExcluded { indices: selection.indices().to_vec() }
    }

    /// Get all the candidate partners
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Get the number of candidate partners
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if there are no candidate partners
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Get the candidate partners of the particle `index`
    pub fn scope(&self, index: usize, is_self: bool) -> &[usize] {
        if is_self {
            let end = self.indices.partition_point(|&j| j < index);
            &self.indices[..end]
        } else {
            &self.indices
        }
    }

    /// Count the partners of `index`, given its sorted `exclusions`
    pub fn count(&self, index: usize, exclusions: &[usize], is_self: bool) -> usize {
        let scope = self.scope(index, is_self);
        let mut excluded = 0;
        merge_scan(scope, exclusions, |_, is_excluded| {
            if is_excluded {
                excluded += 1;
            }
        });
        return scope.len() - excluded;
    }

    /// Write the partners of `index` in `output`, given its sorted
    /// `exclusions`. `output` is cleared first, and can be re-used across
    /// calls to avoid allocations.
    pub fn complement_into(&self, index: usize, exclusions: &[usize], is_self: bool, output: &mut Vec<usize>) {
        output.clear();
        merge_scan(self.scope(index, is_self), exclusions, |j, is_excluded| {
            if !is_excluded {
                output.push(j);
            }
        });
    }

    /// Get the partners of `index`, given its sorted `exclusions`
    pub fn complement(&self, index: usize, exclusions: &[usize], is_self: bool) -> Vec<usize> {
        let mut output = Vec::new();
        self.complement_into(index, exclusions, is_self, &mut output);
        return output;
    }
}

/// Walk over two sorted arrays at the same time, calling `callback` with each
/// value of `scope` and whether it is also present in `exclusions`.
fn merge_scan(scope: &[usize], exclusions: &[usize], mut callback: impl FnMut(usize, bool)) {
    let mut e = 0;
    for &j in scope {
        while e < exclusions.len() && exclusions[e] < j {
            e += 1;
        }
        callback(j, e < exclusions.len() && exclusions[e] == j);
    }
}
