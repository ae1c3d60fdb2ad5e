//! Sorted sets of particle indices, used to filter which particles take part
//! in a pair list.
use std::ops::{BitAnd, BitOr, BitXor, Sub};

use once_cell::unsync::OnceCell;

mod container;
pub use self::container::SelectionContainer;

/// A `Selection` is an immutable, sorted set of distinct particle indices.
///
/// Two derived views are computed lazily on first access and cached for the
/// lifetime of the selection: a dense membership mask (`flags`) and a dense
/// map from particle index to rank inside the selection (`positions`). Both
/// views have exactly `upper_bound()` entries, and queries past the end are
/// answered as "not selected".
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// the selected indices, strictly increasing
    indices: Vec<usize>,
    /// `flags[i]` is true if `i` is part of this selection
    flags: OnceCell<Vec<bool>>,
    /// `positions[i]` is the rank of `i` in this selection, if selected
    positions: OnceCell<Vec<Option<usize>>>,
}

impl PartialEq for Selection {
    fn eq(&self, other: &Selection) -> bool {
        self.indices == other.indices
    }
}

impl Eq for Selection {}

impl Selection {
    /// Create a new selection from any set of indices. The indices are sorted
    /// and duplicated values are removed.
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Selection {
        let mut indices = indices.into_iter().collect::<Vec<_>>();
        indices.sort_unstable();
        indices.dedup();
        return Selection::from_sorted(indices);
    }

    /// Create a selection from indices that are already sorted and unique
    fn from_sorted(indices: Vec<usize>) -> Selection {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Selection {
            indices: indices,
            flags: OnceCell::new(),
            positions: OnceCell::new(),
        }
    }

    /// Create a selection containing all the indices `i` for which `flags[i]`
    /// is true.
    pub fn from_flags(flags: &[bool]) -> Selection {
        let indices = flags.iter()
            .enumerate()
            .filter_map(|(i, &flag)| if flag { Some(i) } else { None })
            .collect();
        return Selection::from_sorted(indices);
    }

    /// Create a selection containing all indices in `0..size`
    pub fn all(size: usize) -> Selection {
        Selection::from_sorted((0..size).collect())
    }

    /// Get the selected indices, in increasing order
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Iterate over the selected indices, in increasing order
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, usize>> {
        self.indices.iter().copied()
    }

    /// Get the number of selected indices
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if this selection is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Get the largest selected index plus one, or 0 for an empty selection.
    /// This is the minimal size of any array indexed by the selected indices.
    pub fn upper_bound(&self) -> usize {
        self.indices.last().map_or(0, |&last| last + 1)
    }

    /// Get the membership mask of this selection, with `upper_bound()`
    /// entries.
    pub fn flags(&self) -> &[bool] {
        self.flags.get_or_init(|| {
            let mut flags = vec![false; self.upper_bound()];
            for &i in &self.indices {
                flags[i] = true;
            }
            flags
        })
    }

    /// Get the map from particle index to rank inside this selection, with
    /// `upper_bound()` entries.
    pub fn positions(&self) -> &[Option<usize>] {
        self.positions.get_or_init(|| {
            let mut positions = vec![None; self.upper_bound()];
            for (rank, &i) in self.indices.iter().enumerate() {
                positions[i] = Some(rank);
            }
            positions
        })
    }

    /// Check if `index` is part of this selection
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.flags().get(index).copied().unwrap_or(false)
    }

    /// Get the rank of `index` inside this selection, or `None` if `index` is
    /// not selected.
    #[inline]
    pub fn position(&self, index: usize) -> Option<usize> {
        self.positions().get(index).copied().flatten()
    }

    /// Count how many of the `selections` contain each index
    fn frequencies(selections: &[&Selection]) -> Vec<usize> {
        let upper_bound = selections.iter().map(|s| s.upper_bound()).max().unwrap_or(0);
        let mut frequencies = vec![0; upper_bound];
        for selection in selections {
            for &i in &selection.indices {
                frequencies[i] += 1;
            }
        }
        return frequencies;
    }

    /// Keep all the indices for which `keep(frequency)` is true
    fn filter_frequencies(selections: &[&Selection], keep: impl Fn(usize) -> bool) -> Selection {
        let indices = Selection::frequencies(selections).into_iter()
            .enumerate()
            .filter_map(|(i, frequency)| if keep(frequency) { Some(i) } else { None })
            .collect();
        return Selection::from_sorted(indices);
    }

    /// Get the indices present in at least one of the `selections`
    pub fn union(selections: &[&Selection]) -> Selection {
        Selection::filter_frequencies(selections, |frequency| frequency > 0)
    }

    /// Get the indices present in all of the `selections`. The intersection of
    /// no selections is empty.
    pub fn intersection(selections: &[&Selection]) -> Selection {
        let count = selections.len();
        Selection::filter_frequencies(selections, |frequency| count > 0 && frequency == count)
    }

    /// Get the indices present in an odd number of `selections`. For two
    /// selections, this is the usual symmetric difference.
    pub fn symmetric_difference(selections: &[&Selection]) -> Selection {
        Selection::filter_frequencies(selections, |frequency| frequency % 2 == 1)
    }

    /// Get the indices of the first selection which are not present in any of
    /// the other selections.
    pub fn difference(selections: &[&Selection]) -> Selection {
        let (first, others) = match selections.split_first() {
            Some(split) => split,
            None => return Selection::default(),
        };

        let others = Selection::union(others);
        let indices = first.iter().filter(|&i| !others.contains(i)).collect();
        return Selection::from_sorted(indices);
    }

    /// Get the indices in `0..upper_bound` which are not part of this
    /// selection.
    pub fn complement(&self, upper_bound: usize) -> Selection {
        let indices = (0..upper_bound).filter(|&i| !self.contains(i)).collect();
        return Selection::from_sorted(indices);
    }

    /// Intersect this selection with `to_keep`, and express the result in the
    /// local numbering of `to_keep`: each surviving index `i` is replaced by
    /// its rank inside `to_keep`.
    pub fn prune(&self, to_keep: &Selection) -> Selection {
        // positions are increasing with the index, so the output stays sorted
        let indices = self.iter().filter_map(|i| to_keep.position(i)).collect();
        return Selection::from_sorted(indices);
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Selection {
        Selection::new(iter)
    }
}

impl BitAnd for &Selection {
    type Output = Selection;

    fn bitand(self, other: &Selection) -> Selection {
        Selection::intersection(&[self, other])
    }
}

impl BitOr for &Selection {
    type Output = Selection;

    fn bitor(self, other: &Selection) -> Selection {
        Selection::union(&[self, other])
    }
}

impl BitXor for &Selection {
    type Output = Selection;

    fn bitxor(self, other: &Selection) -> Selection {
        Selection::symmetric_difference(&[self, other])
    }
}

impl Sub for &Selection {
    type Output = Selection;

    fn sub(self, other: &Selection) -> Selection {
        Selection::difference(&[self, other])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let selection = Selection::new([5, 3, 9, 3, 0, 5]);
        assert_eq!(selection.indices(), [0, 3, 5, 9]);
        assert_eq!(selection.len(), 4);
        assert_eq!(selection.upper_bound(), 10);

        let empty = Selection::new([]);
        assert!(empty.is_empty());
        assert_eq!(empty.upper_bound(), 0);
        assert!(empty.flags().is_empty());

        let selection = Selection::from_flags(&[false, true, true, false, true]);
        assert_eq!(selection.indices(), [1, 2, 4]);

        assert_eq!(Selection::all(3).indices(), [0, 1, 2]);

        let collected = [4, 1, 4].into_iter().collect::<Selection>();
        assert_eq!(collected.indices(), [1, 4]);
    }

    #[test]
    fn cached_views() {
        let selection = Selection::new([1, 4, 6]);
        assert_eq!(selection.flags(), [false, true, false, false, true, false, true]);
        assert_eq!(selection.positions(), [None, Some(0), None, None, Some(1), None, Some(2)]);

        assert!(selection.contains(4));
        assert!(!selection.contains(5));
        assert!(!selection.contains(100));

        assert_eq!(selection.position(6), Some(2));
        assert_eq!(selection.position(2), None);
        assert_eq!(selection.position(100), None);

        // clones are deep copies
        let clone = selection.clone();
        assert_eq!(clone, selection);
        assert_eq!(clone.flags(), selection.flags());
    }

    #[test]
    fn set_algebra() {
        let a = Selection::new([0, 1, 2, 5]);
        let b = Selection::new([1, 2, 3]);
        let c = Selection::new([2, 7]);

        assert_eq!(Selection::union(&[&a, &b, &c]).indices(), [0, 1, 2, 3, 5, 7]);
        assert_eq!(Selection::intersection(&[&a, &b, &c]).indices(), [2]);
        assert_eq!(Selection::intersection(&[&a, &b]).indices(), [1, 2]);
        assert_eq!(Selection::symmetric_difference(&[&a, &b]).indices(), [0, 3, 5]);
        assert_eq!(Selection::symmetric_difference(&[&a, &b, &c]).indices(), [0, 2, 3, 5, 7]);
        assert_eq!(Selection::difference(&[&a, &b]).indices(), [0, 5]);
        assert_eq!(Selection::difference(&[&a, &b, &c]).indices(), [0, 5]);

        assert!(Selection::union(&[]).is_empty());
        assert!(Selection::intersection(&[]).is_empty());
        assert!(Selection::difference(&[]).is_empty());

        assert_eq!((&a & &b).indices(), [1, 2]);
        assert_eq!((&a | &c).indices(), [0, 1, 2, 5, 7]);
        assert_eq!((&a ^ &b).indices(), [0, 3, 5]);
        assert_eq!((&a - &c).indices(), [0, 1, 5]);
    }

    #[test]
    fn complement() {
        let selection = Selection::new([1, 3]);
        assert_eq!(selection.complement(6).indices(), [0, 2, 4, 5]);
        assert_eq!(selection.complement(2).indices(), [0]);
        assert_eq!(Selection::default().complement(3).indices(), [0, 1, 2]);
    }

    #[test]
    fn prune() {
        let selection = Selection::new([1, 4, 5, 8]);
        let to_keep = Selection::new([0, 4, 6, 8, 9]);

        let pruned = selection.prune(&to_keep);
        assert_eq!(pruned.indices(), [1, 3]);

        assert!(selection.prune(&Selection::default()).is_empty());
    }
}
