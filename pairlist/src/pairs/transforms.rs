//! Operations creating new pair lists from existing ones. None of these
//! functions modify the list they are called on.
use crate::{Error, Selection, SelectionContainer};

use super::{PairList, PairRecord, PairExcluded};

/// OR filter on pairs: a pair `i-j` is kept if `i` is in the `first`
/// selection or `j` is in the `second` one. A missing selection contains no
/// particles.
#[derive(Debug, Clone, Copy)]
struct OrFilter<'a> {
    first: Option<&'a Selection>,
    second: Option<&'a Selection>,
}

impl<'a> OrFilter<'a> {
    /// Create a new filter, or `None` if both selections are missing
    fn new(first: Option<&'a Selection>, second: Option<&'a Selection>) -> Option<OrFilter<'a>> {
        if first.is_none() && second.is_none() {
            None
        } else {
            Some(OrFilter { first, second })
        }
    }

    fn first(&self, i: usize) -> bool {
        self.first.map_or(false, |selection| selection.contains(i))
    }

    fn second(&self, j: usize) -> bool {
        self.second.map_or(false, |selection| selection.contains(j))
    }
}

/// Check if `selection` contains `i`, a missing selection contains everything
fn and_contains(selection: Option<&Selection>, i: usize) -> bool {
    selection.map_or(true, |selection| selection.contains(i))
}

impl PairList {
    fn check_self(&self, operation: &str) -> Result<(), Error> {
        if self.is_self() {
            Ok(())
        } else {
            Err(Error::InvalidParameter(format!("{} requires a self pair list", operation)))
        }
    }

    /// Create a new explicit self pair list from this self pair list, keeping
    /// only the pairs `i-j` where both `i` and `j` are in `and_selection`, and
    /// at least one of `i` or `j` is in `or_selection`. Missing selections do
    /// not filter anything.
    pub fn to_self_pair_list(&self, and_selection: Option<&Selection>, or_selection: Option<&Selection>) -> Result<PairList, Error> {
        self.check_self("to_self_pair_list")?;

        let mut list = PairList::new_self();
        let mut partners = Vec::new();
        self.try_for_each_record(|i, all_partners| -> Result<(), Error> {
            if !and_contains(and_selection, i) {
                return Ok(());
            }

            let i_is_or = and_contains(or_selection, i);
            partners.clear();
            partners.extend(all_partners.iter().copied().filter(|&j| {
                and_contains(and_selection, j) && (i_is_or || and_contains(or_selection, j))
            }));

            if !partners.is_empty() {
                list.append(PairRecord::explicit(i, partners.clone()))?;
            }
            Ok(())
        })?;

        return Ok(list);
    }

    /// Create a new explicit cross pair list from this self pair list,
    /// containing the pairs `i-j` or `j-i` of this list with `i` in
    /// `selection1` and `j` in `selection2`. If `or_selection1` or
    /// `or_selection2` are given, only the pairs with `i` in `or_selection1` or
    /// `j` in `or_selection2` are kept.
    ///
    /// When the selections overlap, a pair can appear in both orientations in
    /// the result.
    pub fn to_cross_pair_list(
        &self,
        selection1: &Selection,
        selection2: &Selection,
        or_selection1: Option<&Selection>,
        or_selection2: Option<&Selection>,
    ) -> Result<PairList, Error> {
        self.check_self("to_cross_pair_list")?;

        let connections = self.connections_for(0)?;
        let or_filter = OrFilter::new(or_selection1, or_selection2);

        let mut list = PairList::new_cross();
        for i in selection1 {
            let partners = connections.neighbors(i).iter()
                .copied()
                .filter(|&j| selection2.contains(j))
                .filter(|&j| or_filter.map_or(true, |or| or.first(i) || or.second(j)))
                .collect::<Vec<_>>();

            if !partners.is_empty() {
                list.append(PairRecord::explicit(i, partners))?;
            }
        }

        return Ok(list);
    }

    /// Create a self pair list in excluded representation, using this self
    /// pair list as exclusions. The new list contains all pairs `i-j` with
    /// both `i` and `j` in `and_selection`, except for the pairs of this list.
    /// If `or_selection` is given, only the pairs with at least one particle
    /// in `or_selection` are kept.
    pub fn to_self_pair_list_excluded(&self, and_selection: &Selection, or_selection: Option<&Selection>) -> Result<PairList, Error> {
        self.check_self("to_self_pair_list_excluded")?;

        let connections = self.connections_for(0)?;
        let mut list = PairList::new_self_excluded(PairExcluded::from_selection(and_selection));

        for (rank, i) in and_selection.iter().enumerate() {
            let mut exclusions = connections.neighbors(i).iter()
                .copied()
                .filter(|&j| j < i && and_selection.contains(j))
                .collect::<Vec<_>>();

            if let Some(or_selection) = or_selection {
                if !or_selection.contains(i) {
                    // remove all candidates which are not in the OR selection
                    let candidates = &and_selection.indices()[..rank];
                    exclusions.extend(candidates.iter().copied().filter(|&j| !or_selection.contains(j)));
                }
            }

            exclusions.sort_unstable();
            exclusions.dedup();

            // `rank` candidates are smaller than i
            if exclusions.len() < rank {
                list.append(PairRecord::implicit(i, exclusions))?;
            }
        }

        return Ok(list);
    }

    /// Create a cross pair list in excluded representation, using this pair
    /// list as exclusions. The new list contains all pairs `i-j` with `i` in
    /// `selection1` and `j` in `selection2`, except for the pairs of this
    /// list. If `or_selection1` or `or_selection2` are given, only the pairs
    /// with `i` in `or_selection1` or `j` in `or_selection2` are kept.
    ///
    /// This list can be either a self pair list, when both selections refer to
    /// the same set of particles; or a cross pair list between the particles
    /// of `selection1` and `selection2`.
    pub fn to_cross_pair_list_excluded(
        &self,
        selection1: &Selection,
        selection2: &Selection,
        or_selection1: Option<&Selection>,
        or_selection2: Option<&Selection>,
    ) -> Result<PairList, Error> {
        let connections = self.connections_for(0)?;
        let or_filter = OrFilter::new(or_selection1, or_selection2);

        let mut list = PairList::new_cross_excluded(PairExcluded::from_selection(selection2));
        for i in selection1 {
            let mut exclusions = connections.neighbors(i).iter()
                .copied()
                .filter(|&j| selection2.contains(j))
                .collect::<Vec<_>>();

            if let Some(or_filter) = or_filter {
                if !or_filter.first(i) {
                    exclusions.extend(selection2.iter().filter(|&j| !or_filter.second(j)));
                }
            }

            exclusions.sort_unstable();
            exclusions.dedup();

            if exclusions.len() < selection2.len() {
                list.append(PairRecord::implicit(i, exclusions))?;
            }
        }

        return Ok(list);
    }

    /// Create a new explicit pair list with the same topology and pairs as
    /// this one
    pub fn to_explicit(&self) -> Result<PairList, Error> {
        let mut list = PairList::new(self.is_self(), None);
        self.try_for_each_record(|i, partners| {
            list.append(PairRecord::explicit(i, partners.to_vec()))
        })?;
        return Ok(list);
    }

    /// Create a new explicit pair list containing only the pairs where both
    /// particles are in `to_keep`, renumbered to their position inside
    /// `to_keep`. For cross pair lists, both sides of the pairs are pruned with
    /// the same selection.
    pub fn prune(&self, to_keep: &Selection) -> Result<PairList, Error> {
        let mut list = PairList::new(self.is_self(), None);
        let mut partners = Vec::new();
        self.try_for_each_record(|i, all_partners| -> Result<(), Error> {
            let Some(new_i) = to_keep.position(i) else {
                return Ok(());
            };

            partners.clear();
            partners.extend(all_partners.iter().filter_map(|&j| to_keep.position(j)));
            if !partners.is_empty() {
                list.append(PairRecord::explicit(new_i, partners.clone()))?;
            }
            Ok(())
        })?;

        return Ok(list);
    }

    /// Create a new explicit pair list where each index `i` is replaced by
    /// `selection1.indices()[i]`, and each partner `j` by
    /// `selection2.indices()[j]` (or `selection1.indices()[j]` if `selection2`
    /// is `None`). This is the inverse of [`PairList::prune`]. Self pair lists
    /// can only be renumbered with a single selection.
    pub fn renumber(&self, selection1: &Selection, selection2: Option<&Selection>) -> Result<PairList, Error> {
        if self.is_self() && selection2.is_some() {
            return Err(Error::InvalidParameter(
                "self pair lists must be renumbered with a single selection".into()
            ));
        }

        let first = selection1.indices();
        let second = selection2.map_or(first, |selection| selection.indices());
        let renumber = |map: &[usize], index: usize| {
            map.get(index).copied().ok_or(Error::IndexOutOfRange { index: index, size: map.len() })
        };

        let mut list = PairList::new(self.is_self(), None);
        self.try_for_each_record(|i, partners| {
            let new_i = renumber(first, i)?;
            let partners = partners.iter()
                .map(|&j| renumber(second, j))
                .collect::<Result<Vec<_>, _>>()?;
            list.append(PairRecord::explicit(new_i, partners))
        })?;

        return Ok(list);
    }

    /// Get the connected components of the particles in this self pair list,
    /// considering all particles in `0..upper_bound` (or up to the upper bound
    /// of this list if it is larger).
    pub fn connected_components(&self, upper_bound: usize) -> Result<SelectionContainer, Error> {
        self.check_self("connected_components")?;
        return self.connections_for(upper_bound)?.connected_components();
    }
}
