use std::borrow::Cow;

use crate::Error;

use super::{PairRecord, PairRecordView, PairExcluded, PairConnections};

/// Minimal number of records allocated by a pair list
const MINIMUM_CAPACITY: usize = 32;
/// Growth factor used when a pair list runs out of space for records
const GROWTH_FACTOR: f64 = 1.1;

/// A pair list stores, for a set of particles `i`, the partners `j` that `i`
/// interacts with.
///
/// Pair lists come in two topologies:
/// - *self* pair lists contain pairs between particles of the same set. Each
///   pair is stored only once, in the record of the particle with the largest
///   index: all partners `j` of the record for `i` verify `j < i`;
/// - *cross* pair lists contain pairs between two different sets of
///   particles. The records are indexed by the first set, the partners by the
///   second set.
///
/// A pair list is either in *explicit* representation, where each record
/// stores its partners, or in *excluded* representation, where each record
/// stores the candidates of a shared [`PairExcluded`] set that it does not
/// interact with.
#[derive(Debug, Clone)]
pub struct PairList {
    /// records for all the particles with partners
    records: Vec<PairRecord>,
    /// total number of pairs in all records
    number_of_pairs: usize,
    /// is this a self or cross pair list
    is_self: bool,
    /// are records sorted by index, and partners sorted inside each record
    is_sorted: bool,
    /// candidates for the excluded representation
    excluded: Option<PairExcluded>,
    /// cached connections, cleared on every modification of the records
    connections: Option<PairConnections>,
}

impl PairList {
    pub(crate) fn new(is_self: bool, excluded: Option<PairExcluded>) -> PairList {
        PairList {
            records: Vec::new(),
            number_of_pairs: 0,
            is_self: is_self,
            is_sorted: true,
            excluded: excluded,
            connections: None,
        }
    }

    /// Create an empty self pair list in explicit representation
    pub fn new_self() -> PairList {
        PairList::new(true, None)
    }

    /// Create an empty cross pair list in explicit representation
    pub fn new_cross() -> PairList {
        PairList::new(false, None)
    }

    /// Create an empty self pair list in excluded representation, where the
    /// record of particle `i` can interact with all `excluded` candidates
    /// smaller than `i`.
    pub fn new_self_excluded(excluded: PairExcluded) -> PairList {
        PairList::new(true, Some(excluded))
    }

    /// Create an empty cross pair list in excluded representation, where all
    /// records can interact with all `excluded` candidates.
    pub fn new_cross_excluded(excluded: PairExcluded) -> PairList {
        PairList::new(false, Some(excluded))
    }

    /// Create an explicit self pair list from a list of `(i, j)` pairs. Each
    /// pair is stored as `(max(i, j), min(i, j))`, pairs with `i == j` are
    /// ignored and duplicated pairs are merged.
    pub fn self_from_pairs(pairs: &[(usize, usize)]) -> Result<PairList, Error> {
        let oriented = pairs.iter()
            .filter(|(i, j)| i != j)
            .map(|&(i, j)| if i > j { (i, j) } else { (j, i) });
        return PairList::from_pair_iter(true, oriented);
    }

    /// Create an explicit cross pair list from a list of `(i, j)` pairs, where
    /// `i` belongs to the first set of particles and `j` to the second one.
    /// Duplicated pairs are merged.
    pub fn cross_from_pairs(pairs: &[(usize, usize)]) -> Result<PairList, Error> {
        return PairList::from_pair_iter(false, pairs.iter().copied());
    }

    fn from_pair_iter(is_self: bool, pairs: impl Iterator<Item = (usize, usize)>) -> Result<PairList, Error> {
        let mut pairs = pairs.collect::<Vec<_>>();
        pairs.sort_unstable();
        pairs.dedup();

        let mut list = PairList::new(is_self, None);
        let mut partners = Vec::new();
        for (n, &(i, j)) in pairs.iter().enumerate() {
            partners.push(j);
            let is_last = pairs.get(n + 1).map_or(true, |&(next, _)| next != i);
            if is_last {
                list.append(PairRecord::explicit(i, std::mem::take(&mut partners)))?;
            }
        }

        return Ok(list);
    }

    /// Add a new record to this list, taking ownership of it.
    ///
    /// The record must match the representation of the list (explicit records
    /// for explicit lists, implicit records for excluded lists), and the
    /// partners of explicit records in a self list must all be smaller than
    /// the record index. The exclusions of implicit records are sorted and
    /// de-duplicated before insertion.
    pub fn append(&mut self, mut record: PairRecord) -> Result<(), Error> {
        let count = match (&mut record, &self.excluded) {
            (PairRecord::Explicit { index, partners }, None) => {
                if self.is_self {
                    if let Some(&j) = partners.iter().find(|&&j| j >= *index) {
                        return Err(Error::InvalidParameter(format!(
                            "partner {} of particle {} is not smaller than the particle index in a self pair list",
                            j, index
                        )));
                    }
                }
                partners.len()
            }
            (PairRecord::Implicit { index, exclusions }, Some(excluded)) => {
                exclusions.sort_unstable();
                exclusions.dedup();
                excluded.count(*index, exclusions, self.is_self)
            }
            (PairRecord::Explicit { .. }, Some(_)) => {
                return Err(Error::InvalidParameter(
                    "can not add an explicit record to a pair list in excluded representation".into()
                ));
            }
            (PairRecord::Implicit { .. }, None) => {
                return Err(Error::InvalidParameter(
                    "can not add an implicit record to a pair list in explicit representation".into()
                ));
            }
        };

        if self.records.len() == self.records.capacity() {
            let capacity = self.records.capacity();
            let grown = f64::ceil(capacity as f64 * GROWTH_FACTOR) as usize;
            let target = usize::max(usize::max(capacity + 1, grown), MINIMUM_CAPACITY);
            self.records.try_reserve_exact(target - self.records.len())?;
        }

        if self.is_sorted {
            let in_order = self.records.last().map_or(true, |last| last.index() < record.index());
            self.is_sorted = in_order && record.is_sorted();
        }

        self.number_of_pairs += count;
        self.connections = None;
        self.records.push(record);

        return Ok(());
    }

    /// Change the capacity of this list to `capacity` records. The capacity
    /// never goes below the current number of records, or below a minimal
    /// capacity of 32 records.
    pub fn shrink_to(&mut self, capacity: usize) {
        let capacity = usize::max(capacity, MINIMUM_CAPACITY);
        if capacity < self.records.capacity() {
            self.records.shrink_to(capacity);
        }
    }

    /// Get the number of records this list can hold without re-allocating
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Sort the records by increasing particle index, and the stored indices
    /// of each record in increasing order. This does nothing if the list is
    /// already sorted.
    pub fn sort(&mut self) {
        if self.is_sorted {
            return;
        }

        self.records.sort_by_key(|record| record.index());
        for record in &mut self.records {
            record.sort();
        }

        self.is_sorted = true;
        self.connections = None;
    }

    /// Is this a self pair list?
    pub fn is_self(&self) -> bool {
        self.is_self
    }

    /// Are the records and their partners sorted?
    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    /// Is this list in excluded representation?
    pub fn is_excluded(&self) -> bool {
        self.excluded.is_some()
    }

    /// Get the candidate partners for lists in excluded representation
    pub fn excluded(&self) -> Option<&PairExcluded> {
        self.excluded.as_ref()
    }

    /// Get the number of records in this list
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this list contains no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the total number of pairs in this list
    pub fn number_of_pairs(&self) -> usize {
        self.number_of_pairs
    }

    /// Get the records as they are stored in this list
    pub fn records(&self) -> &[PairRecord] {
        &self.records
    }

    /// Count the partners of a stored record
    fn record_size(&self, record: &PairRecord) -> usize {
        match (record, &self.excluded) {
            (PairRecord::Implicit { index, exclusions }, Some(excluded)) => {
                excluded.count(*index, exclusions, self.is_self)
            }
            _ => record.stored().len(),
        }
    }

    /// Get the largest number of partners of any record in this list
    pub fn maximum_record_size(&self) -> usize {
        self.records.iter().map(|record| self.record_size(record)).max().unwrap_or(0)
    }

    /// Get the record at position `n` in this list, with its partners
    /// materialized.
    ///
    /// For lists in excluded representation, this computes the partners of
    /// the record and the returned view owns them.
    pub fn get(&self, n: usize) -> Option<PairRecordView<'_>> {
        let record = self.records.get(n)?;
        let partners = match (record, &self.excluded) {
            (PairRecord::Implicit { index, exclusions }, Some(excluded)) => {
                Cow::Owned(excluded.complement(*index, exclusions, self.is_self))
            }
            _ => Cow::Borrowed(record.stored()),
        };

        return Some(PairRecordView {
            index: record.index(),
            partners: partners,
        });
    }

    /// Iterate over all the records in this list, with their partners
    /// materialized.
    pub fn iter(&self) -> PairListIter<'_> {
        PairListIter {
            list: self,
            current: 0,
        }
    }

    /// Call `function` with the particle index and partners of every record
    /// in this list.
    ///
    /// For lists in excluded representation, the partners are computed in a
    /// single buffer re-used for all the records, which is cheaper than
    /// [`PairList::iter`].
    pub fn for_each_record(&self, mut function: impl FnMut(usize, &[usize])) {
        let result = self.try_for_each_record(|i, partners| {
            function(i, partners);
            Ok::<(), std::convert::Infallible>(())
        });

        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Same as [`PairList::for_each_record`], stopping at the first error
    /// returned by `function`.
    pub fn try_for_each_record<E>(&self, mut function: impl FnMut(usize, &[usize]) -> Result<(), E>) -> Result<(), E> {
        match &self.excluded {
            None => {
                for record in &self.records {
                    function(record.index(), record.stored())?;
                }
            }
            Some(excluded) => {
                let mut work = Vec::with_capacity(excluded.len());
                for record in &self.records {
                    excluded.complement_into(record.index(), record.stored(), self.is_self, &mut work);
                    function(record.index(), &work)?;
                }
            }
        }
        return Ok(());
    }

    /// Get all the pairs in this list as `(i, j)` tuples
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::with_capacity(self.number_of_pairs);
        self.for_each_record(|i, partners| {
            pairs.extend(partners.iter().map(|&j| (i, j)));
        });
        return pairs;
    }

    /// Get the upper bounds (largest index plus one) of the particles and of
    /// their partners in this list. Only records with at least one partner are
    /// considered.
    pub fn upper_bounds(&self) -> (usize, usize) {
        let mut first = 0;
        let mut second = 0;
        self.for_each_record(|i, partners| {
            if let Some(&j) = partners.iter().max() {
                first = usize::max(first, i + 1);
                second = usize::max(second, j + 1);
            }
        });
        return (first, second);
    }

    /// Get the upper bound (largest index plus one) of all the particles
    /// referenced by this list.
    pub fn upper_bound(&self) -> usize {
        let (first, second) = self.upper_bounds();
        return usize::max(first, second);
    }

    /// Get the cached connections of this list, if any
    pub fn connections(&self) -> Option<&PairConnections> {
        self.connections.as_ref()
    }

    /// Get the connections of this list with at least `upper_bound` rows,
    /// building and caching them if needed. Cached connections are re-used as
    /// long as they have enough rows.
    pub fn make_connections(&mut self, upper_bound: usize) -> Result<&PairConnections, Error> {
        let cached = match self.connections.take() {
            Some(connections) if connections.len() >= upper_bound => Some(connections),
            _ => None,
        };

        let connections = match cached {
            Some(connections) => connections,
            None => PairConnections::new(self, upper_bound)?,
        };

        let connections: &PairConnections = self.connections.insert(connections);
        return Ok(connections);
    }

    /// Get the cached connections if they have at least `upper_bound` rows,
    /// or build new ones without caching them.
    pub(crate) fn connections_for(&self, upper_bound: usize) -> Result<Cow<'_, PairConnections>, Error> {
        match &self.connections {
            Some(connections) if connections.len() >= upper_bound => Ok(Cow::Borrowed(connections)),
            _ => Ok(Cow::Owned(PairConnections::new(self, upper_bound)?)),
        }
    }
}

/// Iterator over the materialized records of a [`PairList`]
#[derive(Debug, Clone)]
pub struct PairListIter<'a> {
    list: &'a PairList,
    current: usize,
}

impl<'a> Iterator for PairListIter<'a> {
    type Item = PairRecordView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.list.get(self.current)?;
        self.current += 1;
        return Some(record);
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PairListIter<'_> {}

impl<'a> IntoIterator for &'a PairList {
    type Item = PairRecordView<'a>;
    type IntoIter = PairListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append() {
        let mut list = PairList::new_self();
        assert!(list.is_empty());
        assert!(list.is_sorted());

        list.append(PairRecord::explicit(1, vec![0])).unwrap();
        list.append(PairRecord::explicit(4, vec![0, 2, 3])).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.number_of_pairs(), 4);
        assert_eq!(list.maximum_record_size(), 3);
        assert!(list.is_sorted());
        assert_eq!(list.capacity(), 32);

        list.append(PairRecord::explicit(3, vec![1])).unwrap();
        assert!(!list.is_sorted());

        let error = list.append(PairRecord::explicit(2, vec![0, 2])).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let error = list.append(PairRecord::implicit(2, vec![0])).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));
        assert_eq!(list.len(), 3);
        assert_eq!(list.number_of_pairs(), 5);

        // cross lists accept any partner
        let mut list = PairList::new_cross();
        list.append(PairRecord::explicit(0, vec![3, 7])).unwrap();
        assert_eq!(list.upper_bounds(), (1, 8));
        assert_eq!(list.upper_bound(), 8);
    }

    #[test]
    fn growth() {
        let mut list = PairList::new_cross();
        for i in 0..33 {
            list.append(PairRecord::explicit(i, vec![0])).unwrap();
        }
        assert_eq!(list.len(), 33);
        assert_eq!(list.capacity(), 36);

        list.shrink_to(0);
        assert!(list.capacity() >= 33);

        let mut list = PairList::new_cross();
        list.append(PairRecord::explicit(0, vec![0])).unwrap();
        list.shrink_to(4);
        assert_eq!(list.capacity(), 32);
    }

    #[test]
    fn sort() {
        let mut list = PairList::new_self();
        list.append(PairRecord::explicit(5, vec![4, 1])).unwrap();
        list.append(PairRecord::explicit(2, vec![0])).unwrap();
        assert!(!list.is_sorted());

        list.sort();
        assert!(list.is_sorted());
        assert_eq!(list.records(), [
            PairRecord::explicit(2, vec![0]),
            PairRecord::explicit(5, vec![1, 4]),
        ]);

        // sorting again does not change anything
        let before = list.records().to_vec();
        list.sort();
        assert!(list.is_sorted());
        assert_eq!(list.records(), before);
    }

    #[test]
    fn from_pairs() {
        let list = PairList::self_from_pairs(&[(0, 1), (2, 1), (1, 0), (3, 3), (2, 0)]).unwrap();
        assert!(list.is_self());
        assert!(list.is_sorted());
        assert_eq!(list.number_of_pairs(), 3);
        assert_eq!(list.pairs(), [(1, 0), (2, 0), (2, 1)]);

        let list = PairList::cross_from_pairs(&[(0, 1), (2, 1), (1, 0), (3, 3), (2, 1)]).unwrap();
        assert!(!list.is_self());
        assert_eq!(list.pairs(), [(0, 1), (1, 0), (2, 1), (3, 3)]);

        let list = PairList::self_from_pairs(&[]).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.upper_bound(), 0);
    }

    #[test]
    fn excluded_representation() {
        let excluded = PairExcluded::from_indices(0..5);
        let mut list = PairList::new_self_excluded(excluded);
        assert!(list.is_excluded());

        list.append(PairRecord::implicit(2, vec![])).unwrap();
        list.append(PairRecord::implicit(4, vec![3, 1, 3])).unwrap();
        assert_eq!(list.number_of_pairs(), 4);
        assert_eq!(list.maximum_record_size(), 2);
        assert_eq!(list.records()[1], PairRecord::implicit(4, vec![1, 3]));

        let records = list.iter().collect::<Vec<_>>();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 2);
        assert_eq!(&*records[0].partners, [0, 1]);
        assert_eq!(records[1].index, 4);
        assert_eq!(&*records[1].partners, [0, 2]);

        // two views do not share their partners
        let first = list.get(0).unwrap();
        let second = list.get(1).unwrap();
        assert_ne!(first.partners, second.partners);

        assert_eq!(list.pairs(), [(2, 0), (2, 1), (4, 0), (4, 2)]);
        assert_eq!(list.upper_bounds(), (5, 3));

        let error = list.append(PairRecord::explicit(3, vec![0])).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let mut list = PairList::new_cross_excluded(PairExcluded::from_indices([1, 3, 5]));
        list.append(PairRecord::implicit(0, vec![3])).unwrap();
        list.append(PairRecord::implicit(7, vec![])).unwrap();
        assert_eq!(list.number_of_pairs(), 5);
        assert_eq!(list.pairs(), [(0, 1), (0, 5), (7, 1), (7, 3), (7, 5)]);
    }

    #[test]
    fn iterator() {
        let list = PairList::self_from_pairs(&[(1, 0), (3, 2), (3, 0)]).unwrap();
        let mut iter = list.iter();
        assert_eq!(iter.len(), 2);

        let record = iter.next().unwrap();
        assert_eq!(record.index, 1);
        assert!(matches!(record.partners, Cow::Borrowed(_)));
        assert_eq!(iter.len(), 1);

        let record = iter.next().unwrap();
        assert_eq!(record.index, 3);
        assert_eq!(&*record.partners, [0, 2]);

        assert!(iter.next().is_none());
        assert!(list.get(2).is_none());

        let mut count = 0;
        for record in &list {
            count += record.len();
        }
        assert_eq!(count, list.number_of_pairs());
    }

    #[test]
    fn connections_cache() {
        let mut list = PairList::self_from_pairs(&[(1, 0), (2, 1)]).unwrap();
        assert!(list.connections().is_none());

        assert_eq!(list.make_connections(0).unwrap().len(), 3);
        assert_eq!(list.make_connections(6).unwrap().len(), 6);
        // the cache is never shrunk
        assert_eq!(list.make_connections(2).unwrap().len(), 6);
        assert_eq!(list.connections().unwrap().neighbors(1), [0, 2]);

        // modifications clear the cache
        list.append(PairRecord::explicit(4, vec![3])).unwrap();
        assert!(list.connections().is_none());
        assert_eq!(list.connections_for(0).unwrap().neighbors(3), [4]);
    }
}
