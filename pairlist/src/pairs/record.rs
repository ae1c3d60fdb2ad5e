use std::borrow::Cow;

/// A single entry of a [`PairList`](super::PairList): one particle and the
/// partners it interacts with.
///
/// The two variants correspond to the two representations of a pair list. An
/// `Explicit` record stores its partners directly. An `Implicit` record
/// belongs to a list in excluded representation and stores the partners it
/// must *not* interact with: the actual partners are all the candidates of the
/// list's [`PairExcluded`](super::PairExcluded) scope, except these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairRecord {
    /// Record storing the list of partners explicitly
    Explicit {
        /// index of the particle
        index: usize,
        /// indices of the partners of the particle
        partners: Vec<usize>,
    },
    /// Record storing the partners excluded from the list's candidates
    Implicit {
        /// index of the particle
        index: usize,
        /// indices of the candidates that are not partners of the particle
        exclusions: Vec<usize>,
    },
}

impl PairRecord {
    /// Create a new explicit record
    pub fn explicit(index: usize, partners: Vec<usize>) -> PairRecord {
        PairRecord::Explicit { index, partners }
    }

    /// Create a new implicit record
    pub fn implicit(index: usize, exclusions: Vec<usize>) -> PairRecord {
        PairRecord::Implicit { index, exclusions }
    }

    /// Get the index of the particle this record is about
    pub fn index(&self) -> usize {
        match *self {
            PairRecord::Explicit { index, .. } | PairRecord::Implicit { index, .. } => index,
        }
    }

    /// Check if this record is implicit
    pub fn is_implicit(&self) -> bool {
        matches!(self, PairRecord::Implicit { .. })
    }

    /// Get the stored indices: partners for explicit records and exclusions
    /// for implicit ones
    pub fn stored(&self) -> &[usize] {
        match self {
            PairRecord::Explicit { partners, .. } => partners,
            PairRecord::Implicit { exclusions, .. } => exclusions,
        }
    }

    fn stored_mut(&mut self) -> &mut Vec<usize> {
        match self {
            PairRecord::Explicit { partners, .. } => partners,
            PairRecord::Implicit { exclusions, .. } => exclusions,
        }
    }

    /// Sort the stored indices in increasing order
    pub fn sort(&mut self) {
        self.stored_mut().sort_unstable();
    }

    /// Check if the stored indices are in increasing order
    pub fn is_sorted(&self) -> bool {
        self.stored().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Materialized view of a [`PairRecord`], containing the actual partners of
/// the particle.
///
/// For explicit records the partners are borrowed from the list, for implicit
/// records they are computed when the view is created and owned by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecordView<'a> {
    /// index of the particle
    pub index: usize,
    /// indices of the partners of the particle
    pub partners: Cow<'a, [usize]>,
}

impl PairRecordView<'_> {
    /// Get the number of partners in this record
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    /// Check if this record has no partners
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// Convert this view into an explicit record
    pub fn into_record(self) -> PairRecord {
        PairRecord::explicit(self.index, self.partners.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records() {
        let mut record = PairRecord::explicit(5, vec![3, 1, 2]);
        assert_eq!(record.index(), 5);
        assert!(!record.is_implicit());
        assert!(!record.is_sorted());

        record.sort();
        assert!(record.is_sorted());
        assert_eq!(record.stored(), [1, 2, 3]);

        let record = PairRecord::implicit(4, vec![]);
        assert_eq!(record.index(), 4);
        assert!(record.is_implicit());
        assert!(record.stored().is_empty());
    }

    #[test]
    fn views() {
        let partners = [0, 2];
        let view = PairRecordView { index: 3, partners: Cow::Borrowed(&partners) };
        assert_eq!(view.len(), 2);
        assert!(!view.is_empty());
        assert_eq!(view.into_record(), PairRecord::explicit(3, vec![0, 2]));
    }
}
