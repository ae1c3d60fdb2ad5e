use crate::{Error, PairList};

use super::search::PairSearch;

/// Check all pairs between the `first` and `second` particles. Both slices
/// must be sorted in increasing order.
#[time_graph::instrument(name = "direct_search")]
pub(super) fn direct_search(
    search: &mut PairSearch<'_>,
    first: &[usize],
    second: &[usize],
    list: &mut PairList,
) -> Result<(), Error> {
    let is_self = search.is_self();
    for &i in first {
        if !search.begin(i) {
            continue;
        }

        for &j in second {
            if is_self && j >= i {
                break;
            }
            search.test(i, j);
        }

        search.finish(i, list)?;
    }

    return Ok(());
}
