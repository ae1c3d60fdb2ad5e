use crate::{Error, PairList};

use super::grid::SpatialGrid;
use super::search::PairSearch;

/// Look for pairs between the particles in `source` and the particles in
/// `target`, finding nearby cells once for every occupied cell of `source`
/// instead of once per particle.
#[time_graph::instrument(name = "cell_cell_search")]
pub(super) fn cell_cell_search(
    search: &mut PairSearch<'_>,
    source: &dyn SpatialGrid,
    target: &dyn SpatialGrid,
    list: &mut PairList,
) -> Result<(), Error> {
    let range = search.range();

    let mut cells = Vec::new();
    for &cell in source.occupied_cells() {
        let (lower, upper) = source.cell_bounds(cell);
        target.cells_near_box(lower, upper, range, &mut cells);

        for &i in source.points(cell) {
            if !search.begin(i) {
                continue;
            }

            for &target_cell in &cells {
                for &j in target.points(target_cell) {
                    search.test(i, j);
                }
            }

            search.finish(i, list)?;
        }
    }

    return Ok(());
}
