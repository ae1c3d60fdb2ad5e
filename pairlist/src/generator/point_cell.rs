use crate::{Error, PairList};

use super::grid::SpatialGrid;
use super::search::PairSearch;

/// Look for the partners of each particle in `first` inside the cells of
/// `grid` close to this particle.
#[time_graph::instrument(name = "point_cell_search")]
pub(super) fn point_cell_search(
    search: &mut PairSearch<'_>,
    first: &[usize],
    grid: &dyn SpatialGrid,
    list: &mut PairList,
) -> Result<(), Error> {
    let coordinates = search.first().coordinates();

    let mut cells = Vec::new();
    for &i in first {
        if !search.begin(i) {
            continue;
        }

        grid.cells_near_point(coordinates[i], search.range_around(i), &mut cells);
        for &cell in &cells {
            for &j in grid.points(cell) {
                search.test(i, j);
            }
        }

        search.finish(i, list)?;
    }

    return Ok(());
}
