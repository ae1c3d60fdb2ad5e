use ndarray::Array3;

use crate::{Error, Selection, Vector3D};

/// Maximal number of cells in a `RegularGrid`, we need to use this to prevent
/// having too many cells with a small cell size and widely spread particles
const MAX_NUMBER_OF_CELLS: f64 = 1e5;

/// Relative tolerance used when deciding if a cell is in range of another
const RANGE_TOLERANCE: f64 = 1e-6;

/// A spatial grid sorts particles into cells, to only look at nearby cells
/// when searching for pairs.
///
/// Cells are identified by an integer, and each cell covers an axis-aligned
/// box in space.
pub trait SpatialGrid {
    /// Get the identifiers of all cells containing at least one particle
    fn occupied_cells(&self) -> &[usize];

    /// Get the particles inside the given `cell`
    fn points(&self, cell: usize) -> &[usize];

    /// Get the lower and upper corner of the box covered by `cell`
    fn cell_bounds(&self, cell: usize) -> (Vector3D, Vector3D);

    /// Fill `cells` with all the occupied cells containing points that could
    /// be at a distance smaller than `range` from any point inside the box
    /// going from `lower` to `upper`.
    fn cells_near_box(&self, lower: Vector3D, upper: Vector3D, range: f64, cells: &mut Vec<usize>);

    /// Fill `cells` with all the occupied cells within `range` of the cell
    /// containing `position`. The containing cell does not need to be inside
    /// the grid.
    fn cells_near_point(&self, position: Vector3D, range: f64, cells: &mut Vec<usize>);
}

/// Squared distance between two axis-aligned boxes, zero if they overlap
fn box_distance2(lower_a: Vector3D, upper_a: Vector3D, lower_b: Vector3D, upper_b: Vector3D) -> f64 {
    let mut distance2 = 0.0;
    for xyz in 0..3 {
        let gap = f64::max(0.0, f64::max(lower_b[xyz] - upper_a[xyz], lower_a[xyz] - upper_b[xyz]));
        distance2 += gap * gap;
    }
    return distance2;
}

/// Get the lower and upper corner of the bounding box of the given
/// `coordinates`, or `None` if there are no `indices`
pub(crate) fn bounding_box(coordinates: &[Vector3D], indices: &[usize]) -> Option<(Vector3D, Vector3D)> {
    let (&first, rest) = indices.split_first()?;
    let mut lower = coordinates[first];
    let mut upper = coordinates[first];
    for &i in rest {
        lower = lower.min(&coordinates[i]);
        upper = upper.max(&coordinates[i]);
    }
    return Some((lower, upper));
}

/// Number of cells of size `cell_size` needed to cover `extent`. This is kept
/// as floating point values, which can not overflow for large extents.
fn cells_along(extent: Vector3D, cell_size: f64) -> [f64; 3] {
    [
        f64::floor(extent[0] / cell_size) + 1.0,
        f64::floor(extent[1] / cell_size) + 1.0,
        f64::floor(extent[2] / cell_size) + 1.0,
    ]
}

/// A regular grid of cubic cells, covering the bounding box of a set of
/// particles.
#[derive(Debug, Clone)]
pub struct RegularGrid {
    /// lower corner of the first cell
    origin: Vector3D,
    /// side length of the cells
    cell_size: f64,
    /// the cells themselves
    cells: Array3<Vec<usize>>,
    /// identifiers of the non-empty cells, in increasing order
    occupied: Vec<usize>,
}

impl RegularGrid {
    /// Create a new grid containing the particles in `selection` (or all the
    /// particles if `selection` is `None`), with cells of the given size.
    ///
    /// The cell size is increased if needed to keep the total number of cells
    /// reasonable.
    pub fn new(coordinates: &[Vector3D], selection: Option<&Selection>, cell_size: f64) -> Result<RegularGrid, Error> {
        match selection {
            Some(selection) => {
                if selection.upper_bound() > coordinates.len() {
                    return Err(Error::IndexOutOfRange {
                        index: selection.upper_bound() - 1,
                        size: coordinates.len(),
                    });
                }
                RegularGrid::from_indices(coordinates, selection.indices(), cell_size)
            }
            None => {
                let indices = (0..coordinates.len()).collect::<Vec<_>>();
                RegularGrid::from_indices(coordinates, &indices, cell_size)
            }
        }
    }

    pub(crate) fn from_indices(coordinates: &[Vector3D], indices: &[usize], cell_size: f64) -> Result<RegularGrid, Error> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "grid cell size must be a positive number, got {}", cell_size
            )));
        }

        let (lower, upper) = match bounding_box(coordinates, indices) {
            Some(bounds) => bounds,
            None => {
                return Ok(RegularGrid {
                    origin: Vector3D::zero(),
                    cell_size: cell_size,
                    cells: Array3::from_elem((1, 1, 1), Vec::new()),
                    occupied: Vec::new(),
                });
            }
        };

        let extent = upper - lower;
        if !(extent[0].is_finite() && extent[1].is_finite() && extent[2].is_finite()) {
            return Err(Error::InvalidParameter(
                "particles positions must be finite to build a grid".into()
            ));
        }

        let mut cell_size = cell_size;
        let mut n_cells = cells_along(extent, cell_size);

        // limit memory consumption by increasing the cell size until we have
        // less than `MAX_NUMBER_OF_CELLS` cells
        let mut n_cells_total = n_cells[0] * n_cells[1] * n_cells[2];
        while n_cells_total > MAX_NUMBER_OF_CELLS {
            cell_size *= f64::max(f64::cbrt(n_cells_total / MAX_NUMBER_OF_CELLS), 1.01);
            n_cells = cells_along(extent, cell_size);
            n_cells_total = n_cells[0] * n_cells[1] * n_cells[2];
        }

        let n_cells = [
            n_cells[0] as usize,
            n_cells[1] as usize,
            n_cells[2] as usize,
        ];

        let mut cells = Array3::from_elem(n_cells, Vec::new());
        for &i in indices {
            let position = coordinates[i] - lower;
            let cell = [
                usize::min(f64::floor(position[0] / cell_size) as usize, n_cells[0] - 1),
                usize::min(f64::floor(position[1] / cell_size) as usize, n_cells[1] - 1),
                usize::min(f64::floor(position[2] / cell_size) as usize, n_cells[2] - 1),
            ];
            cells[cell].push(i);
        }

        let occupied = cells.iter()
            .enumerate()
            .filter_map(|(id, points)| if points.is_empty() { None } else { Some(id) })
            .collect();

        return Ok(RegularGrid {
            origin: lower,
            cell_size: cell_size,
            cells: cells,
            occupied: occupied,
        });
    }

    /// Get the side length of the cells in this grid
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Get the number of cells along each axis
    pub fn shape(&self) -> [usize; 3] {
        let shape = self.cells.shape();
        [shape[0], shape[1], shape[2]]
    }

    fn cell_index(&self, id: usize) -> [usize; 3] {
        let [_, ny, nz] = self.shape();
        [id / (ny * nz), (id / nz) % ny, id % nz]
    }

    fn cell_id(&self, [x, y, z]: [usize; 3]) -> usize {
        let [_, ny, nz] = self.shape();
        (x * ny + y) * nz + z
    }

    /// Lower corner of the cell at the given integer coordinates, which can
    /// be outside the grid
    fn cell_corner(&self, cell: [f64; 3]) -> Vector3D {
        self.origin + Vector3D::from(cell) * self.cell_size
    }
}

impl SpatialGrid for RegularGrid {
    fn occupied_cells(&self) -> &[usize] {
        &self.occupied
    }

    fn points(&self, cell: usize) -> &[usize] {
        &self.cells[self.cell_index(cell)]
    }

    fn cell_bounds(&self, cell: usize) -> (Vector3D, Vector3D) {
        let [x, y, z] = self.cell_index(cell);
        let lower = self.cell_corner([x as f64, y as f64, z as f64]);
        let size = self.cell_size;
        return (lower, lower + Vector3D::new(size, size, size));
    }

    fn cells_near_box(&self, lower: Vector3D, upper: Vector3D, range: f64, cells: &mut Vec<usize>) {
        cells.clear();

        let range = range + RANGE_TOLERANCE * self.cell_size;
        let shape = self.shape();

        let mut start = [0; 3];
        let mut stop = [0; 3];
        for xyz in 0..3 {
            let first = f64::floor((lower[xyz] - range - self.origin[xyz]) / self.cell_size);
            let last = f64::floor((upper[xyz] + range - self.origin[xyz]) / self.cell_size);
            if last < 0.0 || first >= shape[xyz] as f64 {
                return;
            }
            start[xyz] = f64::max(first, 0.0) as usize;
            stop[xyz] = usize::min(last as usize, shape[xyz] - 1);
        }

        let range2 = range * range;
        for x in start[0]..=stop[0] {
            for y in start[1]..=stop[1] {
                for z in start[2]..=stop[2] {
                    if self.cells[[x, y, z]].is_empty() {
                        continue;
                    }

                    let id = self.cell_id([x, y, z]);
                    let (cell_lower, cell_upper) = self.cell_bounds(id);
                    if box_distance2(lower, upper, cell_lower, cell_upper) <= range2 {
                        cells.push(id);
                    }
                }
            }
        }
    }

    fn cells_near_point(&self, position: Vector3D, range: f64, cells: &mut Vec<usize>) {
        let relative = (position - self.origin) / self.cell_size;
        let lower = self.cell_corner([
            f64::floor(relative[0]),
            f64::floor(relative[1]),
            f64::floor(relative[2]),
        ]);
        let size = self.cell_size;
        self.cells_near_box(lower, lower + Vector3D::new(size, size, size), range, cells);
    }
}
