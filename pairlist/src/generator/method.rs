use crate::Vector3D;

use super::PairListGenerator;

/// Strategy used to search for pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub enum SearchMethod {
    /// Check all pairs of particles, this is the fastest method for small
    /// systems
    Direct,
    /// Sort particles in a grid, and then look for the partners of each
    /// particle in the cells around it
    PointCell,
    /// Sort particles in a grid, and then look for pairs in cells around each
    /// occupied cell
    CellCell,
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMethod::Direct => write!(f, "direct"),
            SearchMethod::PointCell => write!(f, "point-cell"),
            SearchMethod::CellCell => write!(f, "cell-cell"),
        }
    }
}

impl PairListGenerator {
    /// Get the size of the cells used when building a grid
    pub fn effective_cell_size(&self) -> f64 {
        if self.cell_size > 0.0 {
            return self.cell_size;
        }
        return f64::max(self.cutoff * self.cutoff_cell_size_factor, self.minimum_cell_size);
    }

    /// Get the grid-based method selected by `use_grid_by_cell`
    pub(super) fn grid_method(&self) -> SearchMethod {
        if self.use_grid_by_cell {
            SearchMethod::CellCell
        } else {
            SearchMethod::PointCell
        }
    }

    /// Pick the best search method for `n_points` particles inside the
    /// bounding box going from `lower` to `upper`. This ignores the `method`
    /// override.
    pub fn determine_method(&self, lower: Vector3D, upper: Vector3D, n_points: usize) -> SearchMethod {
        if n_points < self.minimum_points {
            return SearchMethod::Direct;
        }

        let extent = upper - lower;
        let max_extent = f64::max(extent[0], f64::max(extent[1], extent[2]));
        if max_extent < self.minimum_extent_factor * self.cutoff {
            return SearchMethod::Direct;
        }

        let max_cells = f64::floor(max_extent / self.effective_cell_size()) + 1.0;
        if max_cells < self.minimum_cell_extent as f64 {
            return SearchMethod::Direct;
        }

        return self.grid_method();
    }

    /// Get the method to use, taking into account the `method` override and
    /// whether the caller provided a grid
    pub(super) fn search_method(
        &self,
        grid_provided: bool,
        bounds: Option<(Vector3D, Vector3D)>,
        n_points: usize,
    ) -> SearchMethod {
        if let Some(method) = self.method {
            return method;
        }

        if grid_provided {
            return self.grid_method();
        }

        match bounds {
            Some((lower, upper)) => self.determine_method(lower, upper, n_points),
            None => SearchMethod::Direct,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;

    use super::*;

    fn cube(size: f64) -> (Vector3D, Vector3D) {
        (Vector3D::zero(), Vector3D::new(size, size, size))
    }

    #[test]
    fn cell_size() {
        let mut generator = PairListGenerator::default();
        generator.cutoff = 2.0;
        assert_ulps_eq!(generator.effective_cell_size(), 3.0);

        generator.cutoff = 10.0;
        assert_ulps_eq!(generator.effective_cell_size(), 5.0);

        generator.cell_size = 1.5;
        assert_ulps_eq!(generator.effective_cell_size(), 1.5);
    }

    #[test]
    fn heuristic() {
        let mut generator = PairListGenerator::default();
        generator.cutoff = 5.0;

        let (lower, upper) = cube(100.0);
        assert_eq!(generator.determine_method(lower, upper, 100), SearchMethod::Direct);
        assert_eq!(generator.determine_method(lower, upper, 1000), SearchMethod::CellCell);

        // too small compared to the cutoff
        let (lower, upper) = cube(7.0);
        assert_eq!(generator.determine_method(lower, upper, 1000), SearchMethod::Direct);

        // only a single cell along each axis
        generator.cell_size = 10.0;
        let (lower, upper) = cube(9.0);
        assert_eq!(generator.determine_method(lower, upper, 1000), SearchMethod::Direct);

        generator.cell_size = 0.0;
        generator.use_grid_by_cell = false;
        let (lower, upper) = cube(100.0);
        assert_eq!(generator.determine_method(lower, upper, 1000), SearchMethod::PointCell);
    }

    #[test]
    fn overrides() {
        let mut generator = PairListGenerator::default();
        let (lower, upper) = cube(100.0);

        assert_eq!(generator.search_method(false, Some((lower, upper)), 10), SearchMethod::Direct);
        assert_eq!(generator.search_method(true, Some((lower, upper)), 10), SearchMethod::CellCell);
        assert_eq!(generator.search_method(false, None, 10_000), SearchMethod::Direct);

        generator.method = Some(SearchMethod::PointCell);
        assert_eq!(generator.search_method(false, Some((lower, upper)), 10), SearchMethod::PointCell);
        assert_eq!(generator.search_method(true, None, 10), SearchMethod::PointCell);
    }
}
