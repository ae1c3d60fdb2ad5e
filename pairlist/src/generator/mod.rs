use log::debug;

use crate::{Error, PairConnections, PairList, Selection, Vector3D};

mod grid;
pub use self::grid::{SpatialGrid, RegularGrid};
use self::grid::bounding_box;

mod method;
pub use self::method::SearchMethod;

mod search;
use self::search::{PairSearch, Side};

mod direct;
mod point_cell;
mod cell_cell;

use self::direct::direct_search;
use self::point_cell::point_cell_search;
use self::cell_cell::cell_cell_search;

/// Generate pair lists from particles positions.
///
/// Two particles `i` and `j` are paired if the distance between them is
/// smaller than or equal to `cutoff + radius_i + radius_j`. The search can
/// check every pair of particles, or use a grid to only look at particles in
/// nearby cells; this choice is made automatically from the number and
/// spread of the particles unless `method` is set.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct PairListGenerator {
    /// Spherical cutoff used to determine if two particles are paired
    pub cutoff: f64,
    /// Size of the grid cells. If this is zero or negative, the cell size is
    /// derived from the cutoff, using `cutoff_cell_size_factor` and
    /// `minimum_cell_size`
    pub cell_size: f64,
    /// Ratio between the cell size and the cutoff, used when `cell_size` is
    /// not set
    pub cutoff_cell_size_factor: f64,
    /// Minimal number of cells along the longest axis of the system to use a
    /// grid-based search
    pub minimum_cell_extent: usize,
    /// Minimal cell size when deriving it from the cutoff
    pub minimum_cell_size: f64,
    /// Minimal ratio between the longest side of the system bounding box and
    /// the cutoff to use a grid-based search
    pub minimum_extent_factor: f64,
    /// Minimal number of particles to use a grid-based search
    pub minimum_points: usize,
    /// Sort the records and their partners after generating the list
    pub sort_indices: bool,
    /// Use the cell-cell search instead of the point-cell search when using a
    /// grid
    pub use_grid_by_cell: bool,
    /// Force the use of a specific search method
    pub method: Option<SearchMethod>,
}

impl Default for PairListGenerator {
    fn default() -> PairListGenerator {
        PairListGenerator {
            cutoff: 13.5,
            cell_size: 0.0,
            cutoff_cell_size_factor: 0.5,
            minimum_cell_extent: 2,
            minimum_cell_size: 3.0,
            minimum_extent_factor: 1.5,
            minimum_points: 500,
            sort_indices: false,
            use_grid_by_cell: true,
            method: None,
        }
    }
}

/// Options for the generation of a pair list inside a single set of particles
#[derive(Default, Clone, Copy)]
pub struct SelfPairListOptions<'a> {
    /// Per-particle radii, added to the cutoff
    pub radii: Option<&'a [f64]>,
    /// Only particles in this selection take part in pairs
    pub and_selection: Option<&'a Selection>,
    /// Only keep pairs where at least one particle is in this selection
    pub or_selection: Option<&'a Selection>,
    /// Pairs to exclude from the output, this must come from a self pair list
    pub exclusions: Option<&'a PairConnections>,
    /// Pre-built grid containing the particles
    pub grid: Option<&'a dyn SpatialGrid>,
}

/// Options for the generation of a pair list between two sets of particles
#[derive(Default, Clone, Copy)]
pub struct CrossPairListOptions<'a> {
    /// Per-particle radii for the first set, added to the cutoff
    pub radii1: Option<&'a [f64]>,
    /// Per-particle radii for the second set, added to the cutoff
    pub radii2: Option<&'a [f64]>,
    /// Only particles of the first set in this selection take part in pairs
    pub and_selection1: Option<&'a Selection>,
    /// Only particles of the second set in this selection take part in pairs
    pub and_selection2: Option<&'a Selection>,
    /// Only keep pairs where the particle of the first set is in this
    /// selection, or the particle of the second set is in `or_selection2`
    pub or_selection1: Option<&'a Selection>,
    /// Only keep pairs where the particle of the second set is in this
    /// selection, or the particle of the first set is in `or_selection1`
    pub or_selection2: Option<&'a Selection>,
    /// Pairs to exclude from the output, this must come from a cross pair list
    pub exclusions: Option<&'a PairConnections>,
    /// Pre-built grid containing the particles of the second set
    pub grid: Option<&'a dyn SpatialGrid>,
}

impl PairListGenerator {
    /// Create a new generator with the given `cutoff` and default values for
    /// all other parameters
    pub fn new(cutoff: f64) -> Result<PairListGenerator, Error> {
        let generator = PairListGenerator {
            cutoff: cutoff,
            ..Default::default()
        };
        generator.validate()?;
        return Ok(generator);
    }

    /// Create a generator from JSON parameters, missing parameters take their
    /// default value
    pub fn from_json(parameters: &str) -> Result<PairListGenerator, Error> {
        let generator: PairListGenerator = serde_json::from_str(parameters)?;
        generator.validate()?;
        return Ok(generator);
    }

    /// Get the parameters of this generator as JSON
    pub fn parameters(&self) -> String {
        serde_json::to_string(self).expect("failed to serialize to JSON")
    }

    /// Check that all the parameters of this generator have valid values
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.cutoff > 0.0 && self.cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "expected a positive cutoff, got {}", self.cutoff
            )));
        }

        if !self.cell_size.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "expected a finite cell size, got {}", self.cell_size
            )));
        }

        if self.cell_size <= 0.0 {
            if !(self.cutoff_cell_size_factor > 0.0 && self.cutoff_cell_size_factor.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "expected a positive cutoff_cell_size_factor, got {}", self.cutoff_cell_size_factor
                )));
            }

            if !(self.minimum_cell_size >= 0.0 && self.minimum_cell_size.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "expected a positive minimum_cell_size, got {}", self.minimum_cell_size
                )));
            }
        }

        if !(self.minimum_extent_factor >= 0.0 && self.minimum_extent_factor.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "expected a positive minimum_extent_factor, got {}", self.minimum_extent_factor
            )));
        }

        return Ok(());
    }

    /// Generate the list of all pairs inside a single set of particles. The
    /// resulting list is lower-triangular: all partners of particle `i` are
    /// smaller than `i`.
    #[time_graph::instrument(name = "PairListGenerator::self_pair_list")]
    pub fn self_pair_list(&self, coordinates: &[Vector3D], options: SelfPairListOptions<'_>) -> Result<PairList, Error> {
        self.validate()?;

        if let Some(exclusions) = options.exclusions {
            if !exclusions.is_self() {
                return Err(Error::InvalidParameter(
                    "exclusions for a self pair list must come from a self pair list".into()
                ));
            }
        }

        let side = Side::new(coordinates, options.radii, options.and_selection, options.or_selection)?;
        let indices = side.indices();

        let method = self.search_method(
            options.grid.is_some(),
            bounding_box(coordinates, &indices),
            indices.len(),
        );
        debug!("searching pairs between {} particles with {} method", indices.len(), method);

        let mut search = PairSearch::new_self(self.cutoff, side, options.exclusions);
        let mut list = PairList::new_self();
        match method {
            SearchMethod::Direct => {
                direct_search(&mut search, &indices, &indices, &mut list)?;
            }
            SearchMethod::PointCell | SearchMethod::CellCell => {
                let built;
                let grid: &dyn SpatialGrid = match options.grid {
                    Some(grid) => grid,
                    None => {
                        built = self.build_grid(coordinates, &indices)?;
                        &built
                    }
                };

                if method == SearchMethod::PointCell {
                    point_cell_search(&mut search, &indices, grid, &mut list)?;
                } else {
                    cell_cell_search(&mut search, grid, grid, &mut list)?;
                }
            }
        }

        if self.sort_indices {
            list.sort();
        }

        return Ok(list);
    }

    /// Generate the list of all pairs between particles in `coordinates1` and
    /// particles in `coordinates2`.
    #[time_graph::instrument(name = "PairListGenerator::cross_pair_list")]
    pub fn cross_pair_list(
        &self,
        coordinates1: &[Vector3D],
        coordinates2: &[Vector3D],
        options: CrossPairListOptions<'_>,
    ) -> Result<PairList, Error> {
        self.validate()?;

        if let Some(exclusions) = options.exclusions {
            if exclusions.is_self() {
                return Err(Error::InvalidParameter(
                    "exclusions for a cross pair list must come from a cross pair list".into()
                ));
            }
        }

        let first = Side::new(coordinates1, options.radii1, options.and_selection1, options.or_selection1)?;
        let second = Side::new(coordinates2, options.radii2, options.and_selection2, options.or_selection2)?;
        let search = PairSearch::new_cross(self.cutoff, first, second, options.exclusions);

        return self.cross_search(search, options.grid);
    }

    /// Generate the list of all pairs between particles in `coordinates`
    /// translated by `-translation` and particles in `coordinates`. This is
    /// typically used to find pairs between a system and one of its periodic
    /// images.
    ///
    /// If `exclude_self` is true, pairs between a particle and its own image
    /// are not included. The exclusions can come either from a self or a
    /// cross pair list, and the grid (if any) must contain the untranslated
    /// particles.
    #[time_graph::instrument(name = "PairListGenerator::cross_pair_list_from_single_coordinates")]
    pub fn cross_pair_list_from_single_coordinates(
        &self,
        coordinates: &[Vector3D],
        translation: Vector3D,
        exclude_self: bool,
        options: SelfPairListOptions<'_>,
    ) -> Result<PairList, Error> {
        self.validate()?;

        let translated = coordinates.iter().map(|&position| position - translation).collect::<Vec<_>>();

        let first = Side::new(&translated, options.radii, options.and_selection, options.or_selection)?;
        let second = Side::new(coordinates, options.radii, options.and_selection, options.or_selection)?;
        let search = PairSearch::new_images(self.cutoff, first, second, exclude_self, options.exclusions);

        return self.cross_search(search, options.grid);
    }

    fn cross_search(&self, mut search: PairSearch<'_>, grid: Option<&dyn SpatialGrid>) -> Result<PairList, Error> {
        let coordinates1 = search.first().coordinates();
        let coordinates2 = search.second().coordinates();
        let indices1 = search.first().indices();
        let indices2 = search.second().indices();

        let bounds = match (bounding_box(coordinates1, &indices1), bounding_box(coordinates2, &indices2)) {
            (Some((lower1, upper1)), Some((lower2, upper2))) => {
                Some((lower1.min(&lower2), upper1.max(&upper2)))
            }
            _ => None,
        };

        let method = self.search_method(grid.is_some(), bounds, indices1.len() + indices2.len());
        debug!(
            "searching pairs between {} and {} particles with {} method",
            indices1.len(), indices2.len(), method
        );

        let mut list = PairList::new_cross();
        match method {
            SearchMethod::Direct => {
                direct_search(&mut search, &indices1, &indices2, &mut list)?;
            }
            SearchMethod::PointCell | SearchMethod::CellCell => {
                let built;
                let target: &dyn SpatialGrid = match grid {
                    Some(grid) => grid,
                    None => {
                        built = self.build_grid(coordinates2, &indices2)?;
                        &built
                    }
                };

                if method == SearchMethod::PointCell {
                    point_cell_search(&mut search, &indices1, target, &mut list)?;
                } else {
                    let source = self.build_grid(coordinates1, &indices1)?;
                    cell_cell_search(&mut search, &source, target, &mut list)?;
                }
            }
        }

        if self.sort_indices {
            list.sort();
        }

        return Ok(list);
    }

    fn build_grid(&self, coordinates: &[Vector3D], indices: &[usize]) -> Result<RegularGrid, Error> {
        let grid = RegularGrid::from_indices(coordinates, indices, self.effective_cell_size())?;
        debug!("using a grid with {:?} cells of size {}", grid.shape(), grid.cell_size());
        return Ok(grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METHODS: [SearchMethod; 3] = [SearchMethod::Direct, SearchMethod::PointCell, SearchMethod::CellCell];

    fn generator(cutoff: f64, method: SearchMethod) -> PairListGenerator {
        PairListGenerator {
            cutoff: cutoff,
            cell_size: 1.0,
            sort_indices: true,
            method: Some(method),
            ..Default::default()
        }
    }

    fn five_particles() -> Vec<Vector3D> {
        vec![
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(2.0, 0.0, 0.0),
            Vector3D::new(0.0, 5.0, 0.0),
            Vector3D::new(0.0, 0.0, 5.0),
        ]
    }

    /// 4x4x4 cubic lattice with a small deterministic perturbation
    fn lattice() -> Vec<Vector3D> {
        let mut positions = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    let n = positions.len() as f64;
                    positions.push(Vector3D::new(
                        1.1 * i as f64 + 0.2 * f64::sin(n),
                        1.1 * j as f64 + 0.2 * f64::sin(2.0 * n),
                        1.1 * k as f64 + 0.2 * f64::sin(3.0 * n),
                    ));
                }
            }
        }
        return positions;
    }

    fn brute_force(coordinates1: &[Vector3D], coordinates2: &[Vector3D], cutoff: f64, is_self: bool) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, ri) in coordinates1.iter().enumerate() {
            for (j, rj) in coordinates2.iter().enumerate() {
                if is_self && j >= i {
                    break;
                }
                if ri.distance2(rj) <= cutoff * cutoff {
                    pairs.push((i, j));
                }
            }
        }
        return pairs;
    }

    #[test]
    fn self_pairs() {
        let positions = five_particles();
        for method in ALL_METHODS {
            let list = generator(1.5, method).self_pair_list(&positions, Default::default()).unwrap();

            assert!(list.is_self());
            assert_eq!(list.len(), 2);
            assert_eq!(list.pairs(), [(1, 0), (2, 1)]);

            let components = list.connected_components(5).unwrap();
            assert_eq!(components.len(), 3);
            assert_eq!(components[0].indices(), [0, 1, 2]);
            assert_eq!(components[1].indices(), [3]);
            assert_eq!(components[2].indices(), [4]);
        }
    }

    #[test]
    fn exclusions() {
        let positions = five_particles();
        let excluded = PairList::self_from_pairs(&[(1, 0)]).unwrap();
        let exclusions = PairConnections::new(&excluded, 5).unwrap();

        for method in ALL_METHODS {
            let options = SelfPairListOptions {
                exclusions: Some(&exclusions),
                ..Default::default()
            };
            let list = generator(1.5, method).self_pair_list(&positions, options).unwrap();
            assert_eq!(list.pairs(), [(2, 1)]);
        }

        let cross = PairConnections::new(&PairList::cross_from_pairs(&[(1, 0)]).unwrap(), 5).unwrap();
        let options = SelfPairListOptions {
            exclusions: Some(&cross),
            ..Default::default()
        };
        let error = generator(1.5, SearchMethod::Direct).self_pair_list(&positions, options).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));
    }

    #[test]
    fn methods_agree() {
        let positions = lattice();
        let expected = brute_force(&positions, &positions, 1.6, true);
        assert!(!expected.is_empty());

        for method in ALL_METHODS {
            let list = generator(1.6, method).self_pair_list(&positions, Default::default()).unwrap();
            assert_eq!(list.pairs(), expected, "method {}", method);
        }

        let shifted = positions.iter().map(|&p| p + Vector3D::new(0.5, 2.0, -1.0)).collect::<Vec<_>>();
        let expected = brute_force(&positions, &shifted, 1.6, false);
        for method in ALL_METHODS {
            let list = generator(1.6, method).cross_pair_list(&positions, &shifted, Default::default()).unwrap();
            assert!(!list.is_self());
            assert_eq!(list.pairs(), expected, "method {}", method);
        }
    }

    #[test]
    fn radii() {
        let positions = five_particles();
        let radii = [0.0, 0.0, 0.0, 3.55, 0.0];
        for method in ALL_METHODS {
            let options = SelfPairListOptions {
                radii: Some(&radii),
                ..Default::default()
            };
            // 3 is at 5 A of 0, and 5.1 A of 1
            let list = generator(1.5, method).self_pair_list(&positions, options).unwrap();
            assert_eq!(list.pairs(), [(1, 0), (2, 1), (3, 0)]);
        }

        let options = SelfPairListOptions {
            radii: Some(&radii[..3]),
            ..Default::default()
        };
        let error = generator(1.5, SearchMethod::Direct).self_pair_list(&positions, options).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));
    }

    #[test]
    fn selections() {
        let positions = lattice();
        let and_selection = Selection::new((0..positions.len()).filter(|i| i % 3 != 0));
        let or_selection = Selection::new([5, 17, 42]);

        let all = generator(1.6, SearchMethod::Direct).self_pair_list(&positions, Default::default()).unwrap();
        let expected = all.pairs().into_iter()
            .filter(|&(i, j)| and_selection.contains(i) && and_selection.contains(j))
            .filter(|&(i, j)| or_selection.contains(i) || or_selection.contains(j))
            .collect::<Vec<_>>();
        assert!(!expected.is_empty());

        for method in ALL_METHODS {
            let options = SelfPairListOptions {
                and_selection: Some(&and_selection),
                or_selection: Some(&or_selection),
                ..Default::default()
            };
            let list = generator(1.6, method).self_pair_list(&positions, options).unwrap();
            assert_eq!(list.pairs(), expected, "method {}", method);
        }

        let options = SelfPairListOptions {
            and_selection: Some(&Selection::new([3, 100])),
            ..Default::default()
        };
        let error = generator(1.6, SearchMethod::Direct).self_pair_list(&positions, options).unwrap_err();
        assert!(matches!(error, Error::IndexOutOfRange { index: 100, size: 64 }));
    }

    #[test]
    fn cross_or_selections() {
        let positions = five_particles();
        let or_selection2 = Selection::new([0]);

        for method in ALL_METHODS {
            let options = CrossPairListOptions {
                or_selection2: Some(&or_selection2),
                ..Default::default()
            };
            let list = generator(1.5, method).cross_pair_list(&positions, &positions, options).unwrap();
            assert_eq!(list.pairs(), [(0, 0), (1, 0)]);
        }
    }

    #[test]
    fn single_coordinates() {
        let positions = five_particles();
        let translation = Vector3D::new(3.0, 0.0, 0.0);

        for method in ALL_METHODS {
            // the first set is at x = -3, -2, -1 and the second at x = 0, 1, 2
            let list = generator(1.5, method).cross_pair_list_from_single_coordinates(
                &positions, translation, false, Default::default()
            ).unwrap();
            assert_eq!(list.pairs(), [(2, 0)]);

            let list = generator(1.5, method).cross_pair_list_from_single_coordinates(
                &positions, Vector3D::zero(), true, Default::default()
            ).unwrap();
            assert_eq!(list.pairs(), [(0, 1), (1, 0), (1, 2), (2, 1)]);
        }

        // both kind of exclusions are accepted
        let excluded = PairList::self_from_pairs(&[(1, 0)]).unwrap();
        let exclusions = PairConnections::new(&excluded, 5).unwrap();
        let options = SelfPairListOptions {
            exclusions: Some(&exclusions),
            ..Default::default()
        };
        let list = generator(1.5, SearchMethod::Direct).cross_pair_list_from_single_coordinates(
            &positions, Vector3D::zero(), true, options
        ).unwrap();
        assert_eq!(list.pairs(), [(1, 2), (2, 1)]);
    }

    #[test]
    fn provided_grid() {
        let positions = lattice();
        let expected = brute_force(&positions, &positions, 1.6, true);

        let grid = RegularGrid::new(&positions, None, 2.0).unwrap();
        for use_grid_by_cell in [true, false] {
            let generator = PairListGenerator {
                cutoff: 1.6,
                sort_indices: true,
                use_grid_by_cell: use_grid_by_cell,
                ..Default::default()
            };
            let options = SelfPairListOptions {
                grid: Some(&grid),
                ..Default::default()
            };
            let list = generator.self_pair_list(&positions, options).unwrap();
            assert_eq!(list.pairs(), expected);
        }
    }

    #[test]
    fn empty() {
        for method in ALL_METHODS {
            let list = generator(1.5, method).self_pair_list(&[], Default::default()).unwrap();
            assert!(list.is_empty());

            let list = generator(1.5, method).cross_pair_list(&five_particles(), &[], Default::default()).unwrap();
            assert!(list.is_empty());
        }
    }

    #[test]
    fn parameters() {
        let generator = PairListGenerator::from_json(r#"{"cutoff": 3.5, "method": "PointCell"}"#).unwrap();
        assert_eq!(generator.cutoff, 3.5);
        assert_eq!(generator.method, Some(SearchMethod::PointCell));
        assert_eq!(generator.minimum_points, 500);

        let roundtrip = PairListGenerator::from_json(&generator.parameters()).unwrap();
        assert_eq!(roundtrip, generator);

        let error = PairListGenerator::from_json(r#"{"cutoff": -3.5}"#).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: expected a positive cutoff, got -3.5");

        let error = PairListGenerator::from_json(r#"{"cutof": 3.5}"#).unwrap_err();
        assert!(matches!(error, Error::Json(_)));

        assert!(PairListGenerator::new(0.0).is_err());
        assert_eq!(PairListGenerator::new(2.0).unwrap().cutoff, 2.0);
    }
}
