use log::warn;

use crate::{Error, PairConnections, PairList, PairRecord, Selection, Vector3D};

/// Pairs closer than this squared distance are reported in the logs
const CLOSE_PAIR_DISTANCE2: f64 = 1e-6;

/// One of the two sets of particles taking part in a pair search
#[derive(Debug, Clone)]
pub(super) struct Side<'a> {
    coordinates: &'a [Vector3D],
    radii: Option<&'a [f64]>,
    or_selection: Option<&'a Selection>,
    /// which particles are included in the search, this is temporarily
    /// modified to hide excluded pairs
    included: Vec<bool>,
    max_radius: f64,
}

impl<'a> Side<'a> {
    pub fn new(
        coordinates: &'a [Vector3D],
        radii: Option<&'a [f64]>,
        and_selection: Option<&Selection>,
        or_selection: Option<&'a Selection>,
    ) -> Result<Side<'a>, Error> {
        let size = coordinates.len();

        for (i, position) in coordinates.iter().enumerate() {
            if !(position[0].is_finite() && position[1].is_finite() && position[2].is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "position of particle {} is not finite: {:?}", i, position
                )));
            }
        }

        let mut max_radius = 0.0;
        if let Some(radii) = radii {
            if radii.len() != size {
                return Err(Error::InvalidParameter(format!(
                    "expected {} radii, one per particle, got {}", size, radii.len()
                )));
            }

            for &radius in radii {
                if !(radius >= 0.0 && radius.is_finite()) {
                    return Err(Error::InvalidParameter(format!(
                        "particle radius must be a positive number, got {}", radius
                    )));
                }
                max_radius = f64::max(max_radius, radius);
            }
        }

        for selection in [and_selection, or_selection].into_iter().flatten() {
            if selection.upper_bound() > size {
                return Err(Error::IndexOutOfRange {
                    index: selection.upper_bound() - 1,
                    size: size,
                });
            }
        }

        let included = match and_selection {
            Some(selection) => (0..size).map(|i| selection.contains(i)).collect(),
            None => vec![true; size],
        };

        return Ok(Side {
            coordinates: coordinates,
            radii: radii,
            or_selection: or_selection,
            included: included,
            max_radius: max_radius,
        });
    }

    /// Get the indices of the particles included in the search, in
    /// increasing order
    pub fn indices(&self) -> Vec<usize> {
        self.included.iter()
            .enumerate()
            .filter_map(|(i, &included)| if included { Some(i) } else { None })
            .collect()
    }

    pub fn coordinates(&self) -> &'a [Vector3D] {
        self.coordinates
    }

    #[inline]
    fn radius(&self, i: usize) -> f64 {
        self.radii.map_or(0.0, |radii| radii[i])
    }

    #[inline]
    fn in_or_selection(&self, i: usize) -> bool {
        self.or_selection.map_or(false, |selection| selection.contains(i))
    }
}

/// State shared by all the search strategies. Strategies call `begin` for a
/// particle `i` of the first side, `test` for every candidate `j` of the
/// second side, and then `finish` to store the record for `i`.
pub(super) struct PairSearch<'a> {
    cutoff: f64,
    is_self: bool,
    /// both sides contain the same particles, the first one being an image
    /// of the second one
    images: bool,
    exclude_self: bool,
    /// is there an OR selection on any of the sides
    use_or: bool,
    first: Side<'a>,
    second: Side<'a>,
    exclusions: Option<&'a PairConnections>,

    current_in_or: bool,
    partners: Vec<usize>,
    masked: Vec<usize>,
}

impl<'a> PairSearch<'a> {
    /// Search pairs inside a single set of particles
    pub fn new_self(cutoff: f64, side: Side<'a>, exclusions: Option<&'a PairConnections>) -> PairSearch<'a> {
        let use_or = side.or_selection.is_some();
        return PairSearch {
            cutoff: cutoff,
            is_self: true,
            images: false,
            exclude_self: false,
            use_or: use_or,
            first: side.clone(),
            second: side,
            exclusions: exclusions,
            current_in_or: false,
            partners: Vec::new(),
            masked: Vec::new(),
        };
    }

    /// Search pairs between two sets of particles
    pub fn new_cross(
        cutoff: f64,
        first: Side<'a>,
        second: Side<'a>,
        exclusions: Option<&'a PairConnections>,
    ) -> PairSearch<'a> {
        let use_or = first.or_selection.is_some() || second.or_selection.is_some();
        return PairSearch {
            cutoff: cutoff,
            is_self: false,
            images: false,
            exclude_self: false,
            use_or: use_or,
            first: first,
            second: second,
            exclusions: exclusions,
            current_in_or: false,
            partners: Vec::new(),
            masked: Vec::new(),
        };
    }

    /// Search pairs between a set of particles (`second`) and an image of the
    /// same set (`first`). If `exclude_self` is true, particles are not
    /// paired with their own image.
    pub fn new_images(
        cutoff: f64,
        first: Side<'a>,
        second: Side<'a>,
        exclude_self: bool,
        exclusions: Option<&'a PairConnections>,
    ) -> PairSearch<'a> {
        let use_or = first.or_selection.is_some();
        return PairSearch {
            cutoff: cutoff,
            is_self: false,
            images: true,
            exclude_self: exclude_self,
            use_or: use_or,
            first: first,
            second: second,
            exclusions: exclusions,
            current_in_or: false,
            partners: Vec::new(),
            masked: Vec::new(),
        };
    }

    pub fn is_self(&self) -> bool {
        self.is_self
    }

    pub fn first(&self) -> &Side<'a> {
        &self.first
    }

    pub fn second(&self) -> &Side<'a> {
        &self.second
    }

    /// Largest distance at which any particle of the second side can be
    /// paired with `i`
    pub fn range_around(&self, i: usize) -> f64 {
        self.cutoff + self.first.radius(i) + self.second.max_radius
    }

    /// Largest distance at which any two particles can be paired
    pub fn range(&self) -> f64 {
        self.cutoff + self.first.max_radius + self.second.max_radius
    }

    /// Start the search for partners of `i`, returning `false` if `i` should
    /// be skipped entirely.
    pub fn begin(&mut self, i: usize) -> bool {
        if !self.first.included.get(i).copied().unwrap_or(false) {
            return false;
        }

        self.current_in_or = !self.use_or || self.first.in_or_selection(i);
        self.partners.clear();

        if let Some(exclusions) = self.exclusions {
            for &j in exclusions.neighbors(i) {
                if let Some(included) = self.second.included.get_mut(j) {
                    if *included {
                        *included = false;
                        self.masked.push(j);
                    }
                }
            }
        }

        return true;
    }

    /// Check if `j` is a partner of the current particle `i`
    #[inline]
    pub fn test(&mut self, i: usize, j: usize) {
        if !self.second.included.get(j).copied().unwrap_or(false) {
            return;
        }

        if self.is_self {
            if j >= i {
                return;
            }
        } else if self.exclude_self && i == j {
            return;
        }

        if !self.current_in_or && !self.second.in_or_selection(j) {
            return;
        }

        let range = self.cutoff + self.first.radius(i) + self.second.radius(j);
        let distance2 = self.first.coordinates[i].distance2(&self.second.coordinates[j]);
        if distance2 <= range * range {
            if self.is_close_pair(i, j, distance2) {
                warn!(
                    "particles {} and {} are very close to one another ({} A)",
                    i, j, distance2.sqrt()
                );
            }
            self.partners.push(j);
        }
    }

    /// Should the pair `i-j` at the given squared distance be reported as
    /// suspiciously close? A particle paired with its own image is not.
    fn is_close_pair(&self, i: usize, j: usize, distance2: f64) -> bool {
        if self.images && i == j {
            return false;
        }
        return distance2 < CLOSE_PAIR_DISTANCE2;
    }

    /// Finish the search for partners of `i`, adding them to the `list`
    pub fn finish(&mut self, i: usize, list: &mut PairList) -> Result<(), Error> {
        for &j in &self.masked {
            self.second.included[j] = true;
        }
        self.masked.clear();

        if self.partners.is_empty() {
            return Ok(());
        }

        return list.append(PairRecord::explicit(i, self.partners.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<Vector3D> {
        vec![Vector3D::zero(), Vector3D::new(1.0, 0.0, 0.0)]
    }

    #[test]
    fn close_pairs() {
        let positions = positions();
        let side = || Side::new(&positions, None, None, None).unwrap();

        // a particle and its own image are expected to be at the same place
        let images = PairSearch::new_images(1.0, side(), side(), false, None);
        assert!(!images.is_close_pair(0, 0, 0.0));
        assert!(images.is_close_pair(0, 1, 0.0));
        assert!(!images.is_close_pair(0, 1, 1.0));

        // in cross pair lists, indices refer to different particles
        let cross = PairSearch::new_cross(1.0, side(), side(), None);
        assert!(cross.is_close_pair(0, 0, 0.0));

        let search = PairSearch::new_self(1.0, side(), None);
        assert!(search.is_close_pair(1, 0, 1e-8));
    }

    #[test]
    fn non_finite_positions() {
        let positions = vec![Vector3D::zero(), Vector3D::new(0.0, f64::NAN, 0.0)];
        let error = Side::new(&positions, None, None, None).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: position of particle 1 is not finite: Vector3D([0.0, NaN, 0.0])");
    }
}
