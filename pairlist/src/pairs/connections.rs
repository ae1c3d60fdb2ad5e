use crate::{Error, Selection, SelectionContainer};

use super::PairList;

/// Adjacency of the particles in a [`PairList`], stored in compressed sparse
/// row format.
///
/// The neighbors of particle `i` are stored in
/// `neighbors[offsets[i]..offsets[i + 1]]`, in increasing order. For self pair
/// lists, each pair `i-j` is stored in both the rows of `i` and `j`; for cross
/// pair lists only the row of the first particle contains the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairConnections {
    /// start of each row in `neighbors`, with one additional entry at the end
    offsets: Vec<usize>,
    /// concatenation of all rows
    neighbors: Vec<usize>,
    /// whether this was built from a self pair list
    is_self: bool,
}

impl PairConnections {
    /// Build the connections corresponding to `list`, with at least
    /// `upper_bound` rows. The actual number of rows is the largest of
    /// `upper_bound` and the number of rows required to store all records
    /// and pairs of the list, including records without partners.
    #[time_graph::instrument(name = "PairConnections::new")]
    pub fn new(list: &PairList, upper_bound: usize) -> Result<PairConnections, Error> {
        let is_self = list.is_self();
        let records_bound = list.records().iter()
            .map(|record| record.index() + 1)
            .max()
            .unwrap_or(0);
        let required = if is_self {
            usize::max(records_bound, list.upper_bound())
        } else {
            records_bound
        };
        let n_rows = usize::max(upper_bound, required);

        // first pass: count the number of neighbors of each row
        let mut offsets = Vec::new();
        offsets.try_reserve_exact(n_rows + 1)?;
        offsets.resize(n_rows + 1, 0);
        list.for_each_record(|i, partners| {
            offsets[i + 1] += partners.len();
            if is_self {
                for &j in partners {
                    offsets[j + 1] += 1;
                }
            }
        });

        for row in 0..n_rows {
            offsets[row + 1] += offsets[row];
        }

        // second pass: scatter the pairs in their rows
        let n_neighbors = offsets[n_rows];
        let mut neighbors = Vec::new();
        neighbors.try_reserve_exact(n_neighbors)?;
        neighbors.resize(n_neighbors, 0);

        let mut cursors = offsets[..n_rows].to_vec();
        list.for_each_record(|i, partners| {
            for &j in partners {
                neighbors[cursors[i]] = j;
                cursors[i] += 1;
                if is_self {
                    neighbors[cursors[j]] = i;
                    cursors[j] += 1;
                }
            }
        });

        for row in 0..n_rows {
            neighbors[offsets[row]..offsets[row + 1]].sort_unstable();
        }

        return Ok(PairConnections {
            offsets: offsets,
            neighbors: neighbors,
            is_self: is_self,
        });
    }

    /// Get the number of rows in these connections
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Check if there are no rows in these connections
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Were these connections built from a self pair list?
    pub fn is_self(&self) -> bool {
        self.is_self
    }

    /// Get the total number of entries stored in all rows
    pub fn number_of_connections(&self) -> usize {
        self.neighbors.len()
    }

    /// Get the neighbors of particle `i`, in increasing order. Particles
    /// outside of the rows of these connections have no neighbors.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        if i < self.len() {
            &self.neighbors[self.offsets[i]..self.offsets[i + 1]]
        } else {
            &[]
        }
    }

    /// Get the number of neighbors of particle `i`
    pub fn degree(&self, i: usize) -> usize {
        self.neighbors(i).len()
    }

    /// Find the connected components of the graph defined by these
    /// connections. Every row gives a vertex, isolated vertices are returned
    /// as single element components. Components are ordered by their smallest
    /// vertex.
    pub fn connected_components(&self) -> Result<SelectionContainer, Error> {
        if !self.is_self {
            return Err(Error::InvalidParameter(
                "connected components can only be computed for the connections of a self pair list".into()
            ));
        }

        let n_vertices = self.len();
        let mut is_assigned = vec![false; n_vertices];
        // all vertices, grouped by component in the order they were reached
        let mut visited = Vec::with_capacity(n_vertices);
        let mut components = Vec::new();

        for seed in 0..n_vertices {
            if is_assigned[seed] {
                continue;
            }

            is_assigned[seed] = true;
            let start = visited.len();
            visited.push(seed);

            let mut current = start;
            while current < visited.len() {
                let vertex = visited[current];
                current += 1;
                for &neighbor in self.neighbors(vertex) {
                    if !is_assigned[neighbor] {
                        is_assigned[neighbor] = true;
                        visited.push(neighbor);
                    }
                }
            }

            components.push(Selection::new(visited[start..].iter().copied()));
        }

        return Ok(SelectionContainer::new(components));
    }
}
