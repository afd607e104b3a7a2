//! Periodic neighbor search.
use crate::structure::{dot, Structure};
use crate::{CoreError, Result, Settings};
use itertools::iproduct;

const SAME_SITE_TOLERANCE: f64 = 1e-8;
const MAX_EXPANSIONS: usize = 64;

/// One neighbor of a center atom, possibly in a neighboring cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub image: [i32; 3],
    pub distance: f64,
    /// Cartesian vector from the center to this neighbor.
    pub vector: [f64; 3],
}

/// Finds exactly `neighbors` nearest neighbors per atom.
///
/// The search starts at radius `rcut` and grows by `delta` until every atom
/// has at least `neighbors` candidates. Ties in distance are broken by site
/// index and then image, so the result is deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborSearch {
    pub neighbors: usize,
    pub rcut: f64,
    pub delta: f64,
}

impl NeighborSearch {
    pub fn new(neighbors: usize, rcut: f64, delta: f64) -> Self {
        Self {
            neighbors,
            rcut,
            delta,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.neighbors, settings.rcut, settings.search_delta)
    }

    /// Neighbor lists for every site and the radius that produced them.
    pub fn search(&self, structure: &Structure) -> Result<(Vec<Vec<Neighbor>>, f64)> {
        if structure.num_sites() == 0 {
            return Err(CoreError::Graph("structure has no sites".into()));
        }
        let mut radius = self.rcut;
        for _ in 0..MAX_EXPANSIONS {
            let mut lists = candidates_within(structure, radius);
            let fewest = lists.iter().map(Vec::len).min().unwrap_or(0);
            if fewest >= self.neighbors {
                for list in lists.iter_mut() {
                    list.truncate(self.neighbors);
                }
                return Ok((lists, radius));
            }
            tracing::debug!(
                "{} neighbors within {:.3} A for some site, need {}; widening search",
                fewest,
                radius,
                self.neighbors
            );
            radius += self.delta;
        }
        Err(CoreError::Graph(format!(
            "could not find {} neighbors per site within {:.3} A",
            self.neighbors, radius
        )))
    }
}

fn wrap(frac: &[f64; 3]) -> [f64; 3] {
    frac.map(|x| x - x.floor())
}

/// Every site image within `radius` of every site, sorted nearest first.
fn candidates_within(structure: &Structure, radius: f64) -> Vec<Vec<Neighbor>> {
    let lattice = structure.lattice();
    let matrix = lattice.matrix();
    let spacings = lattice.plane_spacings();
    let reach = spacings.map(|s| (radius / s).ceil() as i32 + 1);

    let positions: Vec<[f64; 3]> = structure
        .sites()
        .iter()
        .map(|site| lattice.to_cartesian(&wrap(&site.frac_coords)))
        .collect();

    positions
        .iter()
        .map(|center| {
            let mut found = Vec::new();
            for (index, position) in positions.iter().enumerate() {
                for (i, j, k) in iproduct!(
                    -reach[0]..=reach[0],
                    -reach[1]..=reach[1],
                    -reach[2]..=reach[2]
                ) {
                    let shift = [i as f64, j as f64, k as f64];
                    let mut vector = [0.0; 3];
                    for (axis, v) in vector.iter_mut().enumerate() {
                        *v = position[axis] - center[axis]
                            + shift[0] * matrix[0][axis]
                            + shift[1] * matrix[1][axis]
                            + shift[2] * matrix[2][axis];
                    }
                    let distance = dot(&vector, &vector).sqrt();
                    if distance < SAME_SITE_TOLERANCE || distance > radius {
                        continue;
                    }
                    found.push(Neighbor {
                        index,
                        image: [i, j, k],
                        distance,
                        vector,
                    });
                }
            }
            found.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then_with(|| a.index.cmp(&b.index))
                    .then_with(|| a.image.cmp(&b.image))
            });
            found
        })
        .collect()
}
