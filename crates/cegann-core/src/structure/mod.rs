//! Periodic crystal structures.
mod lattice;
mod poscar;

pub use self::lattice::Lattice;
pub(crate) use self::lattice::{cross, dot, norm};
pub use self::poscar::Poscar;

#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    pub species: String,
    pub frac_coords: [f64; 3],
    pub coords: [f64; 3],
}

/// A lattice and the sites it holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    lattice: Lattice,
    sites: Vec<Site>,
}

impl Structure {
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Self {
        Self { lattice, sites }
    }

    /// Build sites from species and fractional coordinates.
    pub fn from_fractional(
        lattice: Lattice,
        species: impl IntoIterator<Item = String>,
        frac_coords: impl IntoIterator<Item = [f64; 3]>,
    ) -> Self {
        let sites = species
            .into_iter()
            .zip(frac_coords)
            .map(|(species, frac_coords)| Site {
                coords: lattice.to_cartesian(&frac_coords),
                species,
                frac_coords,
            })
            .collect();
        Self { lattice, sites }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Chemical formula in order of first appearance, e.g. `Cu1Zr1`.
    pub fn formula(&self) -> String {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for site in &self.sites {
            match counts.iter_mut().find(|(s, _)| *s == site.species) {
                Some((_, n)) => *n += 1,
                None => counts.push((&site.species, 1)),
            }
        }
        counts
            .into_iter()
            .map(|(s, n)| format!("{}{}", s, n))
            .collect()
    }
}

/// One input structure as it enters the dataset.
#[derive(Clone, Debug)]
pub struct StructureRecord {
    pub label: String,
    pub structure: Structure,
    /// Placeholder target; the true class of prediction inputs is unknown.
    pub target: f32,
}

impl StructureRecord {
    pub const DUMMY_TARGET: f32 = 1.0;

    pub fn new(label: impl Into<String>, structure: Structure) -> Self {
        Self {
            label: label.into(),
            structure,
            target: Self::DUMMY_TARGET,
        }
    }
}
