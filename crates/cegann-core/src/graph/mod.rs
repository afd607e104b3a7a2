//! Crystal graphs.
//!
//! A structure becomes a graph whose nodes are *bonds*: each atom keeps its
//! `neighbors` nearest neighbor images and every (atom, neighbor) pair is a
//! bond carrying a Gaussian expansion of its length. Bonds that share a center
//! atom are linked by *angles*, carrying a Gaussian expansion of the cosine
//! between the two bond vectors. Angles are directed: an angle `(src, dst)`
//! carries a message from bond `src` into bond `dst`.
mod basis;
mod builders;
mod dataset;
mod neighbors;

pub use self::basis::GaussianBasis;
pub use self::builders::{HeterogeneousGraph, HomogeneousGraph};
pub use self::dataset::{BatchTensors, CrystalGraphDataset, GraphBatch};
pub use self::neighbors::{Neighbor, NeighborSearch};

use crate::{Result, Settings, Structure};
use strum::{Display, EnumString};

/// Feature widths a builder produces. The networks size their input layers from this.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureDims {
    pub bond: usize,
    pub angle: usize,
}

/// Turns a structure into a [`CrystalGraph`].
pub trait GraphBuilder {
    fn kind(&self) -> GraphKind;

    fn feature_dims(&self) -> FeatureDims;

    fn build(&self, structure: &Structure) -> Result<CrystalGraph>;
}

/// Which feature preprocessing to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum GraphKind {
    /// Features are uniform across species.
    #[default]
    Homogeneous,
    /// Bond and angle features also encode the species involved.
    Heterogeneous,
}

impl GraphKind {
    /// Only the exact flag `heterogeneous` selects the heterogeneous graph;
    /// any other value, or none, means homogeneous.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("heterogeneous") => GraphKind::Heterogeneous,
            _ => GraphKind::Homogeneous,
        }
    }

    pub fn builder(&self, settings: &Settings) -> Box<dyn GraphBuilder> {
        match self {
            GraphKind::Homogeneous => Box::new(HomogeneousGraph::new(settings)),
            GraphKind::Heterogeneous => Box::new(HeterogeneousGraph::new(settings)),
        }
    }
}

/// Host-side graph of one structure. Feature matrices are stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct CrystalGraph {
    pub num_atoms: usize,
    pub bond_fea_len: usize,
    /// `[num_bonds * bond_fea_len]`
    pub bond_features: Vec<f32>,
    /// Atom each bond starts from.
    pub bond_centers: Vec<u32>,
    /// Atom each bond points to (any periodic image).
    pub bond_neighbors: Vec<u32>,
    pub angle_fea_len: usize,
    /// `[num_angles * angle_fea_len]`
    pub angle_features: Vec<f32>,
    pub angle_cosines: Vec<f32>,
    /// Bond a message comes from.
    pub angle_src: Vec<u32>,
    /// Bond a message goes to.
    pub angle_dst: Vec<u32>,
    pub target: f32,
}

impl CrystalGraph {
    pub fn num_bonds(&self) -> usize {
        self.bond_centers.len()
    }

    pub fn num_angles(&self) -> usize {
        self.angle_src.len()
    }

    pub fn feature_dims(&self) -> FeatureDims {
        FeatureDims {
            bond: self.bond_fea_len,
            angle: self.angle_fea_len,
        }
    }
}
