//! # cegann-core
//!
//! Crystal structures and the graphs built from them.
//!
//! __cegann-core__ provides:
//! * POSCAR parsing into a periodic [`Structure`]
//! * discovery and natural ordering of structure files in a directory
//! * the [`Settings`] that parameterize graph construction and the networks
//! * periodic neighbor search and the [`GraphBuilder`] implementations that turn
//!   a structure into a bond/angle [`CrystalGraph`]
//! * a [`CrystalGraphDataset`] with batch collation onto a candle device
//!
mod error;
mod graph;
mod input;
mod settings;
mod structure;

pub use self::error::{CoreError, Result};
pub use self::graph::{
    BatchTensors, CrystalGraph, CrystalGraphDataset, FeatureDims, GaussianBasis, GraphBatch,
    GraphBuilder, GraphKind, HeterogeneousGraph, HomogeneousGraph, NeighborSearch,
};
pub use self::input::{discover_structures, load_records, natural_cmp, structure_label};
pub use self::settings::{Pooling, Settings};
pub use self::structure::{Lattice, Poscar, Site, Structure, StructureRecord};
