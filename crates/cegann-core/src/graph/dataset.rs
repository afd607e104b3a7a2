use super::{CrystalGraph, FeatureDims, GraphBuilder};
use crate::{CoreError, Result, StructureRecord};
use candle_core::{Device, Tensor};

/// Graphs for a list of structure records, built eagerly.
#[derive(Clone, Debug)]
pub struct CrystalGraphDataset {
    labels: Vec<String>,
    graphs: Vec<CrystalGraph>,
    dims: FeatureDims,
}

impl CrystalGraphDataset {
    pub fn new(records: &[StructureRecord], builder: &dyn GraphBuilder) -> Result<Self> {
        let mut labels = Vec::with_capacity(records.len());
        let mut graphs = Vec::with_capacity(records.len());
        for record in records {
            let mut graph = builder.build(&record.structure).map_err(|e| match e {
                CoreError::Graph(msg) => CoreError::Graph(format!("{}: {}", record.label, msg)),
                other => other,
            })?;
            graph.target = record.target;
            labels.push(record.label.clone());
            graphs.push(graph);
        }
        tracing::info!("built {} {} graphs", graphs.len(), builder.kind());
        Ok(Self {
            labels,
            graphs,
            dims: builder.feature_dims(),
        })
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CrystalGraph> {
        self.graphs.get(index)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn feature_dims(&self) -> FeatureDims {
        self.dims
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CrystalGraph)> {
        self.labels.iter().map(String::as_str).zip(self.graphs.iter())
    }

    /// Concatenate graphs into one disconnected batch graph.
    pub fn collate(graphs: &[&CrystalGraph]) -> Result<GraphBatch> {
        let first = graphs
            .first()
            .ok_or_else(|| CoreError::Graph("cannot collate an empty batch".into()))?;
        let dims = first.feature_dims();
        if let Some(odd) = graphs.iter().find(|g| g.feature_dims() != dims) {
            return Err(CoreError::Graph(format!(
                "feature widths differ within a batch: {:?} vs {:?}",
                dims,
                odd.feature_dims()
            )));
        }

        let mut batch = GraphBatch {
            num_crystals: graphs.len(),
            dims,
            ..GraphBatch::default()
        };
        for (crystal, graph) in graphs.iter().enumerate() {
            let atom_offset = batch.num_atoms as u32;
            let bond_offset = batch.bond_centers.len() as u32;
            batch.bond_features.extend_from_slice(&graph.bond_features);
            batch
                .bond_centers
                .extend(graph.bond_centers.iter().map(|i| i + atom_offset));
            batch.angle_features.extend_from_slice(&graph.angle_features);
            batch.angle_cosines.extend_from_slice(&graph.angle_cosines);
            batch
                .angle_src
                .extend(graph.angle_src.iter().map(|b| b + bond_offset));
            batch
                .angle_dst
                .extend(graph.angle_dst.iter().map(|b| b + bond_offset));
            batch
                .atom_crystal
                .extend(std::iter::repeat(crystal as u32).take(graph.num_atoms));
            batch.targets.push(graph.target);
            batch.num_atoms += graph.num_atoms;
        }
        Ok(batch)
    }
}

/// Several graphs concatenated, with indices shifted into one numbering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphBatch {
    pub num_crystals: usize,
    pub num_atoms: usize,
    pub dims: FeatureDims,
    pub bond_features: Vec<f32>,
    pub bond_centers: Vec<u32>,
    pub angle_features: Vec<f32>,
    pub angle_cosines: Vec<f32>,
    pub angle_src: Vec<u32>,
    pub angle_dst: Vec<u32>,
    /// Crystal each atom belongs to.
    pub atom_crystal: Vec<u32>,
    pub targets: Vec<f32>,
}

/// A [`GraphBatch`] on a device, ready for a forward pass.
#[derive(Clone, Debug)]
pub struct BatchTensors {
    /// `[num_bonds, bond_fea_len]`
    pub bond_features: Tensor,
    /// `[num_angles, angle_fea_len]`
    pub angle_features: Tensor,
    /// `[num_angles]`
    pub angle_cosines: Tensor,
    /// `[num_angles]`, u32 bond indices
    pub angle_src: Tensor,
    /// `[num_angles]`, u32 bond indices
    pub angle_dst: Tensor,
    /// `[num_bonds]`, u32 atom indices
    pub bond_centers: Tensor,
    /// `[num_atoms]`, u32 crystal indices
    pub atom_crystal: Tensor,
    pub num_atoms: usize,
    pub num_bonds: usize,
    pub num_crystals: usize,
}

impl GraphBatch {
    pub fn num_bonds(&self) -> usize {
        self.bond_centers.len()
    }

    pub fn num_angles(&self) -> usize {
        self.angle_src.len()
    }

    /// Network inputs and targets on `device`.
    pub fn to_device(&self, device: &Device) -> candle_core::Result<(BatchTensors, Tensor)> {
        let num_bonds = self.num_bonds();
        let num_angles = self.num_angles();
        let inputs = BatchTensors {
            bond_features: Tensor::from_slice(
                &self.bond_features,
                (num_bonds, self.dims.bond),
                device,
            )?,
            angle_features: Tensor::from_slice(
                &self.angle_features,
                (num_angles, self.dims.angle),
                device,
            )?,
            angle_cosines: Tensor::from_slice(&self.angle_cosines, num_angles, device)?,
            angle_src: Tensor::from_slice(&self.angle_src, num_angles, device)?,
            angle_dst: Tensor::from_slice(&self.angle_dst, num_angles, device)?,
            bond_centers: Tensor::from_slice(&self.bond_centers, num_bonds, device)?,
            atom_crystal: Tensor::from_slice(&self.atom_crystal, self.num_atoms, device)?,
            num_atoms: self.num_atoms,
            num_bonds,
            num_crystals: self.num_crystals,
        };
        let targets = Tensor::from_slice(&self.targets, self.num_crystals, device)?;
        Ok((inputs, targets))
    }
}
