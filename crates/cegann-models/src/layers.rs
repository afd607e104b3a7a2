//! Building blocks shared by the crystal networks.
//!
//! Everything here works on flat, batch-concatenated graphs: bond rows are
//! indexed by the `u32` index tensors of a [`BatchTensors`], and reductions
//! onto atoms or crystals are scatter sums written with `index_add`.
use cegann_core::{BatchTensors, Pooling};
use candle_core::{DType, Module, Result, Tensor};
use candle_nn::{batch_norm, linear, ops::sigmoid, BatchNorm, Linear, VarBuilder};

const BN_EPS: f64 = 1e-5;

/// `log(1 + exp(x))`, written to stay finite for large `|x|`.
pub fn softplus(x: &Tensor) -> Result<Tensor> {
    let tail = (x.abs()?.neg()?.exp()? + 1.0)?.log()?;
    x.relu()?.add(&tail)
}

/// Sum rows of `src` into `size` buckets given by `index`.
pub fn scatter_sum(src: &Tensor, index: &Tensor, size: usize) -> Result<Tensor> {
    let (_, width) = src.dims2()?;
    let zeros = Tensor::zeros((size, width), src.dtype(), src.device())?;
    zeros.index_add(index, src, 0)
}

/// Mean of the rows of `src` in each bucket. Empty buckets stay zero.
pub fn scatter_mean(src: &Tensor, index: &Tensor, size: usize) -> Result<Tensor> {
    let sums = scatter_sum(src, index, size)?;
    let ones = Tensor::ones((src.dim(0)?, 1), src.dtype(), src.device())?;
    let counts = scatter_sum(&ones, index, size)?.maximum(1.0)?;
    sums.broadcast_div(&counts)
}

/// Bond states to one vector per crystal: bonds are averaged onto their
/// center atom, then atoms are pooled per crystal.
pub fn readout(bonds: &Tensor, batch: &BatchTensors, pooling: Pooling) -> Result<Tensor> {
    let atoms = scatter_mean(bonds, &batch.bond_centers, batch.num_atoms)?;
    match pooling {
        Pooling::Mean => scatter_mean(&atoms, &batch.atom_crystal, batch.num_crystals),
        Pooling::Sum => scatter_sum(&atoms, &batch.atom_crystal, batch.num_crystals),
    }
}

/// Rows of bond states at the source and destination of every angle.
pub fn angle_endpoints(bonds: &Tensor, batch: &BatchTensors) -> Result<(Tensor, Tensor)> {
    let src = bonds.index_select(&batch.angle_src, 0)?;
    let dst = bonds.index_select(&batch.angle_dst, 0)?;
    Ok((src, dst))
}

/// Linear map to a filter half and a core half, combined as
/// `sigmoid(filter) * softplus(core)`.
#[derive(Debug)]
pub struct GatedUpdate {
    fc_full: Linear,
    bn1: BatchNorm,
}

impl GatedUpdate {
    pub fn load(vb: VarBuilder, in_dim: usize, out_dim: usize) -> Result<Self> {
        Ok(Self {
            fc_full: linear(in_dim, 2 * out_dim, vb.pp("fc_full"))?,
            bn1: batch_norm(2 * out_dim, BN_EPS, vb.pp("bn1"))?,
        })
    }

    pub fn forward_t(&self, z: &Tensor, train: bool) -> Result<Tensor> {
        let gated = self.fc_full.forward(z)?.apply_t(&self.bn1, train)?;
        let halves = gated.chunk(2, 1)?;
        sigmoid(&halves[0])?.mul(&softplus(&halves[1])?)
    }
}

/// Updates bond states from every angle that ends on them.
#[derive(Debug)]
pub struct EdgeConv {
    gate: GatedUpdate,
    bn2: BatchNorm,
}

impl EdgeConv {
    pub fn load(vb: VarBuilder, h_edge: usize, h_angle: usize) -> Result<Self> {
        Ok(Self {
            gate: GatedUpdate::load(vb.clone(), 2 * h_edge + h_angle, h_edge)?,
            bn2: batch_norm(h_edge, BN_EPS, vb.pp("bn2"))?,
        })
    }

    pub fn forward_t(
        &self,
        bonds: &Tensor,
        angles: &Tensor,
        batch: &BatchTensors,
        train: bool,
    ) -> Result<Tensor> {
        let (src, dst) = angle_endpoints(bonds, batch)?;
        let z = Tensor::cat(&[&dst, &src, angles], 1)?;
        let messages = self.gate.forward_t(&z, train)?;
        let summed = scatter_sum(&messages, &batch.angle_dst, batch.num_bonds)?
            .apply_t(&self.bn2, train)?;
        softplus(&bonds.add(&summed)?)
    }
}

/// Updates angle states from the two bonds they join.
#[derive(Debug)]
pub struct AngleConv {
    gate: GatedUpdate,
    bn2: BatchNorm,
}

impl AngleConv {
    pub fn load(vb: VarBuilder, h_angle: usize, h_edge: usize) -> Result<Self> {
        Ok(Self {
            gate: GatedUpdate::load(vb.clone(), h_angle + 2 * h_edge, h_angle)?,
            bn2: batch_norm(h_angle, BN_EPS, vb.pp("bn2"))?,
        })
    }

    pub fn forward_t(
        &self,
        angles: &Tensor,
        bonds: &Tensor,
        batch: &BatchTensors,
        train: bool,
    ) -> Result<Tensor> {
        let (src, dst) = angle_endpoints(bonds, batch)?;
        let z = Tensor::cat(&[angles, &src, &dst], 1)?;
        let update = self.gate.forward_t(&z, train)?.apply_t(&self.bn2, train)?;
        softplus(&angles.add(&update)?)
    }
}

/// Hidden layers of constant width followed by the classification layer.
#[derive(Debug)]
pub struct MlpHead {
    hidden: Vec<Linear>,
    fc_out: Linear,
}

impl MlpHead {
    pub fn load(vb: VarBuilder, width: usize, num_hidden: usize, n_classes: usize) -> Result<Self> {
        let hidden = (0..num_hidden)
            .map(|i| linear(width, width, vb.pp("mlp").pp(i)))
            .collect::<Result<Vec<_>>>()?;
        let fc_out = linear(width, n_classes, vb.pp("fc_out"))?;
        Ok(Self { hidden, fc_out })
    }

    /// Logits and the embedding they were computed from.
    pub fn forward(&self, pooled: &Tensor) -> Result<(Tensor, Tensor)> {
        let mut x = pooled.clone();
        for layer in &self.hidden {
            x = softplus(&layer.forward(&x)?)?;
        }
        let logits = self.fc_out.forward(&x)?;
        Ok((logits, x))
    }
}

/// `1.0` where `mask` holds, `0.0` elsewhere, as a column for broadcasting.
pub fn mask_column(mask: &Tensor) -> Result<Tensor> {
    mask.to_dtype(DType::F32)?.unsqueeze(1)
}
