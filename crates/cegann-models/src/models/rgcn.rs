use crate::config::RgcnConfig;
use crate::layers::{angle_endpoints, mask_column, readout, scatter_sum, MlpHead};
use crate::network::{GraphNetwork, NetOutput};
use cegann_core::BatchTensors;
use candle_core::{Module, Result, Tensor};
use candle_nn::{linear, linear_no_bias, Linear, VarBuilder};

/// Relation of every angle: its cosine binned into `RELATIONS` equal-width
/// classes over `range`. Cosines outside the range fall in the end classes.
pub fn relation_bins(cosines: &Tensor, range: (f64, f64)) -> Result<Tensor> {
    let (lo, hi) = range;
    let relations = RgcnConfig::RELATIONS as f64;
    let scale = relations / (hi - lo);
    cosines
        .affine(scale, -lo * scale)?
        .floor()?
        .clamp(0.0, relations - 1.0)
}

#[derive(Debug)]
struct RgcnLayer {
    self_loop: Linear,
    relations: Vec<Linear>,
}

impl RgcnLayer {
    fn load(vb: VarBuilder) -> Result<Self> {
        let hidden = RgcnConfig::HIDDEN;
        let self_loop = linear(hidden, hidden, vb.pp("self_loop"))?;
        let relations = (0..RgcnConfig::RELATIONS)
            .map(|r| linear_no_bias(hidden, hidden, vb.pp("relations").pp(r)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            self_loop,
            relations,
        })
    }

    fn forward(
        &self,
        bonds: &Tensor,
        bins: &Tensor,
        batch: &BatchTensors,
        neigh: f64,
    ) -> Result<Tensor> {
        let (src, _) = angle_endpoints(bonds, batch)?;
        let mut messages = src.zeros_like()?;
        for (r, relation) in self.relations.iter().enumerate() {
            let mask = mask_column(&bins.eq(r as f64)?)?;
            messages = messages.add(&relation.forward(&src)?.broadcast_mul(&mask)?)?;
        }
        let aggregated = (scatter_sum(&messages, &batch.angle_dst, batch.num_bonds)? / neigh)?;
        self.self_loop.forward(bonds)?.add(&aggregated)?.relu()
    }
}

/// Relational GCN on bonds: one weight matrix per angle class.
#[derive(Debug)]
pub struct Rgcn {
    bond_embedding: Linear,
    layers: Vec<RgcnLayer>,
    head: MlpHead,
    config: RgcnConfig,
}

impl Rgcn {
    pub fn load(vb: VarBuilder, config: &RgcnConfig) -> Result<Self> {
        let bond_embedding = linear(
            config.bond_fea_len,
            RgcnConfig::HIDDEN,
            vb.pp("bond_embedding"),
        )?;
        let layers = (0..RgcnConfig::LAYERS)
            .map(|i| RgcnLayer::load(vb.pp("layers").pp(i)))
            .collect::<Result<Vec<_>>>()?;
        let head = MlpHead::load(vb.pp("head"), RgcnConfig::HIDDEN, 1, config.n_classification)?;
        Ok(Self {
            bond_embedding,
            layers,
            head,
            config: config.clone(),
        })
    }
}

impl GraphNetwork for Rgcn {
    fn forward_t(&self, batch: &BatchTensors, _train: bool) -> Result<NetOutput> {
        let neigh = self.config.neigh.max(1) as f64;
        let bins = relation_bins(&batch.angle_cosines, self.config.angle_range)?;
        let mut bonds = self.bond_embedding.forward(&batch.bond_features)?;
        for layer in &self.layers {
            bonds = layer.forward(&bonds, &bins, batch, neigh)?;
        }
        let pooled = readout(&bonds, batch, self.config.pooling)?;
        let (logits, embedding) = self.head.forward(&pooled)?;
        Ok(NetOutput { logits, embedding })
    }

    fn embedding_dim(&self) -> usize {
        RgcnConfig::HIDDEN
    }
}
