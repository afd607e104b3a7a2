use crate::config::SageConfig;
use crate::layers::{angle_endpoints, readout, scatter_mean, MlpHead};
use crate::network::{GraphNetwork, NetOutput};
use cegann_core::BatchTensors;
use candle_core::{Module, Result, Tensor};
use candle_nn::{
    batch_norm, linear, linear_no_bias, ops::sigmoid, BatchNorm, Dropout, Linear, VarBuilder,
};

#[derive(Debug)]
struct SageConv {
    angle_gate: Linear,
    lin_self: Linear,
    lin_neigh: Linear,
    bn: BatchNorm,
}

impl SageConv {
    fn load(vb: VarBuilder, hidden: usize, angle_fea_len: usize) -> Result<Self> {
        Ok(Self {
            angle_gate: linear(angle_fea_len, hidden, vb.pp("angle_gate"))?,
            lin_self: linear(hidden, hidden, vb.pp("lin_self"))?,
            lin_neigh: linear_no_bias(hidden, hidden, vb.pp("lin_neigh"))?,
            bn: batch_norm(hidden, 1e-5, vb.pp("bn"))?,
        })
    }

    fn forward_t(&self, bonds: &Tensor, batch: &BatchTensors, train: bool) -> Result<Tensor> {
        let (src, _) = angle_endpoints(bonds, batch)?;
        // neighbor bonds are weighted by a gate computed from the angle between them
        let gate = sigmoid(&self.angle_gate.forward(&batch.angle_features)?)?;
        let messages = src.mul(&gate)?;
        let aggregated = scatter_mean(&messages, &batch.angle_dst, batch.num_bonds)?;
        self.lin_self
            .forward(bonds)?
            .add(&self.lin_neigh.forward(&aggregated)?)?
            .apply_t(&self.bn, train)?
            .relu()
    }
}

/// GraphSAGE on bonds with mean aggregation and dropout between layers.
#[derive(Debug)]
pub struct Sage {
    bond_embedding: Linear,
    convs: Vec<SageConv>,
    dropout: Dropout,
    head: MlpHead,
    config: SageConfig,
}

impl Sage {
    pub fn load(vb: VarBuilder, config: &SageConfig) -> Result<Self> {
        let conv = &config.conv;
        let bond_embedding = linear(conv.bond_fea_len, conv.h_fea_edge, vb.pp("bond_embedding"))?;
        let convs = (0..conv.n_conv_edge)
            .map(|i| SageConv::load(vb.pp("convs").pp(i), conv.h_fea_edge, conv.angle_fea_len))
            .collect::<Result<Vec<_>>>()?;
        let head = MlpHead::load(
            vb.pp("head"),
            conv.h_fea_edge,
            conv.num_mlp,
            conv.n_classification,
        )?;
        Ok(Self {
            bond_embedding,
            convs,
            dropout: Dropout::new(config.dropout_prob),
            head,
            config: config.clone(),
        })
    }
}

impl GraphNetwork for Sage {
    fn forward_t(&self, batch: &BatchTensors, train: bool) -> Result<NetOutput> {
        let mut bonds = self.bond_embedding.forward(&batch.bond_features)?;
        for conv in &self.convs {
            bonds = conv.forward_t(&bonds, batch, train)?;
            bonds = self.dropout.forward(&bonds, train)?;
        }
        let pooled = readout(&bonds, batch, self.config.conv.pooling)?;
        let (logits, embedding) = self.head.forward(&pooled)?;
        Ok(NetOutput { logits, embedding })
    }

    fn embedding_dim(&self) -> usize {
        self.config.conv.h_fea_edge
    }
}
