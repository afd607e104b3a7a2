use crate::config::GannConfig;
use crate::layers::{readout, AngleConv, EdgeConv, MlpHead};
use crate::network::{GraphNetwork, NetOutput};
use cegann_core::BatchTensors;
use candle_core::{Module, Result};
use candle_nn::{linear, Linear, VarBuilder};

/// Bond and angle states updated in alternation: each layer first refreshes
/// the angles from their two bonds, then the bonds from their incoming angles.
#[derive(Debug)]
pub struct Gann {
    edge_embedding: Linear,
    angle_embedding: Linear,
    edge_convs: Vec<EdgeConv>,
    angle_convs: Vec<AngleConv>,
    head: MlpHead,
    config: GannConfig,
}

impl Gann {
    pub fn load(vb: VarBuilder, config: &GannConfig) -> Result<Self> {
        let GannConfig {
            bond_fea_len,
            angle_fea_len,
            h_fea_edge,
            h_fea_angle,
            n_conv_edge,
            n_conv_angle,
            n_classification,
            num_mlp,
            ..
        } = *config;

        let edge_embedding = linear(bond_fea_len, h_fea_edge, vb.pp("edge_embedding"))?;
        let angle_embedding = linear(angle_fea_len, h_fea_angle, vb.pp("angle_embedding"))?;
        let edge_convs = (0..n_conv_edge)
            .map(|i| EdgeConv::load(vb.pp("edge_convs").pp(i), h_fea_edge, h_fea_angle))
            .collect::<Result<Vec<_>>>()?;
        let angle_convs = (0..n_conv_angle)
            .map(|i| AngleConv::load(vb.pp("angle_convs").pp(i), h_fea_angle, h_fea_edge))
            .collect::<Result<Vec<_>>>()?;
        let head = MlpHead::load(vb.pp("head"), h_fea_edge, num_mlp, n_classification)?;

        Ok(Self {
            edge_embedding,
            angle_embedding,
            edge_convs,
            angle_convs,
            head,
            config: config.clone(),
        })
    }
}

impl GraphNetwork for Gann {
    fn forward_t(&self, batch: &BatchTensors, train: bool) -> Result<NetOutput> {
        let mut bonds = self.edge_embedding.forward(&batch.bond_features)?;
        let mut angles = self.angle_embedding.forward(&batch.angle_features)?;

        let depth = self.edge_convs.len().max(self.angle_convs.len());
        for layer in 0..depth {
            if let Some(conv) = self.angle_convs.get(layer) {
                angles = conv.forward_t(&angles, &bonds, batch, train)?;
            }
            if let Some(conv) = self.edge_convs.get(layer) {
                bonds = conv.forward_t(&bonds, &angles, batch, train)?;
            }
        }

        let pooled = readout(&bonds, batch, self.config.pooling)?;
        let (logits, embedding) = self.head.forward(&pooled)?;
        Ok(NetOutput { logits, embedding })
    }

    fn embedding_dim(&self) -> usize {
        self.config.h_fea_edge
    }
}
