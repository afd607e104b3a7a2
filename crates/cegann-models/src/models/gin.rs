use crate::config::GinConfig;
use crate::layers::{angle_endpoints, readout, scatter_sum, MlpHead};
use crate::network::{GraphNetwork, NetOutput};
use cegann_core::BatchTensors;
use candle_core::{Module, Result, Tensor};
use candle_nn::{batch_norm, linear, BatchNorm, Init, Linear, VarBuilder};

/// One isomorphism layer over the bond graph.
///
/// `h' = MLP((1 + eps) * h + sum_{angles -> h} relu(h_src + W a) / neigh)`
#[derive(Debug)]
struct GinConv {
    angle_proj: Linear,
    eps: Tensor,
    mlp_in: Linear,
    bn: BatchNorm,
    mlp_out: Linear,
}

impl GinConv {
    fn load(vb: VarBuilder, hidden: usize, angle_fea_len: usize) -> Result<Self> {
        Ok(Self {
            angle_proj: linear(angle_fea_len, hidden, vb.pp("angle_proj"))?,
            eps: vb.get_with_hints(1, "eps", Init::Const(0.0))?,
            mlp_in: linear(hidden, hidden, vb.pp("mlp").pp(0))?,
            bn: batch_norm(hidden, 1e-5, vb.pp("bn"))?,
            mlp_out: linear(hidden, hidden, vb.pp("mlp").pp(1))?,
        })
    }

    fn forward_t(
        &self,
        bonds: &Tensor,
        batch: &BatchTensors,
        neigh: f64,
        train: bool,
    ) -> Result<Tensor> {
        let (src, _) = angle_endpoints(bonds, batch)?;
        let messages = src
            .add(&self.angle_proj.forward(&batch.angle_features)?)?
            .relu()?;
        let aggregated = (scatter_sum(&messages, &batch.angle_dst, batch.num_bonds)? / neigh)?;
        let combined = bonds
            .broadcast_mul(&(&self.eps + 1.0)?)?
            .add(&aggregated)?;
        let x = self.mlp_in.forward(&combined)?.apply_t(&self.bn, train)?.relu()?;
        self.mlp_out.forward(&x)?.relu()
    }
}

/// Graph isomorphism network on bonds, with fixed angle features as edge inputs.
#[derive(Debug)]
pub struct Gin {
    bond_embedding: Linear,
    convs: Vec<GinConv>,
    head: MlpHead,
    config: GinConfig,
}

impl Gin {
    pub fn load(vb: VarBuilder, config: &GinConfig) -> Result<Self> {
        let conv = &config.conv;
        let bond_embedding = linear(conv.bond_fea_len, conv.h_fea_edge, vb.pp("bond_embedding"))?;
        let convs = (0..conv.n_conv_edge)
            .map(|i| GinConv::load(vb.pp("convs").pp(i), conv.h_fea_edge, conv.angle_fea_len))
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
            head,
            config: config.clone(),
        })
    }
}

impl GraphNetwork for Gin {
    fn forward_t(&self, batch: &BatchTensors, train: bool) -> Result<NetOutput> {
        let neigh = self.config.neigh.max(1) as f64;
        let mut bonds = self.bond_embedding.forward(&batch.bond_features)?;
        for conv in &self.convs {
            bonds = conv.forward_t(&bonds, batch, neigh, train)?;
        }
        let pooled = readout(&bonds, batch, self.config.conv.pooling)?;
        let (logits, embedding) = self.head.forward(&pooled)?;
        Ok(NetOutput { logits, embedding })
    }

    fn embedding_dim(&self) -> usize {
        self.config.conv.h_fea_edge
    }
}
