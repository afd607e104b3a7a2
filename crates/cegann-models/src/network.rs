use crate::config::{ModelConfig, ModelKind};
use crate::models::{Gann, Gin, Rgcn, Sage};
use cegann_core::BatchTensors;
use candle_core::{Result, Tensor, D};
use candle_nn::VarBuilder;

/// What every network returns for a batch of `C` crystals.
#[derive(Debug)]
pub struct NetOutput {
    /// `[C, n_classification]`
    pub logits: Tensor,
    /// `[C, embedding_dim]`, the crystal vector the logits were computed from.
    pub embedding: Tensor,
}

impl NetOutput {
    /// Index of the largest logit for each crystal.
    pub fn predicted_classes(&self) -> Result<Vec<u32>> {
        self.logits.argmax(D::Minus1)?.to_vec1::<u32>()
    }
}

pub trait GraphNetwork {
    fn forward_t(&self, batch: &BatchTensors, train: bool) -> Result<NetOutput>;

    /// Inference pass: batch norms use running statistics and dropout is off.
    fn forward(&self, batch: &BatchTensors) -> Result<NetOutput> {
        self.forward_t(batch, false)
    }

    fn embedding_dim(&self) -> usize;
}

/// Any of the supported architectures, chosen at runtime.
#[derive(Debug)]
pub enum CrystalNet {
    Gann(Gann),
    Gin(Gin),
    Sage(Sage),
    Rgcn(Rgcn),
}

impl CrystalNet {
    pub fn load(vb: VarBuilder, config: &ModelConfig) -> Result<Self> {
        Ok(match config {
            ModelConfig::Gann(c) => CrystalNet::Gann(Gann::load(vb, c)?),
            ModelConfig::Gin(c) => CrystalNet::Gin(Gin::load(vb, c)?),
            ModelConfig::Sage(c) => CrystalNet::Sage(Sage::load(vb, c)?),
            ModelConfig::Rgcn(c) => CrystalNet::Rgcn(Rgcn::load(vb, c)?),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            CrystalNet::Gann(_) => ModelKind::Gann,
            CrystalNet::Gin(_) => ModelKind::Gin,
            CrystalNet::Sage(_) => ModelKind::Sage,
            CrystalNet::Rgcn(_) => ModelKind::Rgcn,
        }
    }

    fn inner(&self) -> &dyn GraphNetwork {
        match self {
            CrystalNet::Gann(net) => net,
            CrystalNet::Gin(net) => net,
            CrystalNet::Sage(net) => net,
            CrystalNet::Rgcn(net) => net,
        }
    }
}

impl GraphNetwork for CrystalNet {
    fn forward_t(&self, batch: &BatchTensors, train: bool) -> Result<NetOutput> {
        self.inner().forward_t(batch, train)
    }

    fn embedding_dim(&self) -> usize {
        self.inner().embedding_dim()
    }
}
