use crate::ModelError;
use cegann_core::{FeatureDims, Pooling, Settings};
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// The four network architectures a checkpoint can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)] // Need Clone and ValueEnum for CLAP
pub enum ModelKind {
    /// Crystal edge graph attention network
    #[value(name = "GANN")]
    Gann,
    /// Graph isomorphism network
    #[value(name = "GIN")]
    Gin,
    /// GraphSAGE with mean aggregation
    #[value(name = "SAGE")]
    Sage,
    /// Relational GCN over angle classes
    #[value(name = "RGCN")]
    Rgcn,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Gann,
        ModelKind::Gin,
        ModelKind::Sage,
        ModelKind::Rgcn,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            ModelKind::Gann => "GANN",
            ModelKind::Gin => "GIN",
            ModelKind::Sage => "SAGE",
            ModelKind::Rgcn => "RGCN",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.token() == s)
            .ok_or_else(|| ModelError::UnknownArchitecture(s.to_string()))
    }
}

/// Hyperparameters shared by the bond/angle convolution networks.
#[derive(Clone, Debug, PartialEq)]
pub struct GannConfig {
    pub bond_fea_len: usize,
    pub angle_fea_len: usize,
    pub h_fea_edge: usize,
    pub h_fea_angle: usize,
    pub n_conv_edge: usize,
    pub n_conv_angle: usize,
    pub n_classification: usize,
    pub pooling: Pooling,
    pub num_mlp: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GinConfig {
    pub conv: GannConfig,
    /// Neighbor count, used to normalize summed messages.
    pub neigh: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SageConfig {
    pub conv: GannConfig,
    pub dropout_prob: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RgcnConfig {
    pub bond_fea_len: usize,
    /// Cosine range split into equal-width relation classes.
    pub angle_range: (f64, f64),
    pub n_classification: usize,
    pub neigh: usize,
    pub pooling: Pooling,
}

impl RgcnConfig {
    pub const HIDDEN: usize = 64;
    pub const LAYERS: usize = 2;
    pub const RELATIONS: usize = 4;
}

/// An architecture together with exactly the hyperparameters it needs.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelConfig {
    Gann(GannConfig),
    Gin(GinConfig),
    Sage(SageConfig),
    Rgcn(RgcnConfig),
}

impl ModelConfig {
    pub fn from_settings(kind: ModelKind, settings: &Settings, dims: FeatureDims) -> Self {
        let conv = GannConfig {
            bond_fea_len: dims.bond,
            angle_fea_len: dims.angle,
            h_fea_edge: settings.h_fea_edge,
            h_fea_angle: settings.h_fea_angle,
            n_conv_edge: settings.n_conv_edge,
            n_conv_angle: settings.n_conv_angle,
            n_classification: settings.n_classification,
            pooling: settings.pooling,
            num_mlp: settings.num_mlp,
        };
        match kind {
            ModelKind::Gann => ModelConfig::Gann(conv),
            ModelKind::Gin => ModelConfig::Gin(GinConfig {
                conv,
                neigh: settings.neighbors,
            }),
            ModelKind::Sage => ModelConfig::Sage(SageConfig {
                conv,
                dropout_prob: settings.dropout_prob,
            }),
            ModelKind::Rgcn => ModelConfig::Rgcn(RgcnConfig {
                bond_fea_len: dims.bond,
                angle_range: (settings.gbf_angle.dmin, settings.gbf_angle.dmax),
                n_classification: settings.n_classification,
                neigh: settings.neighbors,
                pooling: settings.pooling,
            }),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelConfig::Gann(_) => ModelKind::Gann,
            ModelConfig::Gin(_) => ModelKind::Gin,
            ModelConfig::Sage(_) => ModelKind::Sage,
            ModelConfig::Rgcn(_) => ModelKind::Rgcn,
        }
    }

    /// Width of the embedding returned next to the logits.
    pub fn embedding_dim(&self) -> usize {
        match self {
            ModelConfig::Gann(c) => c.h_fea_edge,
            ModelConfig::Gin(c) => c.conv.h_fea_edge,
            ModelConfig::Sage(c) => c.conv.h_fea_edge,
            ModelConfig::Rgcn(_) => RgcnConfig::HIDDEN,
        }
    }

    pub fn n_classification(&self) -> usize {
        match self {
            ModelConfig::Gann(c) => c.n_classification,
            ModelConfig::Gin(c) => c.conv.n_classification,
            ModelConfig::Sage(c) => c.conv.n_classification,
            ModelConfig::Rgcn(c) => c.n_classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.token().parse::<ModelKind>().unwrap(), kind);
        }
        assert!(matches!(
            "gin".parse::<ModelKind>(),
            Err(ModelError::UnknownArchitecture(_))
        ));
        assert!("GCN".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_value_enum_names() {
        let names: Vec<String> = ModelKind::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["GANN", "GIN", "SAGE", "RGCN"]);
    }

    #[test]
    fn test_config_subsets() {
        let settings = Settings::default();
        let dims = FeatureDims { bond: 100, angle: 100 };

        let gin = ModelConfig::from_settings(ModelKind::Gin, &settings, dims);
        match &gin {
            ModelConfig::Gin(c) => assert_eq!(c.neigh, 12),
            other => panic!("expected GIN config, got {:?}", other),
        }
        assert_eq!(gin.embedding_dim(), 128);

        let rgcn = ModelConfig::from_settings(ModelKind::Rgcn, &settings, dims);
        assert_eq!(rgcn.kind(), ModelKind::Rgcn);
        assert_eq!(rgcn.embedding_dim(), RgcnConfig::HIDDEN);
        assert_eq!(rgcn.n_classification(), 2);
    }
}
