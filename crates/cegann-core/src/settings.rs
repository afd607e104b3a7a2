//! Run settings.
//!
//! Every option has a built-in default. A YAML file may override any subset
//! of them; keys this crate does not know about (training options kept in a
//! shared config file, for instance) are reported and otherwise ignored.
use crate::graph::GaussianBasis;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{Display, EnumString};

/// How per-atom features are reduced to one vector per crystal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Pooling {
    #[default]
    Mean,
    Sum,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Neighbors kept per atom.
    pub neighbors: usize,
    /// Initial neighbor search radius in Angstrom.
    pub rcut: f64,
    /// Radius increment applied while some atom has too few neighbors.
    pub search_delta: f64,
    pub n_classification: usize,
    pub gbf_bond: GaussianBasis,
    pub gbf_angle: GaussianBasis,
    pub h_fea_edge: usize,
    pub h_fea_angle: usize,
    pub n_conv_edge: usize,
    pub n_conv_angle: usize,
    pub pooling: Pooling,
    #[serde(rename = "num_MLP", alias = "num_mlp")]
    pub num_mlp: usize,
    pub dropout_prob: f32,
    /// Species order used by the heterogeneous graph features.
    pub species: Vec<String>,
}

const KNOWN_KEYS: &[&str] = &[
    "neighbors",
    "rcut",
    "search_delta",
    "n_classification",
    "gbf_bond",
    "gbf_angle",
    "h_fea_edge",
    "h_fea_angle",
    "n_conv_edge",
    "n_conv_angle",
    "pooling",
    "num_MLP",
    "num_mlp",
    "dropout_prob",
    "species",
];

impl Default for Settings {
    fn default() -> Self {
        Self {
            neighbors: 12,
            rcut: 3.0,
            search_delta: 1.0,
            n_classification: 2,
            gbf_bond: GaussianBasis::new(0.0, 8.0, 100),
            gbf_angle: GaussianBasis::new(-1.0, 1.0, 100),
            h_fea_edge: 128,
            h_fea_angle: 128,
            n_conv_edge: 3,
            n_conv_angle: 3,
            pooling: Pooling::Mean,
            num_mlp: 2,
            dropout_prob: 0.3,
            species: vec!["Cu".to_string(), "Zr".to_string()],
        }
    }
}

impl Settings {
    pub fn from_yaml_str(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        Self::parse_yaml(contents).map(|(settings, _)| settings)
    }

    /// Settings plus the top-level keys that no setting consumed.
    fn parse_yaml(contents: &str) -> std::result::Result<(Self, Vec<String>), serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok((Self::default(), Vec::new()));
        }
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let unknown = match &value {
            serde_yaml::Value::Mapping(map) => map
                .keys()
                .filter_map(|k| k.as_str())
                .filter(|k| !KNOWN_KEYS.contains(k))
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        let settings = serde_yaml::from_value(value)?;
        Ok((settings, unknown))
    }

    /// Parse and validate a YAML settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let (settings, unknown) =
            Self::parse_yaml(&contents).map_err(|source| CoreError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        for key in &unknown {
            tracing::warn!("ignoring unrecognized setting `{}` in {}", key, path.display());
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Read `path` when it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("loading settings from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::info!("{} not found, using default settings", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.neighbors < 2 {
            return Err(CoreError::Config(format!(
                "neighbors must be at least 2 to form angles, got {}",
                self.neighbors
            )));
        }
        if !(self.rcut > 0.0) {
            return Err(CoreError::Config(format!("rcut must be positive, got {}", self.rcut)));
        }
        if !(self.search_delta > 0.0) {
            return Err(CoreError::Config(format!(
                "search_delta must be positive, got {}",
                self.search_delta
            )));
        }
        if self.n_classification == 0 {
            return Err(CoreError::Config("n_classification must be at least 1".into()));
        }
        if self.h_fea_edge == 0 || self.h_fea_angle == 0 {
            return Err(CoreError::Config("hidden feature widths must be non-zero".into()));
        }
        if !(0.0..1.0).contains(&self.dropout_prob) {
            return Err(CoreError::Config(format!(
                "dropout_prob must lie in [0, 1), got {}",
                self.dropout_prob
            )));
        }
        if self.species.is_empty() {
            return Err(CoreError::Config("species must list at least one element".into()));
        }
        self.gbf_bond
            .validate()
            .map_err(|e| CoreError::Config(format!("gbf_bond: {}", e)))?;
        self.gbf_angle
            .validate()
            .map_err(|e| CoreError::Config(format!("gbf_angle: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.neighbors, 12);
        assert_eq!(settings.pooling, Pooling::Mean);
        assert_eq!(settings.gbf_bond.steps, 100);
    }

    #[test]
    fn test_partial_override() {
        let yaml = "neighbors: 8\nrcut: 4.5\npooling: sum\nnum_MLP: 1\ngbf_bond:\n  dmin: 0.0\n  dmax: 6.0\n  steps: 40\n";
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.neighbors, 8);
        assert_eq!(settings.rcut, 4.5);
        assert_eq!(settings.pooling, Pooling::Sum);
        assert_eq!(settings.num_mlp, 1);
        assert_eq!(settings.gbf_bond.steps, 40);
        // untouched keys keep their defaults
        assert_eq!(settings.h_fea_edge, 128);
        assert_eq!(settings.gbf_angle, GaussianBasis::new(-1.0, 1.0, 100));
    }

    #[test]
    fn test_unknown_keys_are_collected() {
        let (settings, unknown) =
            Settings::parse_yaml("epochs: 200\nlr: 0.001\nneighbors: 6\n").unwrap();
        assert_eq!(settings.neighbors, 6);
        assert_eq!(unknown, vec!["epochs", "lr"]);
    }

    #[test]
    fn test_empty_file_means_defaults() {
        assert_eq!(Settings::from_yaml_str("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join("custom_config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "neighbors: 1").unwrap();
        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_delta: 0.0").unwrap();
        assert!(Settings::from_file(file.path()).is_err());
    }

    #[test]
    fn test_malformed_yaml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "neighbors: [twelve").unwrap();
        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
    }
}
