#![allow(dead_code)]
use cegann_core::{GraphKind, Settings};
use cegann_models::{save_initialized, ModelConfig, ModelKind};
use cegann_test_data::TestFile;
use std::path::{Path, PathBuf};

pub const SMALL_CONFIG: &str = "\
neighbors: 4
gbf_bond: {dmin: 0.0, dmax: 8.0, steps: 8}
gbf_angle: {dmin: -1.0, dmax: 1.0, steps: 6}
h_fea_edge: 16
h_fea_angle: 8
n_conv_edge: 2
n_conv_angle: 1
num_MLP: 1
n_classification: 3
epochs: 100
";

pub fn small_settings() -> Settings {
    Settings::from_yaml_str(SMALL_CONFIG).unwrap()
}

/// Write `custom_config.yaml` into `dir`.
pub fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("custom_config.yaml");
    std::fs::write(&path, SMALL_CONFIG).unwrap();
    path
}

/// Fresh weights matching `model` on `graph` features under the small settings.
pub fn write_checkpoint(dir: &Path, model: ModelKind, graph: GraphKind) -> PathBuf {
    let settings = small_settings();
    let dims = graph.builder(&settings).feature_dims();
    let config = ModelConfig::from_settings(model, &settings, dims);
    let path = dir.join(format!("{}-{}.safetensors", model, graph));
    save_initialized(&config, &path).unwrap();
    path
}

/// A data directory holding the given `(stem, file)` structures.
pub fn write_structures(dir: &Path, files: &[(&str, TestFile)]) -> PathBuf {
    let data = dir.join("validation");
    std::fs::create_dir_all(&data).unwrap();
    for (stem, file) in files {
        file.write_to(&data, stem).unwrap();
    }
    data
}
