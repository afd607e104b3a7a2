//! Reading trained weights.
//!
//! A checkpoint is either a `.safetensors` file or a PyTorch pickle whose
//! `model` entry holds the state dict. Keys must match the parameters of the
//! requested architecture exactly, apart from the `num_batches_tracked`
//! counters PyTorch stores next to every batch norm.
use crate::config::ModelConfig;
use crate::network::CrystalNet;
use crate::ModelError;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Entry of a pickled checkpoint that holds the state dict.
const STATE_DICT_KEY: &str = "model";

const IGNORED_SUFFIX: &str = "num_batches_tracked";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointFormat {
    Safetensors,
    Pickle,
}

impl CheckpointFormat {
    /// `.safetensors` files are read as such; anything else is tried as a pickle.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("safetensors") => CheckpointFormat::Safetensors,
            _ => CheckpointFormat::Pickle,
        }
    }
}

/// All tensors stored in the checkpoint, on the CPU.
fn read_tensors(path: &Path) -> Result<HashMap<String, Tensor>, ModelError> {
    let read = match CheckpointFormat::from_path(path) {
        CheckpointFormat::Safetensors => candle_core::safetensors::load(path, &Device::Cpu),
        CheckpointFormat::Pickle => {
            candle_core::pickle::read_all_with_key(path, Some(STATE_DICT_KEY))
                .map(|pairs| pairs.into_iter().collect())
        }
    };
    let tensors = read.map_err(|source| ModelError::CheckpointRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tensors
        .into_iter()
        .filter(|(name, _)| !name.ends_with(IGNORED_SUFFIX))
        .collect())
}

fn initialized(config: &ModelConfig) -> candle_core::Result<VarMap> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    CrystalNet::load(vb, config)?;
    Ok(varmap)
}

/// Parameter names the architecture described by `config` expects.
pub fn expected_parameters(config: &ModelConfig) -> candle_core::Result<BTreeSet<String>> {
    let varmap = initialized(config)?;
    let data = varmap
        .data()
        .lock()
        .map_err(|e| candle_core::Error::Msg(e.to_string()))?;
    Ok(data.keys().cloned().collect())
}

/// Load `config`'s architecture with the weights stored at `path`.
pub fn load_network(
    path: &Path,
    config: &ModelConfig,
    device: &Device,
) -> Result<CrystalNet, ModelError> {
    let model = config.kind();
    let tensors = read_tensors(path)?;
    let expected = expected_parameters(config)?;

    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !tensors.contains_key(*name))
        .cloned()
        .collect();
    let mut unexpected: Vec<String> = tensors
        .keys()
        .filter(|name| !expected.contains(*name))
        .cloned()
        .collect();
    unexpected.sort();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(ModelError::CheckpointMismatch {
            path: path.to_path_buf(),
            model,
            missing,
            unexpected,
        });
    }

    tracing::info!(
        "loading {} weights ({} tensors) from {}",
        model,
        tensors.len(),
        path.display()
    );
    let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
    CrystalNet::load(vb, config).map_err(|source| ModelError::CheckpointLoad {
        path: path.to_path_buf(),
        model,
        source,
    })
}

/// Write freshly initialized weights for `config` as safetensors.
pub fn save_initialized(config: &ModelConfig, path: &Path) -> candle_core::Result<()> {
    initialized(config)?.save(path)
}
