//! # cegann-models
//!
//! Crystal graph networks in candle and the code to load them from trained
//! checkpoints.
//!
//! * [`ModelKind`] names an architecture; [`ModelConfig`] carries the
//!   hyperparameters that architecture reads from the [`Settings`](cegann_core::Settings)
//! * [`CrystalNet`] is any of the architectures behind the [`GraphNetwork`] trait
//! * [`load_network`] checks a checkpoint against the architecture and loads it
//!
//! ```shell
//! cargo test -p cegann-models
//! cargo test -p cegann-models --features metal
//! ```
use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::{Device, Result};

mod checkpoint;
mod config;
mod error;
pub mod layers;
mod models;
mod network;

pub use self::checkpoint::{expected_parameters, load_network, save_initialized, CheckpointFormat};
pub use self::config::{GannConfig, GinConfig, ModelConfig, ModelKind, RgcnConfig, SageConfig};
pub use self::error::ModelError;
pub use self::models::{Gann, Gin, Rgcn, Sage};
pub use self::network::{CrystalNet, GraphNetwork, NetOutput};

pub fn device(cpu: bool) -> Result<Device> {
    if cpu {
        Ok(Device::Cpu)
    } else if cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else if metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else {
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            tracing::info!("running on CPU, build with `--features metal` to run on the GPU");
        }
        #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
        {
            tracing::info!("running on CPU, build with `--features cuda` to run on the GPU");
        }
        Ok(Device::Cpu)
    }
}
