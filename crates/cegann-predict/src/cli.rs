use crate::pipeline::{run, PredictOptions};
use cegann_core::GraphKind;
use cegann_models::ModelKind;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the `*.POSCAR` files to predict
    validation_data: PathBuf,

    /// Trained weights (`.safetensors`, or a pickle with a `model` state dict)
    checkpoint: PathBuf,

    /// Network architecture the checkpoint was trained with
    #[arg(value_enum)]
    model: ModelKind,

    /// `heterogeneous` for species-aware features; anything else is homogeneous
    heterogeneity: Option<String>,

    /// YAML settings; defaults are used when the file does not exist
    #[arg(long, default_value = "custom_config.yaml")]
    config: PathBuf,

    /// Where to write the predictions
    #[arg(short, long, default_value = "predictions.json")]
    output: PathBuf,

    /// Run on the CPU even when a GPU is available
    #[arg(long)]
    cpu: bool,
}

impl Cli {
    pub fn options(&self) -> PredictOptions {
        let graph = GraphKind::from_flag(self.heterogeneity.as_deref());
        if self.heterogeneity.is_none() {
            tracing::warn!("no heterogeneity given, using {} graphs", graph);
        }
        PredictOptions {
            validation_data: self.validation_data.clone(),
            checkpoint: self.checkpoint.clone(),
            model: self.model,
            graph,
            config: self.config.clone(),
            output: self.output.clone(),
        }
    }

    pub fn execute(&self) -> anyhow::Result<()> {
        let options = self.options();
        let device = cegann_models::device(self.cpu)?;
        run(&options, &device)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["cegann-predict", "data", "model.pth.tar", "GIN"]).unwrap();
        let options = cli.options();
        assert_eq!(options.model, ModelKind::Gin);
        assert_eq!(options.graph, GraphKind::Homogeneous);
        assert_eq!(options.output, PathBuf::from("predictions.json"));
        assert_eq!(options.config, PathBuf::from("custom_config.yaml"));

        let cli = Cli::try_parse_from([
            "cegann-predict",
            "data",
            "w.safetensors",
            "RGCN",
            "heterogeneous",
            "--output",
            "out.json",
        ])
        .unwrap();
        let options = cli.options();
        assert_eq!(options.graph, GraphKind::Heterogeneous);
        assert_eq!(options.output, PathBuf::from("out.json"));
    }

    #[test]
    fn test_rejects_unknown_model_and_missing_arguments() {
        assert!(Cli::try_parse_from(["cegann-predict", "data", "ckpt", "GCN"]).is_err());
        assert!(Cli::try_parse_from(["cegann-predict", "data", "ckpt", "gin"]).is_err());
        assert!(Cli::try_parse_from(["cegann-predict", "data"]).is_err());
    }
}
