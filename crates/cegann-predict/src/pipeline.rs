use crate::output::{Prediction, Predictions};
use anyhow::{Context, Result};
use candle_core::Device;
use cegann_core::{discover_structures, load_records, CrystalGraphDataset, GraphKind, Settings};
use cegann_models::{load_network, GraphNetwork, ModelConfig, ModelKind};
use std::path::PathBuf;

/// Everything one prediction run needs.
#[derive(Clone, Debug)]
pub struct PredictOptions {
    pub validation_data: PathBuf,
    pub checkpoint: PathBuf,
    pub model: ModelKind,
    pub graph: GraphKind,
    pub config: PathBuf,
    pub output: PathBuf,
}

/// Predict every structure under `validation_data` and write the results.
///
/// Nothing is written unless every structure was predicted.
pub fn run(options: &PredictOptions, device: &Device) -> Result<Predictions> {
    let settings = Settings::load_or_default(&options.config)
        .with_context(|| format!("failed to load settings from {}", options.config.display()))?;

    let paths = discover_structures(&options.validation_data).with_context(|| {
        format!(
            "failed to list structures in {}",
            options.validation_data.display()
        )
    })?;
    let records = load_records(&paths).context("failed to read structures")?;

    let builder = options.graph.builder(&settings);
    let dataset = CrystalGraphDataset::new(&records, builder.as_ref())
        .context("failed to build crystal graphs")?;

    let config = ModelConfig::from_settings(options.model, &settings, dataset.feature_dims());
    tracing::info!("model {} on {} graphs", options.model, options.graph);
    let network = load_network(&options.checkpoint, &config, device)
        .with_context(|| format!("failed to load {}", options.checkpoint.display()))?;

    let predictions = predict(&dataset, &network, device)?;
    predictions.write(&options.output)?;
    tracing::info!(
        "wrote {} predictions to {}",
        predictions.len(),
        options.output.display()
    );
    Ok(predictions)
}

/// One forward pass per structure, in dataset order.
pub fn predict(
    dataset: &CrystalGraphDataset,
    network: &dyn GraphNetwork,
    device: &Device,
) -> Result<Predictions> {
    let mut predictions = Predictions::new();
    for (label, graph) in dataset.iter() {
        let batch = CrystalGraphDataset::collate(&[graph])?;
        let (inputs, _) = batch.to_device(device)?;
        let out = network
            .forward_t(&inputs, false)
            .with_context(|| format!("inference failed for {}", label))?;
        let prediction = Prediction {
            class: out.predicted_classes()?,
            embeddings: out.embedding.flatten_all()?.to_vec1::<f32>()?,
        };
        tracing::debug!("{}: class {:?}", label, prediction.class);
        predictions.insert(label, prediction)?;
    }
    Ok(predictions)
}
