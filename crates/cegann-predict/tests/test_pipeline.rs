mod common;

use candle_core::Device;
use cegann_core::GraphKind;
use cegann_models::{ModelConfig, ModelKind};
use cegann_predict::{run, PredictOptions};
use cegann_test_data::TestFile;
use common::{small_settings, write_checkpoint, write_config, write_structures};
use std::path::Path;

fn options(dir: &Path, model: ModelKind, graph: GraphKind) -> PredictOptions {
    let validation_data = write_structures(
        dir,
        &[
            ("S10", TestFile::cu_fcc()),
            ("S2", TestFile::cuzr_b2()),
            ("S1", TestFile::cuzr_cartesian()),
        ],
    );
    PredictOptions {
        validation_data,
        checkpoint: write_checkpoint(dir, model, graph),
        model,
        graph,
        config: write_config(dir),
        output: dir.join("predictions.json"),
    }
}

#[test]
fn test_every_model_and_graph_kind() {
    let settings = small_settings();
    for graph in [GraphKind::Homogeneous, GraphKind::Heterogeneous] {
        let dims = graph.builder(&settings).feature_dims();
        for model in ModelKind::ALL {
            let dir = tempfile::tempdir().unwrap();
            let opts = options(dir.path(), model, graph);
            let predictions = run(&opts, &Device::Cpu).unwrap();

            let width = ModelConfig::from_settings(model, &settings, dims).embedding_dim();
            assert_eq!(predictions.labels().collect::<Vec<_>>(), vec!["S1", "S2", "S10"]);
            for label in ["S1", "S2", "S10"] {
                let p = predictions.get(label).unwrap();
                assert_eq!(p.class.len(), 1);
                assert!(p.class[0] < 3, "{} {} class {:?}", model, graph, p.class);
                assert_eq!(p.embeddings.len(), width);
            }
            assert!(opts.output.exists());
        }
    }
}

#[test]
fn test_output_matches_returned_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path(), ModelKind::Sage, GraphKind::Homogeneous);
    let predictions = run(&opts, &Device::Cpu).unwrap();
    let written = std::fs::read_to_string(&opts.output).unwrap();
    assert_eq!(written, predictions.to_json().unwrap());
}

#[test]
fn test_mismatched_checkpoint_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path(), ModelKind::Gann, GraphKind::Homogeneous);
    opts.checkpoint = write_checkpoint(dir.path(), ModelKind::Gin, GraphKind::Homogeneous);

    let err = run(&opts, &Device::Cpu).unwrap_err();
    assert!(format!("{:#}", err).contains("does not match the GANN architecture"));
    assert!(!opts.output.exists());
}

#[test]
fn test_heterogeneous_checkpoint_on_homogeneous_graphs() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path(), ModelKind::Rgcn, GraphKind::Homogeneous);
    opts.checkpoint = write_checkpoint(dir.path(), ModelKind::Rgcn, GraphKind::Heterogeneous);
    // same names, different input widths
    assert!(run(&opts, &Device::Cpu).is_err());
    assert!(!opts.output.exists());
}

#[test]
fn test_bad_structure_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path(), ModelKind::Gin, GraphKind::Homogeneous);
    TestFile::truncated()
        .write_to(&opts.validation_data, "S3")
        .unwrap();
    opts.output = dir.path().join("out.json");

    let err = run(&opts, &Device::Cpu).unwrap_err();
    assert!(format!("{:#}", err).contains("S3.POSCAR"));
    assert!(!opts.output.exists());
}
