mod common;

use assert_cmd::Command;
use cegann_core::GraphKind;
use cegann_models::ModelKind;
use cegann_test_data::TestFile;
use common::{write_checkpoint, write_config, write_structures};
use serde_json::Value;

fn predict_cmd(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("cegann-predict").unwrap();
    cmd.current_dir(dir).arg("--cpu");
    cmd
}

fn read_output(dir: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(dir.join("predictions.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_missing_checkpoint_argument() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_structures(dir.path(), &[("A1", TestFile::cu_fcc())]);

    let output = predict_cmd(dir.path())
        .arg(&data)
        .assert()
        .failure()
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stderr).contains("<CHECKPOINT>"));
    assert!(!dir.path().join("predictions.json").exists());
}

#[test]
fn test_unknown_model_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_structures(dir.path(), &[("A1", TestFile::cu_fcc())]);
    let ckpt = write_checkpoint(dir.path(), ModelKind::Gin, GraphKind::Homogeneous);

    predict_cmd(dir.path())
        .arg(&data)
        .arg(&ckpt)
        .arg("GCN")
        .assert()
        .failure();
    assert!(!dir.path().join("predictions.json").exists());
}

#[test]
fn test_single_gin_structure() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let data = write_structures(dir.path(), &[("A1", TestFile::cuzr_b2())]);
    let ckpt = write_checkpoint(dir.path(), ModelKind::Gin, GraphKind::Homogeneous);

    predict_cmd(dir.path())
        .arg(&data)
        .arg(&ckpt)
        .arg("GIN")
        .assert()
        .success();

    let output = read_output(dir.path());
    let object = output.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["A1"]);
    let class = object["A1"]["class"].as_array().unwrap();
    assert_eq!(class.len(), 1);
    assert!(class[0].as_u64().unwrap() < 3);
    assert_eq!(object["A1"]["embeddings"].as_array().unwrap().len(), 16);
}

#[test]
fn test_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let data = write_structures(
        dir.path(),
        &[("S2", TestFile::cu_fcc()), ("S10", TestFile::cuzr_vasp4())],
    );
    let ckpt = write_checkpoint(dir.path(), ModelKind::Gann, GraphKind::Homogeneous);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        predict_cmd(dir.path())
            .arg(&data)
            .arg(&ckpt)
            .arg("GANN")
            .assert()
            .success();
        outputs.push(std::fs::read(dir.path().join("predictions.json")).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
    let text = String::from_utf8(outputs.remove(0)).unwrap();
    assert!(text.find("\"S2\"").unwrap() < text.find("\"S10\"").unwrap());
}

#[test]
fn test_omitted_heterogeneity_is_homogeneous() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let data = write_structures(dir.path(), &[("A1", TestFile::cuzr_cartesian())]);
    let ckpt = write_checkpoint(dir.path(), ModelKind::Rgcn, GraphKind::Homogeneous);

    predict_cmd(dir.path())
        .arg(&data)
        .arg(&ckpt)
        .arg("RGCN")
        .assert()
        .success();
    let omitted = std::fs::read(dir.path().join("predictions.json")).unwrap();

    predict_cmd(dir.path())
        .arg(&data)
        .arg(&ckpt)
        .arg("RGCN")
        .arg("homogeneous")
        .assert()
        .success();
    let explicit = std::fs::read(dir.path().join("predictions.json")).unwrap();
    assert_eq!(omitted, explicit);
}

#[test]
fn test_heterogeneous_with_custom_output() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let data = write_structures(dir.path(), &[("B1", TestFile::cuzr_b2())]);
    let ckpt = write_checkpoint(dir.path(), ModelKind::Sage, GraphKind::Heterogeneous);

    predict_cmd(dir.path())
        .arg(&data)
        .arg(&ckpt)
        .arg("SAGE")
        .arg("heterogeneous")
        .arg("--output")
        .arg("sage.json")
        .assert()
        .success();
    let text = std::fs::read_to_string(dir.path().join("sage.json")).unwrap();
    let output: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(output["B1"]["embeddings"].as_array().unwrap().len(), 16);
}

#[test]
fn test_empty_directory_writes_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    let data = write_structures(dir.path(), &[]);
    let ckpt = write_checkpoint(dir.path(), ModelKind::Gin, GraphKind::Homogeneous);

    predict_cmd(dir.path())
        .arg(&data)
        .arg(&ckpt)
        .arg("GIN")
        .assert()
        .success();
    assert_eq!(read_output(dir.path()), serde_json::json!({}));
}
