use anyhow::{bail, Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Result for one structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class as a one-element list.
    pub class: Vec<u32>,
    pub embeddings: Vec<f32>,
}

/// Predictions keyed by structure label, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predictions {
    entries: Vec<(String, Prediction)>,
    seen: HashSet<String>,
}

impl Predictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each label is written once.
    pub fn insert(&mut self, label: impl Into<String>, prediction: Prediction) -> Result<()> {
        let label = label.into();
        if !self.seen.insert(label.clone()) {
            bail!("duplicate structure label `{}`", label);
        }
        self.entries.push((label, prediction));
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&Prediction> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to `path`, replacing whatever is there.
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .with_context(|| format!("failed to write predictions to {}", path.display()))?;
        writer.flush()?;
        Ok(())
    }
}

impl Serialize for Predictions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, prediction) in &self.entries {
            map.serialize_entry(label, prediction)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(class: u32) -> Prediction {
        Prediction {
            class: vec![class],
            embeddings: vec![0.5, -1.0],
        }
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut predictions = Predictions::new();
        predictions.insert("S2", prediction(1)).unwrap();
        predictions.insert("S10", prediction(0)).unwrap();
        assert_eq!(
            predictions.to_json().unwrap(),
            r#"{"S2":{"class":[1],"embeddings":[0.5,-1.0]},"S10":{"class":[0],"embeddings":[0.5,-1.0]}}"#
        );
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut predictions = Predictions::new();
        predictions.insert("A1", prediction(0)).unwrap();
        assert!(predictions.insert("A1", prediction(1)).is_err());
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions.get("A1"), Some(&prediction(0)));
    }

    #[test]
    fn test_many_labels_stay_unique() {
        let mut predictions = Predictions::new();
        for i in 0..5000 {
            predictions.insert(format!("S{}", i), prediction(i % 2)).unwrap();
        }
        assert_eq!(predictions.len(), 5000);
        assert!(predictions.insert("S4999", prediction(0)).is_err());
        assert_eq!(predictions.labels().nth(4999), Some("S4999"));
        assert_eq!(predictions.get("S4999"), Some(&prediction(1)));
    }

    #[test]
    fn test_empty_is_an_object() {
        assert_eq!(Predictions::new().to_json().unwrap(), "{}");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.json");
        std::fs::write(&path, "stale contents that are longer than the output").unwrap();
        Predictions::new().write(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
