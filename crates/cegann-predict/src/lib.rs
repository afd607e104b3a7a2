//! # cegann-predict
//!
//! Batch inference over a directory of `*.POSCAR` files. Every structure is
//! turned into a crystal graph, run through a trained network, and its
//! predicted class and embedding are written to one JSON file keyed by label.
pub mod cli;
pub mod output;
pub mod pipeline;

pub use self::output::{Prediction, Predictions};
pub use self::pipeline::{run, PredictOptions};
