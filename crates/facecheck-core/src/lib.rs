//! facecheck-core — face encoding capability and two-image comparison.
//!
//! Detection uses SCRFD and embedding uses ArcFace, both through ONNX
//! Runtime on the CPU. Callers depend on the [`FaceEncoder`] trait, not on
//! the models.

pub mod alignment;
pub mod comparator;
pub mod detector;
pub mod encoder;
pub mod layout;
pub mod recognizer;
pub mod types;

pub use comparator::{CompareError, Comparator, Comparison};
pub use encoder::{EncoderError, FaceEncoder, OnnxFaceEncoder};
pub use layout::{Collection, StorageLayout};
pub use types::{BoundingBox, Embedding};

use std::path::PathBuf;

/// Default model directory: `$XDG_DATA_HOME/facecheck/models`, falling back
/// to `~/.local/share/facecheck/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facecheck")
        .join("models")
}
