//! The face-encoding capability.
//!
//! Everything above this module treats detection and embedding as a black
//! box: an image goes in, zero or more descriptors come out, and two
//! descriptors are judged against a fixed distance threshold.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::Embedding;
use image::DynamicImage;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// SCRFD detection model file name inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name inside the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

/// Cosine distance at or below which two ArcFace embeddings are the same person.
pub const ARCFACE_MATCH_THRESHOLD: f32 = 0.60;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("{0} lock poisoned by a panicked inference")]
    Poisoned(&'static str),
}

/// Opaque face detection + encoding capability.
pub trait FaceEncoder: Send + Sync {
    /// Descriptors for every detected face. Order is implementation-defined;
    /// callers that need one face take the first.
    fn encode(&self, image: &DynamicImage) -> Result<Vec<Embedding>, EncoderError>;

    /// Distance between two descriptors. Lower is more similar.
    fn distance(&self, a: &Embedding, b: &Embedding) -> f32 {
        a.cosine_distance(b)
    }

    /// Fixed match cutoff for [`distance`](Self::distance).
    fn threshold(&self) -> f32;

    fn is_match(&self, a: &Embedding, b: &Embedding) -> bool {
        self.distance(a, b) <= self.threshold()
    }
}

/// SCRFD + ArcFace over ONNX Runtime.
///
/// Sessions need exclusive access while running, so each model sits behind
/// its own mutex; concurrent requests serialize on inference only.
pub struct OnnxFaceEncoder {
    detector: Mutex<FaceDetector>,
    recognizer: Mutex<FaceRecognizer>,
}

impl OnnxFaceEncoder {
    /// Load both models from `model_dir`. Fails fast if either file is missing.
    pub fn load(model_dir: &Path, intra_threads: usize) -> Result<Self, EncoderError> {
        let detector = FaceDetector::load(&model_dir.join(DETECTOR_MODEL_FILE), intra_threads)?;
        let recognizer = FaceRecognizer::load(&model_dir.join(RECOGNIZER_MODEL_FILE), intra_threads)?;
        Ok(Self {
            detector: Mutex::new(detector),
            recognizer: Mutex::new(recognizer),
        })
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    /// Faces come back in detector confidence order.
    fn encode(&self, image: &DynamicImage) -> Result<Vec<Embedding>, EncoderError> {
        let rgb = image.to_rgb8();

        let faces = self
            .detector
            .lock()
            .map_err(|_| EncoderError::Poisoned("detector"))?
            .detect(&rgb)?;

        if faces.is_empty() {
            return Ok(Vec::new());
        }

        let mut recognizer = self
            .recognizer
            .lock()
            .map_err(|_| EncoderError::Poisoned("recognizer"))?;

        let mut embeddings = Vec::with_capacity(faces.len());
        for face in &faces {
            embeddings.push(recognizer.extract(&rgb, face)?);
        }

        tracing::debug!(
            faces = faces.len(),
            best_confidence = faces[0].confidence,
            "encoded faces"
        );
        Ok(embeddings)
    }

    fn threshold(&self) -> f32 {
        ARCFACE_MATCH_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Embedding>);

    impl FaceEncoder for Fixed {
        fn encode(&self, _image: &DynamicImage) -> Result<Vec<Embedding>, EncoderError> {
            Ok(self.0.clone())
        }

        fn threshold(&self) -> f32 {
            0.5
        }
    }

    #[test]
    fn test_default_distance_is_cosine() {
        let enc = Fixed(vec![]);
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert!((enc.distance(&a, &b) - 1.0).abs() < 1e-6);
        assert!(!enc.is_match(&a, &b));
        assert!(enc.is_match(&a, &a));
    }

    #[test]
    fn test_match_respects_threshold() {
        let enc = Fixed(vec![]);
        let a = Embedding::new(vec![1.0, 0.0]);
        let near = Embedding::new(vec![0.6, 0.8]); // distance 0.4
        let far = Embedding::new(vec![0.4, 0.84f32.sqrt()]); // distance 0.6
        assert!(enc.is_match(&a, &near));
        assert!(!enc.is_match(&a, &far));
    }

    #[test]
    fn test_load_missing_models() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxFaceEncoder::load(dir.path(), 1).err().expect("no models present");
        assert!(matches!(err, EncoderError::Detector(DetectorError::ModelNotFound(_))));
    }
}
