//! Two-image "same person?" decision.

use crate::encoder::{EncoderError, FaceEncoder};
use crate::layout::{Collection, StorageLayout};
use crate::types::Embedding;
use image::{DynamicImage, ImageReader};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("invalid {collection} image name: {name:?}")]
    InvalidName { collection: Collection, name: String },
    #[error("{collection} image not found: {}", path.display())]
    ImageNotFound { collection: Collection, path: PathBuf },
    #[error("failed to decode {collection} image {}: {source}", path.display())]
    Decode {
        collection: Collection,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no face detected in {collection} image {}", path.display())]
    NoFaceDetected { collection: Collection, path: PathBuf },
    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

/// Outcome of one comparison. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub same_person: bool,
    pub distance: f32,
    pub threshold: f32,
    pub profile_path: PathBuf,
    pub live_capture_path: PathBuf,
}

/// Compares a profile image against a live-capture image.
///
/// Every call decodes both files and re-runs detection; nothing is cached.
pub struct Comparator {
    layout: StorageLayout,
    encoder: Arc<dyn FaceEncoder>,
}

impl Comparator {
    pub fn new(layout: StorageLayout, encoder: Arc<dyn FaceEncoder>) -> Self {
        Self { layout, encoder }
    }

    /// Resolve both names inside their collections and compare.
    #[tracing::instrument(skip(self))]
    pub fn compare(&self, profile_name: &str, live_capture_name: &str) -> Result<Comparison, CompareError> {
        let profile = self.resolve(Collection::Profile, profile_name)?;
        let live = self.resolve(Collection::LiveCapture, live_capture_name)?;
        self.compare_files(&profile, &live)
    }

    /// Compare two files by path, without collection resolution.
    pub fn compare_files(&self, profile: &Path, live_capture: &Path) -> Result<Comparison, CompareError> {
        let known = self.first_descriptor(Collection::Profile, profile)?;
        let unknown = self.first_descriptor(Collection::LiveCapture, live_capture)?;

        let distance = self.encoder.distance(&known, &unknown);
        let same_person = self.encoder.is_match(&known, &unknown);

        tracing::info!(
            profile = %profile.display(),
            live_capture = %live_capture.display(),
            distance,
            same_person,
            "comparison complete"
        );

        Ok(Comparison {
            same_person,
            distance,
            threshold: self.encoder.threshold(),
            profile_path: profile.to_path_buf(),
            live_capture_path: live_capture.to_path_buf(),
        })
    }

    fn resolve(&self, collection: Collection, name: &str) -> Result<PathBuf, CompareError> {
        self.layout
            .resolve(collection, name)
            .ok_or_else(|| CompareError::InvalidName {
                collection,
                name: name.to_string(),
            })
    }

    /// Descriptor of the first face the encoder reports. Additional faces
    /// are ignored.
    fn first_descriptor(&self, collection: Collection, path: &Path) -> Result<Embedding, CompareError> {
        let image = load_image(collection, path)?;
        let mut faces = self.encoder.encode(&image)?;

        if faces.len() > 1 {
            tracing::debug!(
                %collection,
                faces = faces.len(),
                "multiple faces detected; using the first"
            );
        }

        if faces.is_empty() {
            return Err(CompareError::NoFaceDetected {
                collection,
                path: path.to_path_buf(),
            });
        }
        Ok(faces.swap_remove(0))
    }
}

fn load_image(collection: Collection, path: &Path) -> Result<DynamicImage, CompareError> {
    if !path.is_file() {
        return Err(CompareError::ImageNotFound {
            collection,
            path: path.to_path_buf(),
        });
    }

    let decode_err = |source: image::ImageError| CompareError::Decode {
        collection,
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    /// Treats the mean colour of the image as one "face"; black images have none.
    struct MeanColour;

    impl FaceEncoder for MeanColour {
        fn encode(&self, image: &DynamicImage) -> Result<Vec<Embedding>, EncoderError> {
            let rgb = image.to_rgb8();
            let n = (rgb.width() * rgb.height()) as f32;
            let mut sum = [0.0f32; 3];
            for px in rgb.pixels() {
                for c in 0..3 {
                    sum[c] += px[c] as f32;
                }
            }
            if sum.iter().all(|&s| s == 0.0) {
                return Ok(Vec::new());
            }
            Ok(vec![Embedding::new(sum.iter().map(|s| s / n).collect())])
        }

        fn threshold(&self) -> f32 {
            0.05
        }
    }

    fn setup() -> (tempfile::TempDir, Comparator) {
        let root = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(root.path().join("profile"), root.path().join("live"));
        layout.ensure_dirs().unwrap();
        (root, Comparator::new(layout, Arc::new(MeanColour)))
    }

    fn write(dir: &Path, name: &str, colour: [u8; 3]) {
        RgbImage::from_pixel(64, 64, Rgb(colour))
            .save_with_format(dir.join(name), ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_same_person() {
        let (root, cmp) = setup();
        write(&root.path().join("profile"), "a.png", [200, 10, 10]);
        write(&root.path().join("live"), "livecam_a.png", [190, 12, 9]);

        let result = cmp.compare("a.png", "livecam_a.png").unwrap();
        assert!(result.same_person);
        assert!(result.distance <= result.threshold);
    }

    #[test]
    fn test_different_person() {
        let (root, cmp) = setup();
        write(&root.path().join("profile"), "a.png", [200, 10, 10]);
        write(&root.path().join("live"), "livecam_b.png", [10, 10, 200]);

        let result = cmp.compare("a.png", "livecam_b.png").unwrap();
        assert!(!result.same_person);
    }

    /// Reports two faces per image, chosen by the dominant colour channel.
    struct TwoFaces;

    impl FaceEncoder for TwoFaces {
        fn encode(&self, image: &DynamicImage) -> Result<Vec<Embedding>, EncoderError> {
            let [r, g, b] = image.to_rgb8().get_pixel(0, 0).0;
            let faces = if r >= g && r >= b {
                [[1.0f32, 0.0], [0.0, 1.0]]
            } else if b >= g {
                [[1.0, 0.0], [-1.0, 0.0]]
            } else {
                [[-1.0, 0.0], [0.0, 1.0]]
            };
            Ok(faces.iter().map(|f| Embedding::new(f.to_vec())).collect())
        }

        fn threshold(&self) -> f32 {
            0.05
        }
    }

    #[test]
    fn test_first_face_decides() {
        let root = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(root.path().join("profile"), root.path().join("live"));
        layout.ensure_dirs().unwrap();
        let cmp = Comparator::new(layout, Arc::new(TwoFaces));

        write(&root.path().join("profile"), "a.png", [200, 10, 10]);
        write(&root.path().join("live"), "blue.png", [10, 10, 200]);
        write(&root.path().join("live"), "green.png", [10, 200, 10]);

        // First faces match, second faces do not.
        let result = cmp.compare("a.png", "blue.png").unwrap();
        assert!(result.same_person);
        assert!(result.distance < 1e-6);

        // First faces differ even though the second faces are identical.
        let result = cmp.compare("a.png", "green.png").unwrap();
        assert!(!result.same_person);
    }

    #[test]
    fn test_names_resolve_to_final_segment() {
        let (root, cmp) = setup();
        write(&root.path().join("profile"), "passwd", [50, 60, 70]);
        write(&root.path().join("live"), "x.png", [50, 60, 70]);

        let result = cmp
            .compare("../../etc/passwd", "liveCamphotos/x.png")
            .unwrap();
        assert_eq!(result.profile_path, root.path().join("profile").join("passwd"));
        assert_eq!(result.live_capture_path, root.path().join("live").join("x.png"));
    }

    #[test]
    fn test_missing_image() {
        let (root, cmp) = setup();
        write(&root.path().join("profile"), "a.png", [200, 10, 10]);

        let err = cmp.compare("a.png", "nope.png").unwrap_err();
        assert!(matches!(
            err,
            CompareError::ImageNotFound { collection: Collection::LiveCapture, .. }
        ));
    }

    #[test]
    fn test_no_face_detected() {
        let (root, cmp) = setup();
        write(&root.path().join("profile"), "a.png", [0, 0, 0]);
        write(&root.path().join("live"), "b.png", [10, 10, 200]);

        let err = cmp.compare("a.png", "b.png").unwrap_err();
        assert!(matches!(
            err,
            CompareError::NoFaceDetected { collection: Collection::Profile, .. }
        ));
    }

    #[test]
    fn test_invalid_name() {
        let (_root, cmp) = setup();
        let err = cmp.compare("profile/..", "b.png").unwrap_err();
        assert!(matches!(err, CompareError::InvalidName { .. }));
    }

    #[test]
    fn test_undecodable_file() {
        let (root, cmp) = setup();
        std::fs::write(root.path().join("profile").join("a.png"), b"not an image").unwrap();
        write(&root.path().join("live"), "b.png", [10, 10, 200]);

        let err = cmp.compare("a.png", "b.png").unwrap_err();
        assert!(matches!(err, CompareError::Decode { .. }));
    }
}
