use facecheck_core::{Comparator, FaceEncoder, StorageLayout};
use facecheck_ingest::ImageStore;
use std::sync::Arc;

/// Shared handler state. Both halves see the same storage layout.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ImageStore>,
    pub comparator: Arc<Comparator>,
}

impl AppState {
    pub fn new(layout: StorageLayout, encoder: Arc<dyn FaceEncoder>) -> Self {
        Self {
            store: Arc::new(ImageStore::new(layout.clone())),
            comparator: Arc::new(Comparator::new(layout, encoder)),
        }
    }
}
