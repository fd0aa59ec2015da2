//! facecheck-ingest — validation and storage of uploaded images.
//!
//! Every accepted upload becomes exactly one new file under a
//! collision-resistant name in its collection directory.

pub mod error;
pub mod payload;
pub mod store;
pub mod validate;

#[cfg(test)]
mod testutil;

pub use error::{ImageRejection, IngestError};
pub use payload::TargetFormat;
pub use store::{ImageInfo, ImageStore, StoredImage};
