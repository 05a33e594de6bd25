use log::debug;
use sha2::{Digest, Sha256};

use super::{phash::compute_phash, ImageFile};
use crate::models::FileMetadata;

/// Name, size, dimensions and hashes of an uploaded file. Decoding failures
/// only blank the image-derived fields.
pub fn derive_metadata(file: &ImageFile) -> FileMetadata {
    let hash = Sha256::digest(&file.bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();

    let dimensions = match image::load_from_memory(&file.bytes) {
        Ok(img) => format!("{}x{}", img.width(), img.height()),
        Err(err) => {
            debug!("Could not decode {} for dimensions: {err}", file.name);
            "unknown".to_string()
        }
    };

    FileMetadata {
        name: file.name.clone(),
        size: file.bytes.len() as u64,
        dimensions,
        hash,
        perceptual_hash: compute_phash(&file.bytes).ok(),
    }
}
