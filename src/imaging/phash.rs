use anyhow::Result;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Perceptual hash of an encoded image, base64 encoded.
pub fn compute_phash(image_bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(image_bytes)?;
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();

    let hash = hasher.hash_image(&img);
    Ok(hash.to_base64())
}

/// Bits that differ between two perceptual hashes; `None` if either is
/// not a valid hash.
pub fn hamming_distance(lhs: &str, rhs: &str) -> Option<u32> {
    let h1 = ImageHash::<Vec<u8>>::from_base64(lhs).ok()?;
    let h2 = ImageHash::<Vec<u8>>::from_base64(rhs).ok()?;
    Some(h1.dist(&h2))
}
